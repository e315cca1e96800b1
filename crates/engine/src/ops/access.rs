use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, prelude::*,
    sea_query::{Expr, Func},
};

use crate::{
    Currency, EngineError, ResultEngine, User, UserStatus, currency, users,
};

use super::Engine;

/// Case-insensitive match on the stored username.
fn username_matches(username: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(users::Column::Username))).eq(username.to_ascii_lowercase())
}

impl Engine {
    /// Any user (active or disabled) holding `identity`.
    pub(super) async fn find_user<C: ConnectionTrait>(
        &self,
        db: &C,
        identity: i64,
    ) -> ResultEngine<Option<User>> {
        users::Entity::find()
            .filter(users::Column::Identity.eq(identity))
            .one(db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub(super) async fn require_active_user<C: ConnectionTrait>(
        &self,
        db: &C,
        identity: i64,
    ) -> ResultEngine<User> {
        self.find_user(db, identity)
            .await?
            .filter(User::is_active)
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {identity}")))
    }

    pub(super) async fn find_active_user_by_username<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
    ) -> ResultEngine<Option<User>> {
        users::Entity::find()
            .filter(username_matches(username))
            .filter(users::Column::Status.eq(UserStatus::Active.as_str()))
            .one(db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub(super) async fn require_active_user_by_username<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
    ) -> ResultEngine<User> {
        self.find_active_user_by_username(db, username)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {username}")))
    }

    /// Active user first, then the most recently disabled one.
    pub(super) async fn find_any_user_by_username<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
    ) -> ResultEngine<Option<User>> {
        if let Some(user) = self.find_active_user_by_username(db, username).await? {
            return Ok(Some(user));
        }
        users::Entity::find()
            .filter(username_matches(username))
            .order_by_desc(users::Column::DisabledAt)
            .one(db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Fails closed: unknown, disabled and non-admin callers all get
    /// `Unauthorized`.
    pub(super) async fn require_admin<C: ConnectionTrait>(
        &self,
        db: &C,
        identity: i64,
    ) -> ResultEngine<User> {
        match self.require_active_user(db, identity).await {
            Ok(user) if user.is_admin => Ok(user),
            Ok(_) | Err(EngineError::KeyNotFound(_)) => Err(EngineError::Unauthorized(format!(
                "user {identity} is not an admin"
            ))),
            Err(err) => Err(err),
        }
    }

    pub(super) async fn require_currency<C: ConnectionTrait>(
        &self,
        db: &C,
        code: &str,
    ) -> ResultEngine<Currency> {
        currency::Entity::find_by_id(code.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("currency {code}")))
            .and_then(Currency::try_from)
    }

    /// Fails with `ExistingKey` if another active identity holds `username`.
    pub(super) async fn ensure_username_free<C: ConnectionTrait>(
        &self,
        db: &C,
        username: &str,
        identity: i64,
    ) -> ResultEngine<()> {
        if let Some(holder) = self.find_active_user_by_username(db, username).await?
            && holder.identity != identity
        {
            return Err(EngineError::ExistingKey(format!("username {username}")));
        }
        Ok(())
    }
}
