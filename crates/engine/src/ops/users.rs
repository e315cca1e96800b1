use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, User, UserStatus, UserUpsert, accounts,
    error::existing_on_conflict,
    transactions,
    users::{self, UpsertPlan, plan_upsert},
    util::normalize_username,
};

use super::{Engine, with_tx};

impl Engine {
    /// Register `identity` under `username`, or bring a known identity up to
    /// date.
    ///
    /// - absent: a new active user with a zero account in the default
    ///   currency (no account while the catalog is empty);
    /// - disabled: resurrected under `username`;
    /// - active with another username: renamed in place;
    /// - active with the same username: `ExistingKey`.
    ///
    /// Fails with `ExistingKey` when another active user already holds
    /// `username`.
    pub async fn create_user(&self, identity: i64, username: &str) -> ResultEngine<UserUpsert> {
        let username = normalize_username(username)?;

        let upsert = with_tx!(self, |db_tx| {
            let existing = self.find_user(&db_tx, identity).await?;
            let plan = plan_upsert(existing.as_ref(), &username)?;
            self.ensure_username_free(&db_tx, &username, identity).await?;

            let now = Utc::now();
            match (plan, existing.clone()) {
                (UpsertPlan::Create, _) | (_, None) => {
                    let user = User {
                        id: Uuid::new_v4(),
                        identity,
                        username: username.clone(),
                        is_admin: false,
                        status: UserStatus::Active,
                        created_at: now,
                        disabled_at: None,
                    };
                    users::ActiveModel::from(&user)
                        .insert(&db_tx)
                        .await
                        .map_err(|err| existing_on_conflict(err, &format!("user {identity}")))?;
                    match self.find_default_currency(&db_tx).await? {
                        Some(currency) => {
                            self.get_or_create_account(&db_tx, &user, &currency.code, now)
                                .await?;
                        }
                        None => tracing::warn!(
                            "no default currency: user {identity} starts without accounts"
                        ),
                    }
                    Ok(UserUpsert::Created(user))
                }
                (UpsertPlan::Resurrect, Some(previous)) => {
                    let user = User {
                        username: username.clone(),
                        status: UserStatus::Active,
                        disabled_at: None,
                        ..previous
                    };
                    self.save_user(&db_tx, &user).await?;
                    Ok(UserUpsert::Resurrected(user))
                }
                (UpsertPlan::Rename, Some(previous)) => {
                    let previous_username = previous.username.clone();
                    let user = User {
                        username: username.clone(),
                        ..previous
                    };
                    self.save_user(&db_tx, &user).await?;
                    Ok(UserUpsert::Renamed {
                        user,
                        previous_username,
                    })
                }
            }
        })?;

        match &upsert {
            UserUpsert::Created(user) => tracing::info!("created user {}", user.identity),
            UserUpsert::Resurrected(user) => tracing::info!("resurrected user {}", user.identity),
            UserUpsert::Renamed {
                user,
                previous_username,
            } => tracing::info!(
                "renamed user {} from {previous_username} to {}",
                user.identity,
                user.username
            ),
        }
        Ok(upsert)
    }

    async fn save_user<C: ConnectionTrait>(&self, db: &C, user: &User) -> ResultEngine<()> {
        users::ActiveModel::from(user)
            .update(db)
            .await
            .map_err(|err| existing_on_conflict(err, &format!("username {}", user.username)))?;
        Ok(())
    }

    /// Soft-delete an active user. Balances and history are kept.
    pub async fn disable_user(&self, username: &str) -> ResultEngine<User> {
        let username = normalize_username(username)?;

        let user = with_tx!(self, |db_tx| {
            let user = self
                .require_active_user_by_username(&db_tx, &username)
                .await?;
            let user = User {
                status: UserStatus::Disabled,
                disabled_at: Some(Utc::now()),
                ..user
            };
            self.save_user(&db_tx, &user).await?;
            Ok(user)
        })?;

        tracing::info!("disabled user {}", user.identity);
        Ok(user)
    }

    /// Remove a user with every account and transaction it owns.
    ///
    /// Matches an active user first, then the most recently disabled one.
    pub async fn destroy_user(&self, username: &str) -> ResultEngine<User> {
        let username = normalize_username(username)?;

        let user = with_tx!(self, |db_tx| {
            let user = self
                .find_any_user_by_username(&db_tx, &username)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {username}")))?;
            let user_id = user.id.to_string();
            transactions::Entity::delete_many()
                .filter(transactions::Column::UserId.eq(user_id.as_str()))
                .exec(&db_tx)
                .await?;
            accounts::Entity::delete_many()
                .filter(accounts::Column::UserId.eq(user_id.as_str()))
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(user_id).exec(&db_tx).await?;
            Ok(user)
        })?;

        tracing::info!("destroyed user {}", user.identity);
        Ok(user)
    }

    /// Grant or revoke admin rights. No transaction is logged.
    pub async fn set_admin_status(&self, username: &str, is_admin: bool) -> ResultEngine<User> {
        let username = normalize_username(username)?;

        let user = with_tx!(self, |db_tx| {
            let user = self
                .require_active_user_by_username(&db_tx, &username)
                .await?;
            let user = User { is_admin, ..user };
            self.save_user(&db_tx, &user).await?;
            Ok(user)
        })?;

        tracing::info!("user {} admin: {}", user.identity, user.is_admin);
        Ok(user)
    }

    /// `false` for unknown and disabled users and on any lookup failure.
    pub async fn is_admin(&self, identity: i64) -> bool {
        match self.require_active_user(&self.database, identity).await {
            Ok(user) => user.is_admin,
            Err(err) => {
                tracing::debug!("admin check for {identity} failed: {err}");
                false
            }
        }
    }

    pub async fn user(&self, identity: i64) -> ResultEngine<User> {
        self.require_active_user(&self.database, identity).await
    }

    pub async fn user_by_username(&self, username: &str) -> ResultEngine<User> {
        let username = normalize_username(username)?;
        self.require_active_user_by_username(&self.database, &username)
            .await
    }
}
