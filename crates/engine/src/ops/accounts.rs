use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, QueryFilter, QueryOrder, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{Account, EngineError, ResultEngine, User, accounts, error::existing_on_conflict};

use super::Engine;

impl Engine {
    pub(super) async fn find_account<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
        currency_code: &str,
    ) -> ResultEngine<Option<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.to_string()))
            .filter(accounts::Column::CurrencyCode.eq(currency_code))
            .one(db)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    /// Existing account for (user, currency) or a freshly inserted zero one.
    ///
    /// Callers hold the account lock, so the insert only conflicts with
    /// writers outside this process.
    pub(super) async fn get_or_create_account<C: ConnectionTrait>(
        &self,
        db: &C,
        user: &User,
        currency_code: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        if let Some(account) = self.find_account(db, user.id, currency_code).await? {
            return Ok(account);
        }

        let account = Account::new(user.id, currency_code.to_string(), now);
        accounts::ActiveModel::from(&account)
            .insert(db)
            .await
            .map_err(|err| {
                existing_on_conflict(err, &format!("account {}/{currency_code}", user.identity))
            })?;
        tracing::debug!(
            "opened {currency_code} account for user {}",
            user.identity
        );
        Ok(account)
    }

    /// Compare-and-swap the stored amount from `account.amount_minor` to
    /// `new_amount`.
    ///
    /// A concurrent writer that moved the balance first makes this fail with
    /// `Unavailable`, so the whole operation is retried on fresh state.
    pub(super) async fn swap_balance<C: ConnectionTrait>(
        &self,
        db: &C,
        account: &Account,
        new_amount: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::AmountMinor, Expr::value(new_amount))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(account.id.to_string()))
            .filter(accounts::Column::AmountMinor.eq(account.amount_minor))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Unavailable(format!(
                "account {} changed concurrently",
                account.id
            )));
        }

        Ok(Account {
            amount_minor: new_amount,
            updated_at: now,
            ..account.clone()
        })
    }

    /// Apply a signed delta to an account.
    pub(super) async fn adjust_balance<C: ConnectionTrait>(
        &self,
        db: &C,
        account: &Account,
        delta: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        let new_amount = account.amount_minor.checked_add(delta).ok_or_else(|| {
            EngineError::InvalidAmount(format!(
                "balance overflow on {} account",
                account.currency_code
            ))
        })?;
        self.swap_balance(db, account, new_amount, now).await
    }

    /// Every account of an active user, ordered by currency code.
    pub async fn accounts(&self, identity: i64) -> ResultEngine<Vec<Account>> {
        let user = self.require_active_user(&self.database, identity).await?;
        accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user.id.to_string()))
            .order_by_asc(accounts::Column::CurrencyCode)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// The account of an active user in one currency.
    ///
    /// Fails with `KeyNotFound` when the user holds no such account.
    pub async fn account(&self, identity: i64, currency_code: &str) -> ResultEngine<Account> {
        let code = crate::util::normalize_code(currency_code)?;
        let user = self.require_active_user(&self.database, identity).await?;
        self.find_account(&self.database, user.id, &code)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("account {identity}/{code}")))
    }
}
