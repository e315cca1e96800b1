use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Account, EngineError, ResultEngine, SetBalanceCmd, Transaction, TransactionKind, User,
    UserStatus, accounts,
    locks::AccountKey,
    transactions::Parties,
    users,
    util::{normalize_code, normalize_username},
};

use super::{Engine, with_tx};

/// An active user with every balance they hold, keyed by currency code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalances {
    pub identity: i64,
    pub username: String,
    pub is_admin: bool,
    pub balances: BTreeMap<String, i64>,
}

impl Engine {
    /// Set a user's balance in one currency to exactly `amount_minor`.
    ///
    /// The caller must be an active admin. The account is opened if needed
    /// and one `admin_set_balance` entry records the delta.
    pub async fn admin_set_balance(&self, cmd: SetBalanceCmd) -> ResultEngine<Transaction> {
        let SetBalanceCmd {
            admin_identity,
            target_username,
            amount_minor,
            currency_code,
        } = cmd;

        if !self.is_admin(admin_identity).await {
            tracing::warn!("user {admin_identity} tried to set a balance");
            return Err(EngineError::Unauthorized(format!(
                "user {admin_identity} is not an admin"
            )));
        }
        if amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "balance must be >= 0".to_string(),
            ));
        }
        let code = normalize_code(&currency_code)?;
        let target_username = normalize_username(&target_username)?;

        let target = self
            .require_active_user_by_username(&self.database, &target_username)
            .await?;
        let _guards = self
            .locks
            .acquire([AccountKey::new(target.identity, &code)])
            .await;

        let entry = with_tx!(self, |db_tx| {
            let admin = self.require_admin(&db_tx, admin_identity).await?;
            let target = self.require_active_user(&db_tx, target.identity).await?;
            self.require_currency(&db_tx, &code).await?;

            let now = Utc::now();
            let account = self
                .get_or_create_account(&db_tx, &target, &code, now)
                .await?;
            let delta = amount_minor - account.amount_minor;
            let account = self
                .swap_balance(&db_tx, &account, amount_minor, now)
                .await?;

            let entry = Transaction::new(
                &target,
                account.id,
                &code,
                delta,
                TransactionKind::AdminSetBalance,
                &Parties {
                    from: &admin,
                    to: &target,
                },
                now,
                account.amount_minor,
            );
            self.append_transaction(&db_tx, &entry).await?;
            Ok(entry)
        })?;

        tracing::info!(
            "admin {admin_identity} set {} {code} balance to {amount_minor}",
            entry.to_identity
        );
        Ok(entry)
    }

    /// Every active user with their balances, ordered by username.
    ///
    /// Users and accounts are read inside one transaction so no transfer is
    /// seen half-applied.
    pub async fn list_users_with_balances(&self) -> ResultEngine<Vec<UserBalances>> {
        with_tx!(self, |db_tx| {
            let active: Vec<User> = users::Entity::find()
                .filter(users::Column::Status.eq(UserStatus::Active.as_str()))
                .order_by_asc(users::Column::Username)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(User::try_from)
                .collect::<ResultEngine<_>>()?;

            let mut balances: HashMap<Uuid, BTreeMap<String, i64>> = HashMap::new();
            for model in accounts::Entity::find().all(&db_tx).await? {
                let account = Account::try_from(model)?;
                balances
                    .entry(account.user_id)
                    .or_default()
                    .insert(account.currency_code, account.amount_minor);
            }

            Ok(active
                .into_iter()
                .map(|user| UserBalances {
                    balances: balances.remove(&user.id).unwrap_or_default(),
                    identity: user.identity,
                    username: user.username,
                    is_admin: user.is_admin,
                })
                .collect())
        })
    }
}
