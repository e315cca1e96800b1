use sea_orm::{ActiveModelTrait, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{ResultEngine, Transaction, transactions};

use super::Engine;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_HISTORY_LIMIT: u64 = 10;
/// Largest page `transaction_history` returns.
pub const MAX_HISTORY_LIMIT: u64 = 100;

impl Engine {
    pub(super) async fn append_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        transaction: &Transaction,
    ) -> ResultEngine<()> {
        transactions::ActiveModel::from(transaction).insert(db).await?;
        Ok(())
    }

    /// Newest-first page of an active user's transactions.
    ///
    /// `limit` defaults to [`DEFAULT_HISTORY_LIMIT`] and is capped at
    /// [`MAX_HISTORY_LIMIT`]. Entries sharing a timestamp are ordered by id.
    pub async fn transaction_history(
        &self,
        identity: i64,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<Transaction>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(MAX_HISTORY_LIMIT);
        let user = self.require_active_user(&self.database, identity).await?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user.id.to_string()))
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }
}
