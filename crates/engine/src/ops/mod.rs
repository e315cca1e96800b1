use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

use crate::locks::AccountLocks;

mod access;
mod accounts;
mod admin;
mod currencies;
mod history;
mod transfer;
mod users;

pub use admin::UserBalances;
pub use transfer::TransferReceipt;
pub use history::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error.
///
/// Retryable failures (`EngineError::Unavailable`) re-run the whole block in a
/// fresh transaction, up to the engine's retry budget.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let mut attempt: u32 = 0;
        loop {
            let result: $crate::ResultEngine<_> = async {
                let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
                let outcome: $crate::ResultEngine<_> = async { $body }.await;
                match outcome {
                    Ok(value) => {
                        $tx.commit().await?;
                        Ok(value)
                    }
                    Err(err) => {
                        if let Err(rollback_err) = $tx.rollback().await {
                            tracing::warn!("rollback failed: {rollback_err}");
                        }
                        Err(err)
                    }
                }
            }
            .await;

            match result {
                Err(err) if err.is_retryable() && attempt < $self.retry.max_retries => {
                    attempt += 1;
                    tracing::warn!("store contended (attempt {attempt}): {err}");
                    tokio::time::sleep($self.retry.delay(attempt)).await;
                }
                other => break other,
            }
        }
    }};
}

pub(crate) use with_tx;

/// Bounded retry with linear backoff for transient store failures.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff: Duration::from_millis(20),
        }
    }
}

/// The ledger engine.
///
/// Sole writer of balances and sole producer of transaction records. Cheap to
/// share behind an `Arc`; every operation takes `&self`.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    locks: AccountLocks,
    /// Serializes changes to the default-currency pointer.
    catalog: Mutex<()>,
    retry: RetryPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    retry: RetryPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override how transient store failures are retried.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> EngineBuilder {
        self.retry = retry;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> crate::ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            locks: AccountLocks::default(),
            catalog: Mutex::new(()),
            retry: self.retry,
        })
    }
}
