//! Multi-currency ledger engine.
//!
//! Users hold one account per currency, move funds to each other by
//! username and read back an append-only transaction log. Admins set
//! balances and manage the currency catalog.
//!
//! The engine is the only writer of balances: every operation runs in one
//! store transaction and balance-touching operations additionally lock the
//! accounts involved, so concurrent transfers never create or destroy money.

pub use accounts::Account;
pub use commands::{SetBalanceCmd, TransferCmd};
pub use currency::{Currency, DEFAULT_MINOR_UNITS};
pub use error::EngineError;
pub use money::{MAX_MINOR_UNITS, Money};
pub use ops::{
    DEFAULT_HISTORY_LIMIT, Engine, EngineBuilder, MAX_HISTORY_LIMIT, RetryPolicy,
    TransferReceipt, UserBalances,
};
pub use transactions::{Transaction, TransactionKind};
pub use users::{User, UserStatus, UserUpsert};

mod accounts;
mod commands;
mod currency;
mod error;
mod locks;
mod money;
mod ops;
mod transactions;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
