use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod user {
    use super::*;

    /// Register the caller (identified by the `telegram-user-id` header) or
    /// bring its username up to date.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserRegister {
        pub username: String,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RegisterOutcome {
        Created,
        Resurrected,
        Renamed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub identity: i64,
        pub username: String,
        pub is_admin: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserRegistered {
        pub outcome: RegisterOutcome,
        pub user: UserView,
        /// Set when the username changed.
        pub previous_username: Option<String>,
    }
}

pub mod currency {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyView {
        pub code: String,
        pub name: String,
        pub sign: String,
        pub minor_units: u8,
        pub is_default: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyNew {
        pub code: String,
        pub name: String,
        pub sign: String,
        /// Fraction digits; the server default applies when absent.
        pub minor_units: Option<u8>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrenciesResponse {
        pub currencies: Vec<CurrencyView>,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub currency_code: String,
        pub amount_minor: i64,
        /// Decimal rendering using the currency minor units, e.g. `12.50`.
        pub amount: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountsResponse {
        pub accounts: Vec<AccountView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        TransferOut,
        TransferIn,
        AdminSetBalance,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        /// Page size; the server caps it.
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub currency_code: String,
        /// Signed change relative to the caller.
        pub amount_minor: i64,
        pub from_username: String,
        pub to_username: String,
        pub occurred_at: DateTime<Utc>,
        pub balance_after_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }

    /// Send funds to another user.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        /// Recipient username, a leading `@` is accepted.
        pub to_username: String,
        /// Decimal amount, e.g. `12.50` or `12,50`.
        pub amount: String,
        /// Currency code; the default currency when absent.
        pub currency: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferCreated {
        pub outgoing: TransactionView,
        pub incoming: TransactionView,
    }
}

pub mod admin {
    use std::collections::BTreeMap;

    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceSet {
        pub username: String,
        /// Decimal amount; must not be negative.
        pub amount: String,
        /// Currency code; the default currency when absent.
        pub currency: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdminStatusSet {
        pub username: String,
        pub is_admin: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserBalancesView {
        pub identity: i64,
        pub username: String,
        pub is_admin: bool,
        /// Minor units keyed by currency code.
        pub balances: BTreeMap<String, i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsersResponse {
        pub users: Vec<UserBalancesView>,
    }
}
