//! Command structs for balance-affecting engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists of same-typed values.

/// Move funds from one user to another by username.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    /// Authenticated identity of the sender.
    pub from_identity: i64,
    /// Recipient username as typed by the sender.
    pub to_username: String,
    /// Amount in minor units of the currency; must be positive.
    pub amount_minor: i64,
    /// Currency code, case-insensitive.
    pub currency_code: String,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        from_identity: i64,
        to_username: impl Into<String>,
        amount_minor: i64,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            from_identity,
            to_username: to_username.into(),
            amount_minor,
            currency_code: currency_code.into(),
        }
    }
}

/// Set a user's balance to an absolute value (admin only).
#[derive(Clone, Debug)]
pub struct SetBalanceCmd {
    /// Authenticated identity of the caller; must be an admin.
    pub admin_identity: i64,
    pub target_username: String,
    /// New balance in minor units; must not be negative.
    pub amount_minor: i64,
    pub currency_code: String,
}

impl SetBalanceCmd {
    #[must_use]
    pub fn new(
        admin_identity: i64,
        target_username: impl Into<String>,
        amount_minor: i64,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            admin_identity,
            target_username: target_username.into(),
            amount_minor,
            currency_code: currency_code.into(),
        }
    }
}
