//! Currency catalog entries.
//!
//! Currencies are identified by their upper-case code. Exactly one of them is
//! the default once the catalog is non-empty; new users get a zero account in
//! the default currency.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, money::MAX_MINOR_UNITS};

/// Minor units used when a currency is added without an explicit value.
pub const DEFAULT_MINOR_UNITS: u8 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Canonical upper-case code, e.g. `USD`.
    pub code: String,
    pub name: String,
    /// Display sign, e.g. `$`.
    pub sign: String,
    /// Number of fraction digits used when formatting/parsing amounts.
    pub minor_units: u8,
    pub is_default: bool,
}

impl Currency {
    /// Wrap an amount of this currency for display or arithmetic.
    #[must_use]
    pub fn money(&self, amount_minor: i64) -> Money {
        Money::new(amount_minor, self.minor_units)
    }

    /// Parse a human-entered decimal amount in this currency.
    pub fn parse_amount(&self, input: &str) -> Result<i64, EngineError> {
        Money::parse(input, self.minor_units).map(Money::minor)
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.code)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub name: String,
    pub sign: String,
    pub minor_units: i32,
    pub is_default: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::accounts::Entity")]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn new_active(currency: &Currency, created_at: DateTime<Utc>) -> ActiveModel {
        ActiveModel {
            code: ActiveValue::Set(currency.code.clone()),
            name: ActiveValue::Set(currency.name.clone()),
            sign: ActiveValue::Set(currency.sign.clone()),
            minor_units: ActiveValue::Set(i32::from(currency.minor_units)),
            is_default: ActiveValue::Set(currency.is_default),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl TryFrom<Model> for Currency {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let minor_units = u8::try_from(model.minor_units)
            .ok()
            .filter(|units| *units <= MAX_MINOR_UNITS)
            .ok_or_else(|| {
                EngineError::CurrencyMismatch(format!(
                    "invalid minor units for {}: {}",
                    model.code, model.minor_units
                ))
            })?;
        Ok(Self {
            code: model.code,
            name: model.name,
            sign: model.sign,
            minor_units,
            is_default: model.is_default,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> Currency {
        Currency {
            code: "USD".to_string(),
            name: "US Dollar".to_string(),
            sign: "$".to_string(),
            minor_units: 2,
            is_default: true,
        }
    }

    #[test]
    fn parse_amount_uses_minor_units() {
        assert_eq!(usd().parse_amount("12.5").unwrap(), 1250);
        assert!(usd().parse_amount("0.001").is_err());
    }

    #[test]
    fn rejects_stored_minor_units_out_of_range() {
        let model = Model {
            code: "XXX".to_string(),
            name: "Broken".to_string(),
            sign: "?".to_string(),
            minor_units: 42,
            is_default: false,
            created_at: Utc::now(),
        };
        assert!(Currency::try_from(model).is_err());
    }
}
