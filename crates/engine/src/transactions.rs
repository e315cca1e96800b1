//! Transaction log entries.
//!
//! A `Transaction` records one balance change on one account, relative to
//! the owning user: negative amounts leave the account, positive ones enter
//! it. A transfer produces two entries (one per side) sharing `occurred_at`.
//!
//! Entries are never updated; they disappear only when their owner is
//! destroyed.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, User, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    TransferOut,
    TransferIn,
    AdminSetBalance,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
            Self::AdminSetBalance => "admin_set_balance",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "transfer_out" => Ok(Self::TransferOut),
            "transfer_in" => Ok(Self::TransferIn),
            "admin_set_balance" => Ok(Self::AdminSetBalance),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// One side of a balance-affecting operation.
///
/// Counterparty identities and usernames are copied at write time so the
/// history stays readable after renames or deletions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    /// Owner of this entry.
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub currency_code: String,
    /// Signed change, in minor units, relative to the owner.
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub from_identity: i64,
    pub from_username: String,
    pub to_identity: i64,
    pub to_username: String,
    pub occurred_at: DateTime<Utc>,
    /// Owner's account balance right after this entry was applied.
    pub balance_after_minor: i64,
}

/// Parties of a balance-affecting operation.
pub(crate) struct Parties<'a> {
    pub from: &'a User,
    pub to: &'a User,
}

impl Transaction {
    pub(crate) fn new(
        owner: &User,
        account_id: Uuid,
        currency_code: &str,
        amount_minor: i64,
        kind: TransactionKind,
        parties: &Parties<'_>,
        occurred_at: DateTime<Utc>,
        balance_after_minor: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: owner.id,
            account_id,
            currency_code: currency_code.to_string(),
            amount_minor,
            kind,
            from_identity: parties.from.identity,
            from_username: parties.from.username.clone(),
            to_identity: parties.to.identity,
            to_username: parties.to.username.clone(),
            occurred_at,
            balance_after_minor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub currency_code: String,
    pub amount_minor: i64,
    pub kind: String,
    pub from_identity: i64,
    pub from_username: String,
    pub to_identity: i64,
    pub to_username: String,
    pub occurred_at: DateTimeUtc,
    pub balance_after_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.to_string()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            currency_code: ActiveValue::Set(tx.currency_code.clone()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            from_identity: ActiveValue::Set(tx.from_identity),
            from_username: ActiveValue::Set(tx.from_username.clone()),
            to_identity: ActiveValue::Set(tx.to_identity),
            to_username: ActiveValue::Set(tx.to_username.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            balance_after_minor: ActiveValue::Set(tx.balance_after_minor),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            currency_code: model.currency_code,
            amount_minor: model.amount_minor,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            from_identity: model.from_identity,
            from_username: model.from_username,
            to_identity: model.to_identity,
            to_username: model.to_username,
            occurred_at: model.occurred_at,
            balance_after_minor: model.balance_after_minor,
        })
    }
}
