//! Users and their lifecycle.
//!
//! A user is anchored by a stable external `identity` (the chat platform id).
//! The username is a mutable display name that other users type to address
//! transfers.
//!
//! Lifecycle:
//!
//! ```text
//!   absent --create--> Active --disable--> Disabled
//!                        ^                    |
//!                        +------create--------+
//!   Active | Disabled --destroy--> (row removed, terminal)
//! ```

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    /// Soft-deleted. Invisible to ledger operations until re-created.
    Disabled,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }
}

impl TryFrom<&str> for UserStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            other => Err(EngineError::InvalidInput(format!(
                "invalid user status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub identity: i64,
    pub username: String,
    pub is_admin: bool,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub disabled_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// What `create_user` did for an identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserUpsert {
    /// A new user with a zero account in the default currency.
    Created(User),
    /// A disabled user was re-activated, possibly under a new username.
    Resurrected(User),
    /// An active user changed username.
    Renamed { user: User, previous_username: String },
}

impl UserUpsert {
    pub fn user(&self) -> &User {
        match self {
            Self::Created(user) | Self::Resurrected(user) | Self::Renamed { user, .. } => user,
        }
    }

    pub fn into_user(self) -> User {
        match self {
            Self::Created(user) | Self::Resurrected(user) | Self::Renamed { user, .. } => user,
        }
    }
}

/// Transition chosen by `create_user` given the stored state of an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UpsertPlan {
    Create,
    Resurrect,
    Rename,
}

/// Decide the lifecycle transition for re-registering `username`.
///
/// An active user registered again with identical data is a conflict; any
/// other case is a state change.
pub(crate) fn plan_upsert(existing: Option<&User>, username: &str) -> ResultEngine<UpsertPlan> {
    match existing {
        None => Ok(UpsertPlan::Create),
        Some(user) => match user.status {
            UserStatus::Disabled => Ok(UpsertPlan::Resurrect),
            UserStatus::Active if user.username == username => {
                Err(EngineError::ExistingKey(format!("user {}", user.identity)))
            }
            UserStatus::Active => Ok(UpsertPlan::Rename),
        },
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub identity: i64,
    pub username: String,
    pub is_admin: bool,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub disabled_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::accounts::Entity")]
    Accounts,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id.to_string()),
            identity: ActiveValue::Set(user.identity),
            username: ActiveValue::Set(user.username.clone()),
            is_admin: ActiveValue::Set(user.is_admin),
            status: ActiveValue::Set(user.status.as_str().to_string()),
            created_at: ActiveValue::Set(user.created_at),
            disabled_at: ActiveValue::Set(user.disabled_at),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "user")?,
            identity: model.identity,
            username: model.username,
            is_admin: model.is_admin,
            status: UserStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
            disabled_at: model.disabled_at,
        })
    }
}
