use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ApiCredentials, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod admin;
mod currency;
mod server;
mod transactions;
mod user;

pub mod types {
    pub mod user {
        pub use api_types::user::{RegisterOutcome, UserRegister, UserRegistered, UserView};
    }

    pub mod currency {
        pub use api_types::currency::{CurrenciesResponse, CurrencyNew, CurrencyView};
    }

    pub mod account {
        pub use api_types::account::{AccountView, AccountsResponse};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            TransactionKind, TransactionList, TransactionListResponse, TransactionView,
            TransferCreated, TransferNew,
        };
    }

    pub mod admin {
        pub use api_types::admin::{AdminStatusSet, BalanceSet, UserBalancesView, UsersResponse};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        // Privileged routes are indistinguishable from unknown ones.
        EngineError::KeyNotFound(_) | EngineError::Unauthorized(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InsufficientFunds(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidInput(_)
        | EngineError::SelfTransfer(_)
        | EngineError::CurrencyNotHeld(_)
        | EngineError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Unavailable(reason) => {
            tracing::warn!("store unavailable: {reason}");
            "service unavailable, retry later".to_string()
        }
        EngineError::Unauthorized(reason) => {
            tracing::warn!("unauthorized: {reason}");
            "not found".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_unauthorized_maps_to_404() {
        let res =
            ServerError::from(EngineError::Unauthorized("nope".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InsufficientFunds("x".to_string()),
            EngineError::SelfTransfer("x".to_string()),
            EngineError::CurrencyNotHeld("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn engine_unavailable_maps_to_503() {
        let res = ServerError::from(EngineError::Unavailable("busy".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
