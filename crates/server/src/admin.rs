//! Admin API endpoints
//!
//! Mounted under `/admin` behind the admin gate: non-admin callers never
//! reach these handlers.

use api_types::{
    admin::{AdminStatusSet, BalanceSet, UserBalancesView, UsersResponse},
    currency::{CurrencyNew, CurrencyView},
    transaction::TransactionView,
    user::UserView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::SetBalanceCmd;

use crate::{
    ServerError,
    currency::{self, currency_view},
    server::{Caller, ServerState},
    transactions::transaction_view,
    user::user_view,
};

pub async fn set_balance(
    Extension(Caller(identity)): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<BalanceSet>,
) -> Result<Json<TransactionView>, ServerError> {
    let currency = currency::resolve(&state, payload.currency.as_deref()).await?;
    let amount_minor = currency.parse_amount(&payload.amount)?;

    let entry = state
        .engine
        .admin_set_balance(SetBalanceCmd::new(
            identity,
            payload.username,
            amount_minor,
            currency.code,
        ))
        .await?;
    Ok(Json(transaction_view(entry)))
}

pub async fn set_admin_status(
    State(state): State<ServerState>,
    Json(payload): Json<AdminStatusSet>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .set_admin_status(&payload.username, payload.is_admin)
        .await?;
    Ok(Json(user_view(&user)))
}

pub async fn add_currency(
    State(state): State<ServerState>,
    Json(payload): Json<CurrencyNew>,
) -> Result<(StatusCode, Json<CurrencyView>), ServerError> {
    let minor_units = payload.minor_units.unwrap_or(engine::DEFAULT_MINOR_UNITS);
    let currency = state
        .engine
        .add_currency_with_minor_units(&payload.code, &payload.name, &payload.sign, minor_units)
        .await?;
    Ok((StatusCode::CREATED, Json(currency_view(currency))))
}

pub async fn set_default_currency(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<CurrencyView>, ServerError> {
    let currency = state.engine.set_default_currency(&code).await?;
    Ok(Json(currency_view(currency)))
}

pub async fn list_users(
    State(state): State<ServerState>,
) -> Result<Json<UsersResponse>, ServerError> {
    let users = state
        .engine
        .list_users_with_balances()
        .await?
        .into_iter()
        .map(|user| UserBalancesView {
            identity: user.identity,
            username: user.username,
            is_admin: user.is_admin,
            balances: user.balances,
        })
        .collect();
    Ok(Json(UsersResponse { users }))
}

pub async fn disable_user(
    State(state): State<ServerState>,
    Path(username): Path<String>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.disable_user(&username).await?;
    Ok(Json(user_view(&user)))
}

pub async fn destroy_user(
    State(state): State<ServerState>,
    Path(username): Path<String>,
) -> Result<StatusCode, ServerError> {
    state.engine.destroy_user(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}
