//! Currency catalog API endpoints

use api_types::currency::{CurrenciesResponse, CurrencyView};
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState};

pub(crate) fn currency_view(currency: engine::Currency) -> CurrencyView {
    CurrencyView {
        code: currency.code,
        name: currency.name,
        sign: currency.sign,
        minor_units: currency.minor_units,
        is_default: currency.is_default,
    }
}

/// Resolve an optional code from a request body, falling back to the
/// default currency.
pub(crate) async fn resolve(
    state: &ServerState,
    code: Option<&str>,
) -> Result<engine::Currency, ServerError> {
    let currency = match code {
        Some(code) => state.engine.currency_by_code(code).await?,
        None => state.engine.default_currency().await?,
    };
    Ok(currency)
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<CurrenciesResponse>, ServerError> {
    let currencies = state
        .engine
        .list_currencies()
        .await?
        .into_iter()
        .map(currency_view)
        .collect();
    Ok(Json(CurrenciesResponse { currencies }))
}

pub async fn default(State(state): State<ServerState>) -> Result<Json<CurrencyView>, ServerError> {
    let currency = state.engine.default_currency().await?;
    Ok(Json(currency_view(currency)))
}

pub async fn by_code(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<CurrencyView>, ServerError> {
    let currency = state.engine.currency_by_code(&code).await?;
    Ok(Json(currency_view(currency)))
}
