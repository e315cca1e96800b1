//! Account API endpoints

use std::collections::HashMap;

use api_types::account::{AccountView, AccountsResponse};
use axum::{Extension, Json, extract::State};

use crate::{
    ServerError,
    server::{Caller, ServerState},
};

/// The caller's balances, rendered with each currency's minor units.
pub async fn list(
    Extension(Caller(identity)): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<AccountsResponse>, ServerError> {
    let engine = &state.engine;
    let accounts = engine.accounts(identity).await?;
    let currencies: HashMap<String, engine::Currency> = engine
        .list_currencies()
        .await?
        .into_iter()
        .map(|currency| (currency.code.clone(), currency))
        .collect();

    let accounts = accounts
        .into_iter()
        .map(|account| {
            let amount = match currencies.get(&account.currency_code) {
                Some(currency) => currency.money(account.amount_minor).to_string(),
                None => engine::Money::new(account.amount_minor, engine::DEFAULT_MINOR_UNITS)
                    .to_string(),
            };
            AccountView {
                currency_code: account.currency_code,
                amount_minor: account.amount_minor,
                amount,
            }
        })
        .collect();

    Ok(Json(AccountsResponse { accounts }))
}
