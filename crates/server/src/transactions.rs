//! Transfer and history API endpoints

use api_types::transaction::{
    TransactionKind as ApiKind, TransactionList, TransactionListResponse, TransactionView,
    TransferCreated, TransferNew,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::TransferCmd;

use crate::{
    ServerError, currency,
    server::{Caller, ServerState},
};

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::TransferOut => ApiKind::TransferOut,
        engine::TransactionKind::TransferIn => ApiKind::TransferIn,
        engine::TransactionKind::AdminSetBalance => ApiKind::AdminSetBalance,
    }
}

pub(crate) fn transaction_view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        currency_code: tx.currency_code,
        amount_minor: tx.amount_minor,
        from_username: tx.from_username,
        to_username: tx.to_username,
        occurred_at: tx.occurred_at,
        balance_after_minor: tx.balance_after_minor,
    }
}

/// Send funds from the caller to another user.
pub async fn transfer(
    Extension(Caller(identity)): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferCreated>), ServerError> {
    let currency = currency::resolve(&state, payload.currency.as_deref()).await?;
    let amount_minor = currency.parse_amount(&payload.amount)?;

    let receipt = state
        .engine
        .transfer(TransferCmd::new(
            identity,
            payload.to_username,
            amount_minor,
            currency.code,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferCreated {
            outgoing: transaction_view(receipt.outgoing),
            incoming: transaction_view(receipt.incoming),
        }),
    ))
}

/// The caller's newest transactions.
pub async fn history(
    Extension(Caller(identity)): Extension<Caller>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let transactions = state
        .engine
        .transaction_history(identity, query.limit)
        .await?
        .into_iter()
        .map(transaction_view)
        .collect();
    Ok(Json(TransactionListResponse { transactions }))
}
