//! User API endpoints

use api_types::user::{RegisterOutcome, UserRegister, UserRegistered, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{User, UserUpsert};

use crate::{
    ServerError,
    server::{Caller, ServerState},
};

pub(crate) fn user_view(user: &User) -> UserView {
    UserView {
        identity: user.identity,
        username: user.username.clone(),
        is_admin: user.is_admin,
    }
}

/// Register the caller, resurrect it or update its username.
pub async fn register(
    Extension(Caller(identity)): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<UserRegister>,
) -> Result<(StatusCode, Json<UserRegistered>), ServerError> {
    let upsert = state
        .engine
        .create_user(identity, &payload.username)
        .await?;

    let (status, outcome, previous_username) = match &upsert {
        UserUpsert::Created(_) => (StatusCode::CREATED, RegisterOutcome::Created, None),
        UserUpsert::Resurrected(_) => (StatusCode::OK, RegisterOutcome::Resurrected, None),
        UserUpsert::Renamed {
            previous_username, ..
        } => (
            StatusCode::OK,
            RegisterOutcome::Renamed,
            Some(previous_username.clone()),
        ),
    };

    Ok((
        status,
        Json(UserRegistered {
            outcome,
            user: user_view(upsert.user()),
            previous_username,
        }),
    ))
}

/// The caller's own profile.
pub async fn me(
    Extension(Caller(identity)): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user(identity).await?;
    Ok(Json(user_view(&user)))
}
