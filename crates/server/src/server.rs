use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, Error as AxumError, Header, authorization::Basic},
};

use std::sync::Arc;

use crate::{accounts, admin, currency, transactions, user};
use engine::Engine;

static TELEGRAM_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("telegram-user-id");

/// Client credentials the bot and dashboard present with HTTP Basic auth.
#[derive(Clone, Debug)]
pub struct ApiCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub credentials: Arc<ApiCredentials>,
}

/// Identity of the user the request acts for, taken from the
/// `telegram-user-id` header.
#[derive(Clone, Copy, Debug)]
pub struct Caller(pub i64);

/// `TypedHeader` for custom telegram header
///
/// Telegram requests must contain "telegram-user-id" entry in the header.
#[derive(Debug)]
struct TelegramHeader(i64);

impl Header for TelegramHeader {
    fn name() -> &'static axum::http::HeaderName {
        &TELEGRAM_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = value.trim().parse() else {
            return Err(AxumError::invalid());
        };

        Ok(TelegramHeader(value))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        let as_string = self.0.to_string();
        match axum::http::HeaderValue::from_str(&as_string) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode telegram-user-id header"),
        }
    }
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    telegram_header: Option<TypedHeader<TelegramHeader>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username() != state.credentials.username
        || auth_header.password() != state.credentials.password
    {
        tracing::warn!("rejected client credentials for {}", auth_header.username());
        return Err(StatusCode::UNAUTHORIZED);
    }

    let Some(TypedHeader(TelegramHeader(identity))) = telegram_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(Caller(identity));
    Ok(next.run(request).await)
}

/// Admin routes answer non-admins exactly like an unknown route.
async fn require_admin(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(Caller(identity)) = request.extensions().get::<Caller>().copied() else {
        return Err(StatusCode::NOT_FOUND);
    };
    if !state.engine.is_admin(identity).await {
        tracing::warn!("user {identity} requested {}", request.uri().path());
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(next.run(request).await)
}

pub fn router(engine: Arc<Engine>, credentials: ApiCredentials) -> Router {
    let state = ServerState {
        engine,
        credentials: Arc::new(credentials),
    };

    let admin_routes = Router::new()
        .route("/balance", post(admin::set_balance))
        .route("/status", post(admin::set_admin_status))
        .route("/currencies", post(admin::add_currency))
        .route("/currencies/{code}/default", post(admin::set_default_currency))
        .route("/users", get(admin::list_users))
        .route("/users/{username}/disable", post(admin::disable_user))
        .route("/users/{username}", delete(admin::destroy_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/user", post(user::register).get(user::me))
        .route("/accounts", get(accounts::list))
        .route("/transfer", post(transactions::transfer))
        .route("/transactions", get(transactions::history))
        .route("/currencies", get(currency::list))
        .route("/currencies/default", get(currency::default))
        .route("/currencies/{code}", get(currency::by_code))
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, address: &str, credentials: ApiCredentials) {
    let listener = match tokio::net::TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {address}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, credentials, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    credentials: ApiCredentials,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine), credentials)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    credentials: ApiCredentials,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, credentials, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
