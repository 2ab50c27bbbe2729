use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::{TypedHeaderRejection, TypedHeaderRejectionReason},
};
use engine::{Engine, EngineError};

use crate::{
    AuthError, ServerError, TokenKeys, Uploads, admin, budget, contacts, expenses, receipts, users,
};

/// Receipt images travel in the request body.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Runtime knobs of the HTTP surface.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub uploads_dir: PathBuf,
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: Arc<TokenKeys>,
    pub uploads: Uploads,
}

impl ServerState {
    pub fn new(engine: Engine, config: &ServerConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            tokens: Arc::new(TokenKeys::new(&config.jwt_secret, config.token_ttl)),
            uploads: Uploads::new(config.uploads_dir.clone()),
        }
    }
}

/// Resolve the bearer token into the acting user, stored as a request
/// extension for the handlers.
async fn auth(
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let auth_header = auth_header.map_err(|rejection| match rejection.reason() {
        TypedHeaderRejectionReason::Missing => AuthError::MissingCredential,
        _ => AuthError::InvalidCredential,
    })?;

    let user_id = state.tokens.verify(auth_header.token())?;
    let user = match state.engine.user(user_id).await {
        Ok(user) => user,
        Err(EngineError::NotFoundOrUnauthorized(_)) => {
            tracing::debug!(%user_id, "token for a deleted user");
            return Err(AuthError::UnknownUser.into());
        }
        Err(err) => return Err(err.into()),
    };
    if !user.is_active() {
        tracing::warn!(%user_id, "inactive account refused");
        return Err(AuthError::Inactive.into());
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route(
            "/api/users/profile",
            get(users::profile)
                .put(users::update_profile)
                .delete(users::delete_account),
        )
        .route("/api/users/verify", get(users::verify))
        .route(
            "/api/budget",
            get(budget::get)
                .put(budget::correct)
                .delete(budget::delete),
        )
        .route("/api/budget/deposit", post(budget::deposit))
        .route("/api/budget/expense", post(budget::spend))
        .route(
            "/api/expenses",
            get(expenses::list)
                .post(expenses::create)
                .delete(expenses::clear),
        )
        .route("/api/expenses/total", get(expenses::total))
        .route(
            "/api/expenses/{id}",
            get(expenses::get)
                .put(expenses::update)
                .delete(expenses::delete),
        )
        .route("/api/receipts", get(receipts::list).post(receipts::create))
        .route("/api/receipts/total", get(receipts::total))
        .route(
            "/api/receipts/{id}",
            get(receipts::get)
                .put(receipts::update)
                .delete(receipts::delete),
        )
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/activities", get(admin::activities))
        .route("/api/admin/reports/{report}", get(admin::report))
        .route("/api/admin/users", get(admin::list_users))
        .route(
            "/api/admin/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route(
            "/api/admin/users/{id}/toggle-status",
            post(admin::toggle_user_status),
        )
        .route("/api/admin/expenses", get(admin::list_expenses))
        .route(
            "/api/admin/expenses/{id}",
            axum::routing::delete(admin::delete_expense),
        )
        .route(
            "/api/admin/expenses/{id}/approve",
            post(admin::approve_expense),
        )
        .route("/api/admin/expenses/{id}/reject", post(admin::reject_expense))
        .route("/api/admin/contacts", get(admin::list_contacts))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/contact", post(contacts::submit))
        .route("/uploads/{file}", get(receipts::image))
        .merge(protected)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}

pub async fn run(engine: Engine, config: ServerConfig, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, config, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState::new(engine, &config);
    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
