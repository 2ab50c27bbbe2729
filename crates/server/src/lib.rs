use api_types::ErrorBody;
use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use engine::EngineError;

pub use auth::{AuthError, TokenKeys};
pub use server::{ServerConfig, ServerState, router, run, run_with_listener, spawn_with_listener};
pub use uploads::Uploads;

mod admin;
mod auth;
mod budget;
mod contacts;
mod expenses;
mod receipts;
mod server;
mod uploads;
mod users;
mod views;

/// JSON request body whose rejections answer with the usual error body.
pub(crate) type JsonBody<T> = WithRejection<Json<T>, ServerError>;

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Auth(AuthError),
    /// Malformed request the engine never saw.
    Generic(String),
    /// Local failure (file system, token signing). Logged, never shown.
    Internal(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidAmount(_)
        | EngineError::Validation(_)
        | EngineError::InsufficientBudget(_) => StatusCode::BAD_REQUEST,
        EngineError::NoBudgetFound(_) | EngineError::NotFoundOrUnauthorized(_) => {
            StatusCode::NOT_FOUND
        }
        EngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::ExistingKey(_) | EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn status_for_auth_error(err: &AuthError) -> StatusCode {
    match err {
        AuthError::MissingCredential | AuthError::UnknownUser => StatusCode::UNAUTHORIZED,
        AuthError::InvalidCredential | AuthError::Inactive => StatusCode::FORBIDDEN,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, error) = match self {
            ServerError::Engine(err) => (
                status_for_engine_error(&err),
                err.kind(),
                message_for_engine_error(err),
            ),
            ServerError::Auth(err) => (status_for_auth_error(&err), err.kind(), err.to_string()),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, "BadRequest", err),
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    "internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            kind: kind.to_string(),
            error,
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: impl Into<ServerError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn client_mistakes_map_to_400() {
        assert_eq!(
            status(EngineError::InvalidAmount("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(EngineError::InsufficientBudget("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ServerError::Generic("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn missing_records_map_to_404() {
        assert_eq!(
            status(EngineError::NoBudgetFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(EngineError::NotFoundOrUnauthorized("x".to_string())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn races_and_duplicates_map_to_409() {
        assert_eq!(
            status(EngineError::Conflict("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(EngineError::ExistingKey("x".to_string())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn invariant_violation_maps_to_422() {
        assert_eq!(
            status(EngineError::InvariantViolation("x".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn auth_gate_outcomes() {
        assert_eq!(status(AuthError::MissingCredential), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::UnknownUser), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::InvalidCredential), StatusCode::FORBIDDEN);
        assert_eq!(status(AuthError::Inactive), StatusCode::FORBIDDEN);
        assert_eq!(status(EngineError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(EngineError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let res = ServerError::Internal("disk full".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let res = ServerError::from(EngineError::Database(sea_orm::DbErr::Custom(
            "boom".to_string(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
