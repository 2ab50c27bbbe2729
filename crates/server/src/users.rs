//! Account API endpoints

use api_types::{
    Message,
    user::{Login, LoginResponse, ProfileUpdate, Register, User},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use engine::RegisterCmd;

use crate::{JsonBody, ServerError, server::ServerState, views};

pub async fn register(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<Register>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let user = state
        .engine
        .register(RegisterCmd {
            username: payload.username,
            email: payload.email,
            password: payload.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(views::user(user))))
}

/// Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<Login>,
) -> Result<Json<LoginResponse>, ServerError> {
    let user = state
        .engine
        .authenticate(&payload.email, &payload.password)
        .await?;
    let token = state
        .tokens
        .issue(user.id)
        .map_err(|err| ServerError::Internal(format!("cannot sign token: {err}")))?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: views::user(user),
    }))
}

pub async fn profile(Extension(user): Extension<engine::User>) -> Json<User> {
    Json(views::user(user))
}

/// Token check for clients; answers with the resolved account.
pub async fn verify(Extension(user): Extension<engine::User>) -> Json<User> {
    Json(views::user(user))
}

pub async fn update_profile(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<ProfileUpdate>,
) -> Result<Json<User>, ServerError> {
    let user = state
        .engine
        .update_profile(user.id, &payload.username)
        .await?;
    Ok(Json(views::user(user)))
}

/// Delete the caller's account with all of its records and images.
pub async fn delete_account(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
) -> Result<Json<Message>, ServerError> {
    let images = state.engine.delete_account(user.id).await?;
    for image in images {
        state.uploads.remove(&image).await;
    }
    Ok(Json(Message::new("account deleted")))
}
