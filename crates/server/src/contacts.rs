//! Public contact form

use api_types::contact::{Contact, ContactNew};
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;

use crate::{JsonBody, ServerError, server::ServerState, views};

pub async fn submit(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<ContactNew>,
) -> Result<(StatusCode, Json<Contact>), ServerError> {
    let contact = state
        .engine
        .submit_contact(&payload.name, &payload.email, &payload.message)
        .await?;
    Ok((StatusCode::CREATED, Json(views::contact(contact))))
}
