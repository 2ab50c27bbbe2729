//! Budget API endpoints

use api_types::{
    Message,
    budget::{Budget, Correction, Deposit, Spend},
};
use axum::{Extension, Json, extract::State};
use axum_extra::extract::WithRejection;
use engine::{MoneyCents, User};

use crate::{JsonBody, ServerError, server::ServerState, views};

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Budget>, ServerError> {
    let budget = state.engine.budget(user.id).await?;
    Ok(Json(views::budget(&budget)))
}

/// Add funds, opening the budget on the first deposit.
pub async fn deposit(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<Deposit>,
) -> Result<Json<Budget>, ServerError> {
    let amount = MoneyCents::try_from(&payload.deposit_amount)?;
    let budget = state.engine.deposit(user.id, amount).await?;
    tracing::info!(user_id = %user.id, %amount, "deposit recorded");
    Ok(Json(views::budget(&budget)))
}

/// Record spending against the budget.
pub async fn spend(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<Spend>,
) -> Result<Json<Budget>, ServerError> {
    let amount = MoneyCents::try_from(&payload.expense_amount)?;
    let budget = state.engine.record_spend(user.id, amount).await?;
    Ok(Json(views::budget(&budget)))
}

pub async fn correct(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<Correction>,
) -> Result<Json<Budget>, ServerError> {
    let total = MoneyCents::try_from(&payload.total_budget)?;
    let used = MoneyCents::try_from(&payload.used_budget)?;
    let budget = state.engine.correct_budget(user.id, total, used).await?;
    Ok(Json(views::budget(&budget)))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_budget(user.id).await?;
    Ok(Json(Message::new("budget deleted")))
}
