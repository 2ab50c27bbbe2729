//! Expense API endpoints

use api_types::{
    Message, Totals,
    expense::{Cleared, Expense, ExpenseNew, ExpenseUpdate},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, NaiveDate, Utc};
use engine::{EngineError, ExpenseCategory, ExpenseDraft, ExpensePatch, MoneyCents, User};
use uuid::Uuid;

use crate::{JsonBody, ServerError, server::ServerState, views};

/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ServerError> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|_| EngineError::Validation(format!("invalid date: {raw}")).into())
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<ExpenseNew>,
) -> Result<(StatusCode, Json<Expense>), ServerError> {
    let amount = MoneyCents::try_from(&payload.amount)?;
    let mut draft = ExpenseDraft::new(payload.name, amount);
    if let Some(category) = payload.category.as_deref() {
        draft = draft.category(ExpenseCategory::try_from(category)?);
    }
    if let Some(date) = payload.date.as_deref() {
        draft = draft.date(parse_timestamp(date)?);
    }

    let expense = state.engine.create_expense(user.id, draft).await?;
    Ok((StatusCode::CREATED, Json(views::expense(expense))))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Expense>>, ServerError> {
    let expenses = state.engine.list_expenses(user.id).await?;
    Ok(Json(expenses.into_iter().map(views::expense).collect()))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Expense>, ServerError> {
    let expense = state.engine.expense(user.id, id).await?;
    Ok(Json(views::expense(expense)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<ExpenseUpdate>,
) -> Result<Json<Expense>, ServerError> {
    let patch = ExpensePatch {
        name: payload.name,
        amount: payload
            .amount
            .as_ref()
            .map(MoneyCents::try_from)
            .transpose()?,
        category: payload
            .category
            .as_deref()
            .map(ExpenseCategory::try_from)
            .transpose()?,
        date: payload.date.as_deref().map(parse_timestamp).transpose()?,
    };

    let expense = state.engine.update_expense(user.id, id, patch).await?;
    Ok(Json(views::expense(expense)))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_expense(user.id, id).await?;
    Ok(Json(Message::new("expense deleted")))
}

/// Remove every expense of the caller.
pub async fn clear(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Cleared>, ServerError> {
    let deleted_count = state.engine.clear_expenses(user.id).await?;
    Ok(Json(Cleared { deleted_count }))
}

pub async fn total(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Totals>, ServerError> {
    let totals = state.engine.expense_totals(user.id).await?;
    Ok(Json(views::totals(totals)))
}
