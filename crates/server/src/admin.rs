//! Admin API endpoints
//!
//! Handlers pass the caller through; the engine refuses non-admin actors.

use api_types::{
    Message,
    admin::{Activity, CategoryReport, DashboardStats, ReportQuery, UserUpdate},
    budget::Budget,
    contact::Contact,
    expense::Expense,
    user::User,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use engine::{AccountStatus, ReportRange, ReviewDecision, Role, UserAdminUpdate};
use uuid::Uuid;

use crate::{JsonBody, ServerError, server::ServerState, views};

type Actor = Extension<engine::User>;

pub async fn stats(
    Extension(actor): Actor,
    State(state): State<ServerState>,
) -> Result<Json<DashboardStats>, ServerError> {
    let stats = state.engine.dashboard_stats(actor.id).await?;
    Ok(Json(views::stats(stats)))
}

pub async fn activities(
    Extension(actor): Actor,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Activity>>, ServerError> {
    let activity = state.engine.recent_activity(actor.id).await?;
    Ok(Json(activity.into_iter().map(views::activity).collect()))
}

/// `expenses` reports per-category totals, `budgets` lists budgets.
pub async fn report(
    Extension(actor): Actor,
    State(state): State<ServerState>,
    Path(report): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ServerError> {
    let range = ReportRange::try_from(query.range.as_deref().unwrap_or("all"))?;
    match report.as_str() {
        "expenses" => {
            let rows = state.engine.expense_report(actor.id, range).await?;
            let rows: Vec<CategoryReport> = rows.into_iter().map(views::category_report).collect();
            Ok(Json(rows).into_response())
        }
        "budgets" => {
            let budgets = state.engine.budget_report(actor.id, range).await?;
            let budgets: Vec<Budget> = budgets.iter().map(views::budget).collect();
            Ok(Json(budgets).into_response())
        }
        other => Err(ServerError::Generic(format!("unknown report type: {other}"))),
    }
}

pub async fn list_users(
    Extension(actor): Actor,
    State(state): State<ServerState>,
) -> Result<Json<Vec<User>>, ServerError> {
    let users = state.engine.list_users(actor.id).await?;
    Ok(Json(users.into_iter().map(views::user).collect()))
}

pub async fn update_user(
    Extension(actor): Actor,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<UserUpdate>,
) -> Result<Json<User>, ServerError> {
    let update = UserAdminUpdate {
        username: payload.username,
        role: payload.role.as_deref().map(Role::try_from).transpose()?,
        status: payload
            .status
            .as_deref()
            .map(AccountStatus::try_from)
            .transpose()?,
    };
    let user = state.engine.admin_update_user(actor.id, id, update).await?;
    Ok(Json(views::user(user)))
}

pub async fn toggle_user_status(
    Extension(actor): Actor,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ServerError> {
    let user = state.engine.toggle_user_status(actor.id, id).await?;
    Ok(Json(views::user(user)))
}

pub async fn delete_user(
    Extension(actor): Actor,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ServerError> {
    let images = state.engine.admin_delete_user(actor.id, id).await?;
    for image in images {
        state.uploads.remove(&image).await;
    }
    Ok(Json(Message::new("user deleted")))
}

pub async fn list_expenses(
    Extension(actor): Actor,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Expense>>, ServerError> {
    let expenses = state.engine.list_all_expenses(actor.id).await?;
    Ok(Json(expenses.into_iter().map(views::expense).collect()))
}

async fn review(
    state: ServerState,
    actor: engine::User,
    id: Uuid,
    decision: ReviewDecision,
) -> Result<Json<Expense>, ServerError> {
    let expense = state.engine.review_expense(actor.id, id, decision).await?;
    Ok(Json(views::expense(expense)))
}

pub async fn approve_expense(
    Extension(actor): Actor,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Expense>, ServerError> {
    review(state, actor, id, ReviewDecision::Approve).await
}

pub async fn reject_expense(
    Extension(actor): Actor,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Expense>, ServerError> {
    review(state, actor, id, ReviewDecision::Reject).await
}

pub async fn delete_expense(
    Extension(actor): Actor,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ServerError> {
    state.engine.admin_delete_expense(actor.id, id).await?;
    Ok(Json(Message::new("expense deleted")))
}

pub async fn list_contacts(
    Extension(actor): Actor,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Contact>>, ServerError> {
    let contacts = state.engine.list_contacts(actor.id).await?;
    Ok(Json(contacts.into_iter().map(views::contact).collect()))
}
