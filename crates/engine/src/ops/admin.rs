//! Read-only views for the admin dashboard.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, NaiveTime, TimeZone, Utc};
use sea_orm::{
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Budget, EngineError, ExpenseCategory, ExpenseStatus, MoneyCents, ResultEngine, budgets,
    expenses, receipts, users,
};

use super::{Engine, Totals, TotalsRow};

const RECENT_PER_KIND: u64 = 5;
const RECENT_LIMIT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_budgets: u64,
    pub total_expenses: u64,
    pub total_receipts: u64,
    pub total_expense_amount: MoneyCents,
    pub pending_approvals: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    User,
    Expense,
}

/// One line of the dashboard activity feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activity {
    pub kind: ActivityKind,
    pub message: String,
    pub time: DateTime<Utc>,
    pub status: String,
}

/// Time window of a report, on `created_at`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportRange {
    Today,
    /// Since the last Sunday, midnight UTC.
    ThisWeek,
    ThisMonth,
    #[default]
    All,
}

impl ReportRange {
    /// Inclusive start and exclusive end of the window around `now`.
    pub fn bounds(self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let today = now.date_naive();
        let midnight = |date: chrono::NaiveDate| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        match self {
            Self::Today => (
                Some(midnight(today)),
                today.checked_add_days(Days::new(1)).map(midnight),
            ),
            Self::ThisWeek => {
                let back = u64::from(today.weekday().num_days_from_sunday());
                (today.checked_sub_days(Days::new(back)).map(midnight), None)
            }
            Self::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                let next = if first.month() == 12 {
                    first.with_year(first.year() + 1).and_then(|d| d.with_month(1))
                } else {
                    first.with_month(first.month() + 1)
                };
                (Some(midnight(first)), next.map(midnight))
            }
            Self::All => (None, None),
        }
    }
}

impl TryFrom<&str> for ReportRange {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "today" => Ok(Self::Today),
            "thisWeek" => Ok(Self::ThisWeek),
            "thisMonth" => Ok(Self::ThisMonth),
            "all" | "" => Ok(Self::All),
            other => Err(EngineError::Validation(format!(
                "invalid report range: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total_amount: MoneyCents,
    pub count: u64,
}

#[derive(Debug, FromQueryResult)]
struct CategoryRow {
    category: String,
    total: Option<i64>,
    count: i64,
}

impl Engine {
    /// Global counters. Admin only.
    pub async fn dashboard_stats(&self, actor_id: Uuid) -> ResultEngine<DashboardStats> {
        self.require_admin(actor_id).await?;
        let db = &self.database;

        let expense_totals: Totals = expenses::Entity::find()
            .select_only()
            .column_as(Expr::col(expenses::Column::AmountMinor).sum(), "total")
            .column_as(Expr::col(expenses::Column::Id).count(), "count")
            .into_model::<TotalsRow>()
            .one(db)
            .await?
            .into();

        Ok(DashboardStats {
            total_users: users::Entity::find().count(db).await?,
            total_budgets: budgets::Entity::find().count(db).await?,
            total_expenses: expense_totals.total_count,
            total_receipts: receipts::Entity::find().count(db).await?,
            total_expense_amount: expense_totals.total_amount,
            pending_approvals: expenses::Entity::find()
                .filter(expenses::Column::Status.eq(ExpenseStatus::Pending.as_str()))
                .count(db)
                .await?,
        })
    }

    /// Newest registrations and expenses, merged newest first. Admin only.
    pub async fn recent_activity(&self, actor_id: Uuid) -> ResultEngine<Vec<Activity>> {
        self.require_admin(actor_id).await?;
        let db = &self.database;

        let recent_users = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .limit(RECENT_PER_KIND)
            .all(db)
            .await?;
        let recent_expenses = expenses::Entity::find()
            .order_by_desc(expenses::Column::CreatedAt)
            .limit(RECENT_PER_KIND)
            .all(db)
            .await?;

        let owner_ids: Vec<Uuid> = recent_expenses.iter().map(|e| e.user_id).collect();
        let owners: HashMap<Uuid, String> = users::Entity::find()
            .filter(users::Column::Id.is_in(owner_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let mut activities: Vec<Activity> = recent_users
            .into_iter()
            .map(|user| Activity {
                kind: ActivityKind::User,
                message: format!("New user {} registered", user.username),
                time: user.created_at,
                status: "success".to_string(),
            })
            .chain(recent_expenses.into_iter().map(|expense| {
                let owner = owners
                    .get(&expense.user_id)
                    .map(String::as_str)
                    .unwrap_or("unknown user");
                Activity {
                    kind: ActivityKind::Expense,
                    message: format!("Expense {} submitted by {owner}", expense.name),
                    time: expense.created_at,
                    status: expense.status,
                }
            }))
            .collect();
        activities.sort_by(|a, b| b.time.cmp(&a.time));
        activities.truncate(RECENT_LIMIT);
        Ok(activities)
    }

    /// Expense amounts and counts per category within `range`. Admin only.
    pub async fn expense_report(
        &self,
        actor_id: Uuid,
        range: ReportRange,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        self.require_admin(actor_id).await?;
        let (from, to) = range.bounds(Utc::now());

        let mut query = expenses::Entity::find()
            .select_only()
            .column(expenses::Column::Category)
            .column_as(Expr::col(expenses::Column::AmountMinor).sum(), "total")
            .column_as(Expr::col(expenses::Column::Id).count(), "count")
            .group_by(expenses::Column::Category)
            .order_by_asc(expenses::Column::Category);
        if let Some(from) = from {
            query = query.filter(expenses::Column::CreatedAt.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(expenses::Column::CreatedAt.lt(to));
        }

        query
            .into_model::<CategoryRow>()
            .all(&self.database)
            .await?
            .into_iter()
            .map(|row| {
                Ok(CategoryTotal {
                    category: ExpenseCategory::try_from(row.category.as_str())?,
                    total_amount: MoneyCents::new(row.total.unwrap_or(0)),
                    count: u64::try_from(row.count).unwrap_or(0),
                })
            })
            .collect()
    }

    /// Budgets created within `range`, newest first. Admin only.
    pub async fn budget_report(
        &self,
        actor_id: Uuid,
        range: ReportRange,
    ) -> ResultEngine<Vec<Budget>> {
        self.require_admin(actor_id).await?;
        let (from, to) = range.bounds(Utc::now());

        let mut query = budgets::Entity::find().order_by_desc(budgets::Column::CreatedAt);
        if let Some(from) = from {
            query = query.filter(budgets::Column::CreatedAt.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(budgets::Column::CreatedAt.lt(to));
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Budget::try_from)
            .collect()
    }
}
