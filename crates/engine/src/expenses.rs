//! Expense records and their review lifecycle.
//!
//! An expense is created `pending` by its owner and moves to `approved` or
//! `rejected` only through an admin review. Reviews stamp the reviewer and the
//! review time; they never touch the owner's budget.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Food,
    Transport,
    Utilities,
    Entertainment,
    Healthcare,
    Shopping,
    Business,
    Education,
    Travel,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 10] = [
        Self::Food,
        Self::Transport,
        Self::Utilities,
        Self::Entertainment,
        Self::Healthcare,
        Self::Shopping,
        Self::Business,
        Self::Education,
        Self::Travel,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Utilities => "Utilities",
            Self::Entertainment => "Entertainment",
            Self::Healthcare => "Healthcare",
            Self::Shopping => "Shopping",
            Self::Business => "Business",
            Self::Education => "Education",
            Self::Travel => "Travel",
            Self::Other => "Other",
        }
    }
}

impl TryFrom<&str> for ExpenseCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| EngineError::Validation(format!("invalid expense category: {value}")))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for ExpenseStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::Validation(format!(
                "invalid expense status: {other}"
            ))),
        }
    }
}

/// Outcome of an admin review.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl From<ReviewDecision> for ExpenseStatus {
    fn from(value: ReviewDecision) -> Self {
        match value {
            ReviewDecision::Approve => Self::Approved,
            ReviewDecision::Reject => Self::Rejected,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub amount: MoneyCents,
    pub category: ExpenseCategory,
    pub date: DateTime<Utc>,
    pub status: ExpenseStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        user_id: Uuid,
        name: String,
        amount: MoneyCents,
        category: ExpenseCategory,
        date: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let amount = amount.require_positive("expense amount")?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            amount,
            category,
            date,
            status: ExpenseStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub amount_minor: i64,
    pub category: String,
    pub date: DateTimeUtc,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(value: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            name: ActiveValue::Set(value.name.clone()),
            amount_minor: ActiveValue::Set(value.amount.cents()),
            category: ActiveValue::Set(value.category.as_str().to_string()),
            date: ActiveValue::Set(value.date),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            reviewed_by: ActiveValue::Set(value.reviewed_by),
            reviewed_at: ActiveValue::Set(value.reviewed_at),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            amount: MoneyCents::new(model.amount_minor),
            category: ExpenseCategory::try_from(model.category.as_str())?,
            date: model.date,
            status: ExpenseStatus::try_from(model.status.as_str())?,
            reviewed_by: model.reviewed_by,
            reviewed_at: model.reviewed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(
            ExpenseCategory::try_from("food").unwrap(),
            ExpenseCategory::Food
        );
        assert_eq!(
            ExpenseCategory::try_from(" Travel ").unwrap(),
            ExpenseCategory::Travel
        );
        assert!(ExpenseCategory::try_from("Gambling").is_err());
    }

    #[test]
    fn new_expense_starts_pending_with_positive_amount() {
        let expense = Expense::new(
            Uuid::new_v4(),
            "Lunch".to_string(),
            MoneyCents::new(1250),
            ExpenseCategory::default(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(expense.status, ExpenseStatus::Pending);
        assert_eq!(expense.category, ExpenseCategory::Other);
        assert!(expense.reviewed_by.is_none());

        assert!(matches!(
            Expense::new(
                Uuid::new_v4(),
                "Lunch".to_string(),
                MoneyCents::ZERO,
                ExpenseCategory::Food,
                Utc::now(),
            ),
            Err(EngineError::InvalidAmount(_))
        ));
    }
}
