//! The module contains `Budget`, the per-user balance record, and its
//! consistency rules.
//!
//! A budget tracks three amounts:
//!
//! - `total_budget`: everything deposited so far.
//! - `used_budget`: everything spent so far.
//! - `remaining_budget`: derived, always `total_budget - used_budget`.
//!
//! The derived field is never trusted from callers. Every mutator works on the
//! value, then runs [`Budget::recompute`] which restores `remaining_budget` and
//! rejects states where `used_budget > total_budget`. The engine persists the
//! result only when `recompute` succeeded.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_budget: MoneyCents,
    pub used_budget: MoneyCents,
    pub remaining_budget: MoneyCents,
    /// Optimistic concurrency counter, bumped on every persisted write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// First budget of a user, funded by its opening deposit.
    pub fn opening(user_id: Uuid, amount: MoneyCents) -> ResultEngine<Self> {
        let amount = amount.require_positive("deposit amount")?;
        let now = Utc::now();
        let mut budget = Self {
            id: Uuid::new_v4(),
            user_id,
            total_budget: amount,
            used_budget: MoneyCents::ZERO,
            remaining_budget: MoneyCents::ZERO,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        budget.recompute()?;
        Ok(budget)
    }

    /// Restores `remaining_budget` from its inputs.
    ///
    /// Fails when the inputs themselves are inconsistent: negative amounts or
    /// more used than deposited. The write must then be rejected.
    pub fn recompute(&mut self) -> ResultEngine<()> {
        if self.total_budget.is_negative() || self.used_budget.is_negative() {
            return Err(EngineError::InvariantViolation(
                "budget amounts cannot be negative".to_string(),
            ));
        }
        if self.used_budget > self.total_budget {
            return Err(EngineError::InvariantViolation(format!(
                "used budget {} exceeds total budget {}",
                self.used_budget, self.total_budget
            )));
        }
        self.remaining_budget = self.total_budget - self.used_budget;
        Ok(())
    }

    /// Adds funds. `used_budget` is untouched.
    pub fn deposit(&mut self, amount: MoneyCents) -> ResultEngine<()> {
        let amount = amount.require_positive("deposit amount")?;
        let mut next = self.clone();
        next.total_budget = next
            .total_budget
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
        next.recompute()?;
        *self = next;
        Ok(())
    }

    /// Consumes funds. Rejects spends larger than what is left.
    pub fn spend(&mut self, amount: MoneyCents) -> ResultEngine<()> {
        let amount = amount.require_positive("expense amount")?;
        if amount > self.remaining_budget {
            return Err(EngineError::InsufficientBudget(format!(
                "requested {amount}, remaining {}",
                self.remaining_budget
            )));
        }
        let mut next = self.clone();
        next.used_budget += amount;
        next.recompute()?;
        *self = next;
        Ok(())
    }

    /// Overwrites both inputs, e.g. to fix a data entry mistake.
    pub fn correct(&mut self, total: MoneyCents, used: MoneyCents) -> ResultEngine<()> {
        if total.is_negative() || used.is_negative() {
            return Err(EngineError::InvalidAmount(
                "budget amounts must be >= 0".to_string(),
            ));
        }
        let mut next = self.clone();
        next.total_budget = total;
        next.used_budget = used;
        next.recompute()?;
        *self = next;
        Ok(())
    }

    /// Share of the budget already used, rounded half up to a whole percent.
    pub fn utilization_percentage(&self) -> u32 {
        let total = i128::from(self.total_budget.cents());
        if total <= 0 {
            return 0;
        }
        let used = i128::from(self.used_budget.cents());
        let percent = (used * 200 + total) / (total * 2);
        u32::try_from(percent).unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub total_budget: i64,
    pub used_budget: i64,
    pub remaining_budget: i64,
    pub version: i64,
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

impl From<&Budget> for ActiveModel {
    fn from(value: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            total_budget: ActiveValue::Set(value.total_budget.cents()),
            used_budget: ActiveValue::Set(value.used_budget.cents()),
            remaining_budget: ActiveValue::Set(value.remaining_budget.cents()),
            version: ActiveValue::Set(value.version),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    /// Loads a stored row, refusing rows whose derived field drifted.
    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let stored_remaining = MoneyCents::new(model.remaining_budget);
        let mut budget = Self {
            id: model.id,
            user_id: model.user_id,
            total_budget: MoneyCents::new(model.total_budget),
            used_budget: MoneyCents::new(model.used_budget),
            remaining_budget: stored_remaining,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        };
        budget.recompute()?;
        if budget.remaining_budget != stored_remaining {
            return Err(EngineError::InvariantViolation(format!(
                "stored remaining budget {stored_remaining} does not match {}",
                budget.remaining_budget
            )));
        }
        Ok(budget)
    }
}
