//! Balance engine operations.
//!
//! Every mutation follows the same path: load the record, apply the change on
//! a copy through the `Budget` mutators (which recompute and validate the
//! derived fields), then persist with a compare-and-set on `version`. A write
//! that lost a race against another writer is reported as
//! [`EngineError::Conflict`]; it is never merged.

use chrono::Utc;
use sea_orm::{QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{Budget, EngineError, MoneyCents, ResultEngine, budgets};

use super::{Engine, is_unique_violation};

fn no_budget(user_id: Uuid) -> EngineError {
    EngineError::NoBudgetFound(format!("user {user_id} has no budget"))
}

impl Engine {
    async fn find_budget(&self, user_id: Uuid) -> ResultEngine<Option<Budget>> {
        budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .map(Budget::try_from)
            .transpose()
    }

    /// Return the budget of `user_id`. No side effects.
    pub async fn budget(&self, user_id: Uuid) -> ResultEngine<Budget> {
        self.find_budget(user_id)
            .await?
            .ok_or_else(|| no_budget(user_id))
    }

    /// Add funds to the budget of `user_id`, opening it on the first deposit.
    pub async fn deposit(&self, user_id: Uuid, amount: MoneyCents) -> ResultEngine<Budget> {
        let amount = amount.require_positive("deposit amount")?;

        if let Some(current) = self.find_budget(user_id).await? {
            return self
                .commit_budget(current, |budget| budget.deposit(amount))
                .await;
        }

        let budget = Budget::opening(user_id, amount)?;
        match budgets::ActiveModel::from(&budget)
            .insert(&self.database)
            .await
        {
            Ok(_) => {
                tracing::info!(%user_id, amount = %amount, "budget opened");
                Ok(budget)
            }
            // A concurrent first deposit created the row: deposit into it.
            Err(err) if is_unique_violation(&err) => {
                let current = self.budget(user_id).await?;
                self.commit_budget(current, |budget| budget.deposit(amount))
                    .await
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Record money spent out of the budget of `user_id`.
    ///
    /// Fails with `InsufficientBudget` when `amount` exceeds what is left; the
    /// budget is unchanged in that case.
    pub async fn record_spend(&self, user_id: Uuid, amount: MoneyCents) -> ResultEngine<Budget> {
        let current = self.budget(user_id).await?;
        self.commit_budget(current, |budget| budget.spend(amount))
            .await
    }

    /// Overwrite total and used amounts of the budget of `user_id`.
    pub async fn correct_budget(
        &self,
        user_id: Uuid,
        total: MoneyCents,
        used: MoneyCents,
    ) -> ResultEngine<Budget> {
        let current = self.budget(user_id).await?;
        self.commit_budget(current, |budget| budget.correct(total, used))
            .await
    }

    /// Remove the budget of `user_id`. The next deposit opens a new one.
    pub async fn delete_budget(&self, user_id: Uuid) -> ResultEngine<()> {
        let result = budgets::Entity::delete_many()
            .filter(budgets::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(no_budget(user_id));
        }
        tracing::info!(%user_id, "budget deleted");
        Ok(())
    }

    /// Apply `change` to a copy of `current` and persist it if nobody wrote the
    /// record since it was read.
    async fn commit_budget<F>(&self, current: Budget, change: F) -> ResultEngine<Budget>
    where
        F: FnOnce(&mut Budget) -> ResultEngine<()>,
    {
        let mut next = current.clone();
        change(&mut next)?;
        next.recompute()?;
        next.version = current.version + 1;
        next.updated_at = Utc::now();

        let result = budgets::Entity::update_many()
            .col_expr(
                budgets::Column::TotalBudget,
                Expr::value(next.total_budget.cents()),
            )
            .col_expr(
                budgets::Column::UsedBudget,
                Expr::value(next.used_budget.cents()),
            )
            .col_expr(
                budgets::Column::RemainingBudget,
                Expr::value(next.remaining_budget.cents()),
            )
            .col_expr(budgets::Column::Version, Expr::value(next.version))
            .col_expr(budgets::Column::UpdatedAt, Expr::value(next.updated_at))
            .filter(budgets::Column::Id.eq(current.id))
            .filter(budgets::Column::Version.eq(current.version))
            .exec(&self.database)
            .await?;

        if result.rows_affected == 0 {
            tracing::warn!(
                user_id = %current.user_id,
                version = current.version,
                "budget write rejected: record changed concurrently"
            );
            return Err(EngineError::Conflict(
                "budget was modified concurrently".to_string(),
            ));
        }

        tracing::debug!(
            user_id = %next.user_id,
            total = %next.total_budget,
            used = %next.used_budget,
            remaining = %next.remaining_budget,
            "budget updated"
        );
        Ok(next)
    }
}
