use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, Expense, ExpenseDraft, ExpensePatch, ExpenseStatus, ResultEngine, ReviewDecision,
    expenses, util::normalize_required,
};

use super::{Engine, Totals, TotalsRow};

impl Engine {
    /// Record a new pending expense for `user_id`.
    pub async fn create_expense(&self, user_id: Uuid, draft: ExpenseDraft) -> ResultEngine<Expense> {
        let name = normalize_required(&draft.name, "expense name")?;
        let expense = Expense::new(
            user_id,
            name,
            draft.amount,
            draft.category.unwrap_or_default(),
            draft.date.unwrap_or_else(Utc::now),
        )?;
        expenses::ActiveModel::from(&expense)
            .insert(&self.database)
            .await?;
        tracing::debug!(%user_id, expense_id = %expense.id, "expense created");
        Ok(expense)
    }

    /// Expenses of `user_id`, newest first.
    pub async fn list_expenses(&self, user_id: Uuid) -> ResultEngine<Vec<Expense>> {
        expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect()
    }

    pub async fn expense(&self, user_id: Uuid, expense_id: Uuid) -> ResultEngine<Expense> {
        let model = self
            .owned_expense(&self.database, user_id, expense_id)
            .await?;
        Expense::try_from(model)
    }

    /// Edit a pending expense. Reviewed expenses are frozen.
    pub async fn update_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        patch: ExpensePatch,
    ) -> ResultEngine<Expense> {
        if patch.is_empty() {
            return Err(EngineError::Validation(
                "provide at least one field to update".to_string(),
            ));
        }

        let mut expense = self.expense(user_id, expense_id).await?;
        if expense.status != ExpenseStatus::Pending {
            return Err(EngineError::Validation(format!(
                "expense is already {} and cannot be edited",
                expense.status.as_str()
            )));
        }

        if let Some(name) = patch.name.as_deref() {
            expense.name = normalize_required(name, "expense name")?;
        }
        if let Some(amount) = patch.amount {
            expense.amount = amount.require_positive("expense amount")?;
        }
        if let Some(category) = patch.category {
            expense.category = category;
        }
        if let Some(date) = patch.date {
            expense.date = date;
        }
        expense.updated_at = Utc::now();

        // The status filter keeps an edit from landing on an expense reviewed
        // in the meantime.
        let result = expenses::Entity::update_many()
            .col_expr(expenses::Column::Name, Expr::value(expense.name.clone()))
            .col_expr(
                expenses::Column::AmountMinor,
                Expr::value(expense.amount.cents()),
            )
            .col_expr(
                expenses::Column::Category,
                Expr::value(expense.category.as_str()),
            )
            .col_expr(expenses::Column::Date, Expr::value(expense.date))
            .col_expr(expenses::Column::UpdatedAt, Expr::value(expense.updated_at))
            .filter(expenses::Column::Id.eq(expense_id))
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::Status.eq(ExpenseStatus::Pending.as_str()))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(
                "expense was reviewed or removed concurrently".to_string(),
            ));
        }

        Ok(expense)
    }

    /// Delete one expense of `user_id`, returning it.
    pub async fn delete_expense(&self, user_id: Uuid, expense_id: Uuid) -> ResultEngine<Expense> {
        let expense = self.expense(user_id, expense_id).await?;
        expenses::Entity::delete_many()
            .filter(expenses::Column::Id.eq(expense_id))
            .filter(expenses::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        Ok(expense)
    }

    /// Delete every expense of `user_id`. Returns how many were removed.
    pub async fn clear_expenses(&self, user_id: Uuid) -> ResultEngine<u64> {
        let result = expenses::Entity::delete_many()
            .filter(expenses::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        tracing::info!(%user_id, removed = result.rows_affected, "expenses cleared");
        Ok(result.rows_affected)
    }

    /// Sum and count of the expenses of `user_id`.
    pub async fn expense_totals(&self, user_id: Uuid) -> ResultEngine<Totals> {
        let row = expenses::Entity::find()
            .select_only()
            .column_as(Expr::col(expenses::Column::AmountMinor).sum(), "total")
            .column_as(Expr::col(expenses::Column::Id).count(), "count")
            .filter(expenses::Column::UserId.eq(user_id))
            .group_by(expenses::Column::UserId)
            .into_model::<TotalsRow>()
            .one(&self.database)
            .await?;
        Ok(Totals::from(row))
    }

    /// Every expense in the system, newest first. Admin only.
    pub async fn list_all_expenses(&self, actor_id: Uuid) -> ResultEngine<Vec<Expense>> {
        self.require_admin(actor_id).await?;
        expenses::Entity::find()
            .order_by_desc(expenses::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect()
    }

    /// Approve or reject an expense. Admin only.
    ///
    /// Stamps the reviewer and review time. The owner's budget is not touched:
    /// spending is recorded separately through [`Engine::record_spend`].
    pub async fn review_expense(
        &self,
        actor_id: Uuid,
        expense_id: Uuid,
        decision: ReviewDecision,
    ) -> ResultEngine<Expense> {
        self.require_admin(actor_id).await?;
        let model = expenses::Entity::find_by_id(expense_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| {
                EngineError::NotFoundOrUnauthorized(format!("expense {expense_id}"))
            })?;

        let now = Utc::now();
        let status = ExpenseStatus::from(decision);
        let mut active: expenses::ActiveModel = model.into();
        active.status = ActiveValue::Set(status.as_str().to_string());
        active.reviewed_by = ActiveValue::Set(Some(actor_id));
        active.reviewed_at = ActiveValue::Set(Some(now));
        active.updated_at = ActiveValue::Set(now);
        let model = active.update(&self.database).await?;

        tracing::info!(%actor_id, %expense_id, status = status.as_str(), "expense reviewed");
        Expense::try_from(model)
    }

    /// Delete any expense. Admin only.
    pub async fn admin_delete_expense(
        &self,
        actor_id: Uuid,
        expense_id: Uuid,
    ) -> ResultEngine<Expense> {
        self.require_admin(actor_id).await?;
        let model = expenses::Entity::find_by_id(expense_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| {
                EngineError::NotFoundOrUnauthorized(format!("expense {expense_id}"))
            })?;
        expenses::Entity::delete_by_id(expense_id)
            .exec(&self.database)
            .await?;
        Expense::try_from(model)
    }
}
