//! Engine values to wire shapes.

use api_types::{
    Totals,
    admin::{Activity, CategoryReport, DashboardStats},
    budget::Budget,
    contact::Contact,
    expense::Expense,
    receipt::Receipt,
    user::User,
};
use engine::ActivityKind;

pub fn budget(value: &engine::Budget) -> Budget {
    Budget {
        id: value.id,
        user_id: value.user_id,
        total_budget: value.total_budget.as_major(),
        used_budget: value.used_budget.as_major(),
        remaining_budget: value.remaining_budget.as_major(),
        utilization_percentage: value.utilization_percentage(),
        created_at: value.created_at,
        updated_at: value.updated_at,
    }
}

pub fn expense(value: engine::Expense) -> Expense {
    Expense {
        id: value.id,
        user_id: value.user_id,
        name: value.name,
        amount: value.amount.as_major(),
        category: value.category.as_str().to_string(),
        date: value.date,
        status: value.status.as_str().to_string(),
        reviewed_by: value.reviewed_by,
        reviewed_at: value.reviewed_at,
        created_at: value.created_at,
        updated_at: value.updated_at,
    }
}

pub fn receipt(value: engine::Receipt) -> Receipt {
    Receipt {
        id: value.id,
        user_id: value.user_id,
        receipt_name: value.receipt_name,
        amount: value.amount.as_major(),
        date: value.date,
        image_url: value.image_url,
        created_at: value.created_at,
        updated_at: value.updated_at,
    }
}

pub fn user(value: engine::User) -> User {
    User {
        id: value.id,
        username: value.username,
        email: value.email,
        role: value.role.as_str().to_string(),
        status: value.status.as_str().to_string(),
        created_at: value.created_at,
    }
}

pub fn totals(value: engine::Totals) -> Totals {
    Totals {
        total_amount: value.total_amount.as_major(),
        total_count: value.total_count,
    }
}

pub fn contact(value: engine::Contact) -> Contact {
    Contact {
        id: value.id,
        name: value.name,
        email: value.email,
        message: value.message,
        created_at: value.created_at,
    }
}

pub fn stats(value: engine::DashboardStats) -> DashboardStats {
    DashboardStats {
        total_users: value.total_users,
        total_budgets: value.total_budgets,
        total_expenses: value.total_expenses,
        total_receipts: value.total_receipts,
        total_expense_amount: value.total_expense_amount.as_major(),
        pending_approvals: value.pending_approvals,
    }
}

pub fn activity(value: engine::Activity) -> Activity {
    Activity {
        kind: match value.kind {
            ActivityKind::User => "user",
            ActivityKind::Expense => "expense",
        }
        .to_string(),
        message: value.message,
        time: value.time,
        status: value.status,
    }
}

pub fn category_report(value: engine::CategoryTotal) -> CategoryReport {
    CategoryReport {
        category: value.category.as_str().to_string(),
        total_amount: value.total_amount.as_major(),
        count: value.count,
    }
}
