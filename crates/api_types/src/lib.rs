//! Request and response bodies of the HTTP API.
//!
//! Field names are camelCase on the wire. Money is a decimal number in major
//! units (`12.5` is 12.50). Request amounts are kept as raw JSON values so the
//! server can reject non-numeric input with a typed error instead of a generic
//! deserialization failure.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sum and count of a set of records.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_amount: f64,
    pub total_count: u64,
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Deposit {
        #[serde(default)]
        pub deposit_amount: Value,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Spend {
        #[serde(default)]
        pub expense_amount: Value,
    }

    /// Explicit overwrite of both budget inputs.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Correction {
        #[serde(default)]
        pub total_budget: Value,
        #[serde(default)]
        pub used_budget: Value,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Budget {
        pub id: Uuid,
        pub user_id: Uuid,
        pub total_budget: f64,
        pub used_budget: f64,
        pub remaining_budget: f64,
        pub utilization_percentage: u32,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseNew {
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub amount: Value,
        pub category: Option<String>,
        /// RFC 3339 timestamp or `YYYY-MM-DD`. Defaults to now.
        pub date: Option<String>,
    }

    /// Partial update, absent fields are kept.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseUpdate {
        pub name: Option<String>,
        pub amount: Option<Value>,
        pub category: Option<String>,
        pub date: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Expense {
        pub id: Uuid,
        pub user_id: Uuid,
        pub name: String,
        pub amount: f64,
        pub category: String,
        pub date: DateTime<Utc>,
        pub status: String,
        pub reviewed_by: Option<Uuid>,
        pub reviewed_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Cleared {
        pub deleted_count: u64,
    }
}

pub mod receipt {
    use super::*;

    /// Receipts are created and updated through multipart forms; this is the
    /// response shape only.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Receipt {
        pub id: Uuid,
        pub user_id: Uuid,
        pub receipt_name: String,
        pub amount: f64,
        pub date: NaiveDate,
        pub image_url: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        #[serde(default)]
        pub username: String,
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        #[serde(default)]
        pub username: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct User {
        pub id: Uuid,
        pub username: String,
        pub email: String,
        pub role: String,
        pub status: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub token: String,
        pub user: User,
    }
}

pub mod admin {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DashboardStats {
        pub total_users: u64,
        pub total_budgets: u64,
        pub total_expenses: u64,
        pub total_receipts: u64,
        pub total_expense_amount: f64,
        pub pending_approvals: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Activity {
        #[serde(rename = "type")]
        pub kind: String,
        pub message: String,
        pub time: DateTime<Utc>,
        pub status: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReportQuery {
        /// `today`, `thisWeek`, `thisMonth` or `all` (default).
        pub range: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryReport {
        pub category: String,
        pub total_amount: f64,
        pub count: u64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub username: Option<String>,
        pub role: Option<String>,
        pub status: Option<String>,
    }
}

pub mod contact {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContactNew {
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub message: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Contact {
        pub id: Uuid,
        pub name: String,
        pub email: String,
        pub message: String,
        pub created_at: DateTime<Utc>,
    }
}
