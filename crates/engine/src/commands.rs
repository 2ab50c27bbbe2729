//! Command structs for engine operations.
//!
//! These types group parameters for write operations (registration, expense
//! and receipt creation/update), keeping call sites readable and avoiding long
//! argument lists.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{AccountStatus, ExpenseCategory, MoneyCents, Role};

/// Register a new account.
#[derive(Clone, Debug)]
pub struct RegisterCmd {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Create an expense.
#[derive(Clone, Debug)]
pub struct ExpenseDraft {
    pub name: String,
    pub amount: MoneyCents,
    pub category: Option<ExpenseCategory>,
    /// Defaults to the creation time.
    pub date: Option<DateTime<Utc>>,
}

impl ExpenseDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, amount: MoneyCents) -> Self {
        Self {
            name: name.into(),
            amount,
            category: None,
            date: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

/// Partial update of a pending expense. `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct ExpensePatch {
    pub name: Option<String>,
    pub amount: Option<MoneyCents>,
    pub category: Option<ExpenseCategory>,
    pub date: Option<DateTime<Utc>>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.amount.is_none() && self.category.is_none() && self.date.is_none()
    }
}

/// Create a receipt.
#[derive(Clone, Debug)]
pub struct ReceiptDraft {
    pub receipt_name: String,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub image_url: Option<String>,
}

/// Partial update of a receipt. `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct ReceiptPatch {
    pub receipt_name: Option<String>,
    pub amount: Option<MoneyCents>,
    pub date: Option<NaiveDate>,
    pub image_url: Option<String>,
}

/// Admin changes to an account.
#[derive(Clone, Debug, Default)]
pub struct UserAdminUpdate {
    pub username: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
}
