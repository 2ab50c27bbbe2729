//! Budget tracking engine.
//!
//! [`Engine`] owns the database handle and exposes every operation of the
//! service: balance maintenance on [`Budget`], expense and receipt records,
//! accounts and the admin views. Callers pass the id of the acting user, the
//! engine scopes every read and write to it.

pub use budgets::Budget;
pub use commands::{
    ExpenseDraft, ExpensePatch, ReceiptDraft, ReceiptPatch, RegisterCmd, UserAdminUpdate,
};
pub use contacts::Contact;
pub use error::EngineError;
pub use expenses::{Expense, ExpenseCategory, ExpenseStatus, ReviewDecision};
pub use money::MoneyCents;
pub use ops::{
    Activity, ActivityKind, CategoryTotal, DashboardStats, Engine, EngineBuilder, ReportRange,
    Totals,
};
pub use receipts::{RECEIPT_NAME_MAX_CHARS, Receipt};
pub use users::{AccountStatus, Role, User};

mod budgets;
mod commands;
mod contacts;
mod error;
mod expenses;
mod money;
mod ops;
mod receipts;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
