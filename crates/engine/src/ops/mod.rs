use sea_orm::{DatabaseConnection, DbErr, FromQueryResult, SqlErr};

use crate::{MoneyCents, ResultEngine};

mod access;
mod admin;
mod budgets;
mod contacts;
mod expenses;
mod receipts;
mod users;

pub use admin::{Activity, ActivityKind, CategoryTotal, DashboardStats, ReportRange};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Stateless service over the ledger store.
///
/// Built once at startup and shared by every request; it holds nothing but the
/// database handle.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Sum and count of a set of records, computed on every call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub total_amount: MoneyCents,
    pub total_count: u64,
}

#[derive(Debug, FromQueryResult)]
struct TotalsRow {
    total: Option<i64>,
    count: i64,
}

impl From<Option<TotalsRow>> for Totals {
    fn from(row: Option<TotalsRow>) -> Self {
        row.map(|row| Self {
            total_amount: MoneyCents::new(row.total.unwrap_or(0)),
            total_count: u64::try_from(row.count).unwrap_or(0),
        })
        .unwrap_or_default()
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
