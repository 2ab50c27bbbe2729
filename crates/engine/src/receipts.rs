//! Receipt records.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// Longest accepted receipt name, in characters.
pub const RECEIPT_NAME_MAX_CHARS: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub receipt_name: String,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    /// Reference to the stored image, as handed back to clients.
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(
        user_id: Uuid,
        receipt_name: String,
        amount: MoneyCents,
        date: NaiveDate,
        image_url: Option<String>,
    ) -> ResultEngine<Self> {
        let amount = amount.require_positive("receipt amount")?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            receipt_name,
            amount,
            date,
            image_url,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub receipt_name: String,
    pub amount_minor: i64,
    pub date: Date,
    pub image_url: Option<String>,
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

impl From<&Receipt> for ActiveModel {
    fn from(value: &Receipt) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id),
            receipt_name: ActiveValue::Set(value.receipt_name.clone()),
            amount_minor: ActiveValue::Set(value.amount.cents()),
            date: ActiveValue::Set(value.date),
            image_url: ActiveValue::Set(value.image_url.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl From<Model> for Receipt {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            receipt_name: model.receipt_name,
            amount: MoneyCents::new(model.amount_minor),
            date: model.date,
            image_url: model.image_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Trims and bounds a receipt name.
pub(crate) fn normalize_receipt_name(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(
            "receipt name must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > RECEIPT_NAME_MAX_CHARS {
        return Err(EngineError::Validation(format!(
            "receipt name must be at most {RECEIPT_NAME_MAX_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_name_is_trimmed_and_bounded() {
        assert_eq!(normalize_receipt_name("  Groceries ").unwrap(), "Groceries");
        assert!(normalize_receipt_name("   ").is_err());
        assert!(normalize_receipt_name(&"x".repeat(100)).is_ok());
        assert!(normalize_receipt_name(&"x".repeat(101)).is_err());
    }
}
