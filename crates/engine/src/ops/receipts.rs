use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, Receipt, ReceiptDraft, ReceiptPatch, ResultEngine, receipts,
    receipts::normalize_receipt_name,
};

use super::{Engine, Totals, TotalsRow};

impl Engine {
    /// Store a receipt for `user_id`.
    pub async fn create_receipt(&self, user_id: Uuid, draft: ReceiptDraft) -> ResultEngine<Receipt> {
        let name = normalize_receipt_name(&draft.receipt_name)?;
        let receipt = Receipt::new(user_id, name, draft.amount, draft.date, draft.image_url)?;
        receipts::ActiveModel::from(&receipt)
            .insert(&self.database)
            .await?;
        Ok(receipt)
    }

    /// Receipts of `user_id`, newest first.
    pub async fn list_receipts(&self, user_id: Uuid) -> ResultEngine<Vec<Receipt>> {
        Ok(receipts::Entity::find()
            .filter(receipts::Column::UserId.eq(user_id))
            .order_by_desc(receipts::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Receipt::from)
            .collect())
    }

    pub async fn receipt(&self, user_id: Uuid, receipt_id: Uuid) -> ResultEngine<Receipt> {
        self.owned_receipt(&self.database, user_id, receipt_id)
            .await
            .map(Receipt::from)
    }

    /// Partially update a receipt of `user_id`.
    pub async fn update_receipt(
        &self,
        user_id: Uuid,
        receipt_id: Uuid,
        patch: ReceiptPatch,
    ) -> ResultEngine<Receipt> {
        let mut receipt = self.receipt(user_id, receipt_id).await?;

        if let Some(name) = patch.receipt_name.as_deref() {
            receipt.receipt_name = normalize_receipt_name(name)?;
        }
        if let Some(amount) = patch.amount {
            receipt.amount = amount.require_positive("receipt amount")?;
        }
        if let Some(date) = patch.date {
            receipt.date = date;
        }
        if let Some(image_url) = patch.image_url {
            receipt.image_url = Some(image_url);
        }
        receipt.updated_at = Utc::now();

        let result = receipts::Entity::update_many()
            .col_expr(
                receipts::Column::ReceiptName,
                Expr::value(receipt.receipt_name.clone()),
            )
            .col_expr(
                receipts::Column::AmountMinor,
                Expr::value(receipt.amount.cents()),
            )
            .col_expr(receipts::Column::Date, Expr::value(receipt.date))
            .col_expr(
                receipts::Column::ImageUrl,
                Expr::value(receipt.image_url.clone()),
            )
            .col_expr(receipts::Column::UpdatedAt, Expr::value(receipt.updated_at))
            .filter(receipts::Column::Id.eq(receipt_id))
            .filter(receipts::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFoundOrUnauthorized(format!(
                "receipt {receipt_id} not found"
            )));
        }

        Ok(receipt)
    }

    /// Delete one receipt of `user_id`, returning it.
    pub async fn delete_receipt(&self, user_id: Uuid, receipt_id: Uuid) -> ResultEngine<Receipt> {
        let receipt = self.receipt(user_id, receipt_id).await?;
        receipts::Entity::delete_many()
            .filter(receipts::Column::Id.eq(receipt_id))
            .filter(receipts::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        Ok(receipt)
    }

    /// Sum and count of the receipts of `user_id`.
    pub async fn receipt_totals(&self, user_id: Uuid) -> ResultEngine<Totals> {
        let row = receipts::Entity::find()
            .select_only()
            .column_as(Expr::col(receipts::Column::AmountMinor).sum(), "total")
            .column_as(Expr::col(receipts::Column::Id).count(), "count")
            .filter(receipts::Column::UserId.eq(user_id))
            .group_by(receipts::Column::UserId)
            .into_model::<TotalsRow>()
            .one(&self.database)
            .await?;
        Ok(Totals::from(row))
    }
}
