use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, User, expenses, receipts, users};

use super::Engine;

/// Generates an owner-scoped lookup for an entity.
///
/// The record is searched by id **and** owner, so a record owned by someone
/// else is indistinguishable from a missing one.
macro_rules! impl_owned_lookup {
    ($fn_name:ident, $entity:path, $model:path, $owner_col:expr, $label:literal) => {
        pub(super) async fn $fn_name<C: ConnectionTrait>(
            &self,
            db: &C,
            user_id: Uuid,
            record_id: Uuid,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(record_id)
                .filter($owner_col.eq(user_id))
                .one(db)
                .await?
                .ok_or_else(|| EngineError::NotFoundOrUnauthorized(format!("{} {record_id}", $label)))
        }
    };
}

impl Engine {
    impl_owned_lookup!(
        owned_expense,
        expenses::Entity,
        expenses::Model,
        expenses::Column::UserId,
        "expense"
    );

    impl_owned_lookup!(
        owned_receipt,
        receipts::Entity,
        receipts::Model,
        receipts::Column::UserId,
        "receipt"
    );

    pub(super) async fn find_user_model<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFoundOrUnauthorized(format!("user {user_id}")))
    }

    /// Resolve `actor_id` and make sure it is an active admin.
    pub(super) async fn require_admin(&self, actor_id: Uuid) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(actor_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::Forbidden("admin role required".to_string()))?;
        let user = User::try_from(model)?;
        if !user.is_admin() || !user.is_active() {
            tracing::warn!(%actor_id, "admin operation refused");
            return Err(EngineError::Forbidden("admin role required".to_string()));
        }
        Ok(user)
    }
}
