use chrono::Utc;
use sea_orm::{ActiveValue, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Contact, ResultEngine, contacts,
    util::{normalize_email, normalize_required},
};

use super::Engine;

impl Engine {
    /// Store a message from the public contact form.
    pub async fn submit_contact(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> ResultEngine<Contact> {
        let model = contacts::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(normalize_required(name, "name")?),
            email: ActiveValue::Set(normalize_email(email)?),
            message: ActiveValue::Set(normalize_required(message, "message")?),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(contact_id = %model.id, "contact message stored");
        Ok(Contact::from(model))
    }

    /// Contact messages, newest first. Admin only.
    pub async fn list_contacts(&self, actor_id: Uuid) -> ResultEngine<Vec<Contact>> {
        self.require_admin(actor_id).await?;
        Ok(contacts::Entity::find()
            .order_by_desc(contacts::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Contact::from)
            .collect())
    }
}
