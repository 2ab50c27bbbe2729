use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    AccountStatus, EngineError, RegisterCmd, ResultEngine, Role, User, UserAdminUpdate, budgets,
    expenses, receipts, users,
    util::{hash_password, normalize_email, normalize_username, verify_password},
};

use super::{Engine, is_unique_violation, with_tx};

impl Engine {
    /// Create an account with the `user` role.
    pub async fn register(&self, cmd: RegisterCmd) -> ResultEngine<User> {
        let username = normalize_username(&cmd.username)?;
        let email = normalize_email(&cmd.email)?;
        let password_hash = hash_password(&cmd.password)?;

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(email));
        }

        let model = users::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            username: ActiveValue::Set(username),
            email: ActiveValue::Set(email.clone()),
            password_hash: ActiveValue::Set(password_hash),
            role: ActiveValue::Set(Role::User.as_str().to_string()),
            status: ActiveValue::Set(AccountStatus::Active.as_str().to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        };
        let model = match model.insert(&self.database).await {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => return Err(EngineError::ExistingKey(email)),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(user_id = %model.id, "user registered");
        User::try_from(model)
    }

    /// Check credentials and return the account.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<User> {
        let email = email.trim().to_lowercase();
        let Some(model) = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.database)
            .await?
        else {
            tracing::debug!("login with unknown email");
            return Err(EngineError::InvalidCredentials);
        };
        if !verify_password(password, &model.password_hash) {
            tracing::debug!(user_id = %model.id, "login with wrong password");
            return Err(EngineError::InvalidCredentials);
        }

        let user = User::try_from(model)?;
        if !user.is_active() {
            return Err(EngineError::Forbidden("account is inactive".to_string()));
        }
        Ok(user)
    }

    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        let model = self.find_user_model(&self.database, user_id).await?;
        User::try_from(model)
    }

    /// Change the username of `user_id`.
    pub async fn update_profile(&self, user_id: Uuid, username: &str) -> ResultEngine<User> {
        let username = normalize_username(username)?;
        let model = self.find_user_model(&self.database, user_id).await?;
        let mut active: users::ActiveModel = model.into();
        active.username = ActiveValue::Set(username);
        let model = active.update(&self.database).await?;
        User::try_from(model)
    }

    /// Remove the account of `user_id` with everything it owns.
    ///
    /// Returns the image references of the removed receipts so the caller can
    /// drop the stored files.
    pub async fn delete_account(&self, user_id: Uuid) -> ResultEngine<Vec<String>> {
        with_tx!(self, |db_tx| {
            self.find_user_model(&db_tx, user_id).await?;
            let images = delete_owned_records(&db_tx, user_id).await?;
            users::Entity::delete_by_id(user_id).exec(&db_tx).await?;
            tracing::info!(%user_id, "account deleted");
            Ok(images)
        })
    }

    /// Every account, newest first. Admin only.
    pub async fn list_users(&self, actor_id: Uuid) -> ResultEngine<Vec<User>> {
        self.require_admin(actor_id).await?;
        users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    /// Change username, role or status of an account. Admin only.
    pub async fn admin_update_user(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        update: UserAdminUpdate,
    ) -> ResultEngine<User> {
        self.require_admin(actor_id).await?;
        let model = self.find_user_model(&self.database, user_id).await?;
        let mut active: users::ActiveModel = model.into();
        if let Some(username) = update.username.as_deref() {
            active.username = ActiveValue::Set(normalize_username(username)?);
        }
        if let Some(role) = update.role {
            active.role = ActiveValue::Set(role.as_str().to_string());
        }
        if let Some(status) = update.status {
            active.status = ActiveValue::Set(status.as_str().to_string());
        }
        let model = active.update(&self.database).await?;
        tracing::info!(%actor_id, %user_id, "user updated by admin");
        User::try_from(model)
    }

    /// Flip an account between active and inactive. Admin only.
    pub async fn toggle_user_status(&self, actor_id: Uuid, user_id: Uuid) -> ResultEngine<User> {
        self.require_admin(actor_id).await?;
        let model = self.find_user_model(&self.database, user_id).await?;
        let status = AccountStatus::try_from(model.status.as_str())?.toggled();
        let mut active: users::ActiveModel = model.into();
        active.status = ActiveValue::Set(status.as_str().to_string());
        let model = active.update(&self.database).await?;
        tracing::info!(%actor_id, %user_id, status = status.as_str(), "user status toggled");
        User::try_from(model)
    }

    /// Remove any account with everything it owns. Admin only.
    pub async fn admin_delete_user(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Vec<String>> {
        self.require_admin(actor_id).await?;
        if actor_id == user_id {
            return Err(EngineError::Validation(
                "admins cannot delete their own account here".to_string(),
            ));
        }
        self.delete_account(user_id).await
    }

    /// Set the role of the account registered with `email`.
    ///
    /// Meant for operator tooling, it performs no actor check.
    pub async fn assign_role(&self, email: &str, role: Role) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFoundOrUnauthorized(format!("user {email}")))?;
        let mut active: users::ActiveModel = model.into();
        active.role = ActiveValue::Set(role.as_str().to_string());
        let model = active.update(&self.database).await?;
        tracing::info!(user_id = %model.id, role = role.as_str(), "role assigned");
        User::try_from(model)
    }
}

async fn delete_owned_records<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> ResultEngine<Vec<String>> {
    let images: Vec<Option<String>> = receipts::Entity::find()
        .select_only()
        .column(receipts::Column::ImageUrl)
        .filter(receipts::Column::UserId.eq(user_id))
        .into_tuple()
        .all(db)
        .await?;

    receipts::Entity::delete_many()
        .filter(receipts::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    expenses::Entity::delete_many()
        .filter(expenses::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    budgets::Entity::delete_many()
        .filter(budgets::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    Ok(images.into_iter().flatten().collect())
}
