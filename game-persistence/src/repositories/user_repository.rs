use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, SqlErr,
};
use tracing::info;
use uuid::Uuid;

use crate::StoreError;
use crate::entities::{prelude::*, users};
use game_types::{GameError, User, UserId};

pub struct UserRepository {
    db: DatabaseConnection,
}

/// A user together with the password hash used to authenticate them.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub(crate) fn model_to_user(model: users::Model) -> User {
        User {
            id: model.id,
            username: model.username,
            is_admin: model.is_admin,
            created_at: model.created_at,
        }
    }

    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user_model = Users::find_by_id(id).one(&self.db).await?;
        Ok(user_model.map(Self::model_to_user))
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| GameError::user_not_found(id).into())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .find_credentials(username)
            .await?
            .map(|credentials| credentials.user))
    }

    pub async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, StoreError> {
        let user_model = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        Ok(user_model.map(|model| {
            let password_hash = model.password_hash.clone();
            StoredCredentials {
                user: Self::model_to_user(model),
                password_hash,
            }
        }))
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, StoreError> {
        if self.find_credentials(username).await?.is_some() {
            return Err(StoreError::UsernameTaken(username.to_string()));
        }

        let user_model = users::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            username: ActiveValue::Set(username.to_string()),
            password_hash: ActiveValue::Set(password_hash.to_string()),
            is_admin: ActiveValue::Set(is_admin),
            created_at: ActiveValue::Set(chrono::Utc::now()),
        };

        // The unique index still guards against a concurrent registration
        let created = user_model.insert(&self.db).await.map_err(|err| {
            match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    StoreError::UsernameTaken(username.to_string())
                }
                _ => StoreError::Database(err),
            }
        })?;

        info!(user_id = %created.id, username = %created.username, is_admin, "User created");
        Ok(Self::model_to_user(created))
    }

    pub async fn count_users(&self) -> Result<u64, StoreError> {
        Ok(Users::find().count(&self.db).await?)
    }

    /// Non-admin users, ordered by username.
    pub async fn list_players(&self) -> Result<Vec<User>, StoreError> {
        let users = Users::find()
            .filter(users::Column::IsAdmin.eq(false))
            .order_by_asc(users::Column::Username)
            .all(&self.db)
            .await?;

        Ok(users.into_iter().map(Self::model_to_user).collect())
    }
}
