//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use database::mongodb::{from_bson_datetime, is_duplicate_key_error, to_bson_datetime};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, doc},
    options::{FindOptions, IndexOptions},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{Role, User};
use crate::repository::UserRepository;

pub const USERS_COLLECTION: &str = "users";

/// Stored shape of a user. Ids are kept as strings and timestamps as BSON dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    email_verified: bool,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl From<&User> for UserDocument {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.to_string(),
            email_verified: user.email_verified,
            created_at: to_bson_datetime(user.created_at),
            updated_at: to_bson_datetime(user.updated_at),
        }
    }
}

impl TryFrom<UserDocument> for User {
    type Error = UserError;

    fn try_from(doc: UserDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&doc.id)
                .map_err(|e| UserError::Database(format!("Invalid user id '{}': {}", doc.id, e)))?,
            name: doc.name,
            email: doc.email,
            password_hash: doc.password_hash,
            role: doc.role.parse::<Role>().map_err(|_| {
                UserError::Database(format!("Invalid role '{}' for user {}", doc.role, doc.id))
            })?,
            email_verified: doc.email_verified,
            created_at: from_bson_datetime(doc.created_at),
            updated_at: from_bson_datetime(doc.updated_at),
        })
    }
}

pub struct MongoUserRepository {
    collection: Collection<UserDocument>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(USERS_COLLECTION),
        }
    }

    /// Unique index on `email`. Safe to call on every startup.
    pub async fn ensure_indexes(&self) -> UserResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("users_email_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(index).await?;
        Ok(())
    }

    fn map_write_error(err: mongodb::error::Error, email: &str) -> UserError {
        if is_duplicate_key_error(&err) {
            UserError::DuplicateEmail(email.to_string())
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create(&self, user: User) -> UserResult<User> {
        self.collection
            .insert_one(UserDocument::from(&user))
            .await
            .map_err(|e| Self::map_write_error(e, &user.email))?;

        tracing::info!(user_id = %user.id, email = %user.email, "Created user");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        self.collection
            .find_one(doc! { "_id": id.to_string() })
            .await?
            .map(User::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.collection
            .find_one(doc! { "email": email })
            .await?
            .map(User::try_from)
            .transpose()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_by_ids(&self, ids: &[Uuid]) -> UserResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let cursor = self.collection.find(doc! { "_id": { "$in": ids } }).await?;
        let docs: Vec<UserDocument> = cursor.try_collect().await?;

        docs.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn list(&self) -> UserResult<Vec<User>> {
        let options = FindOptions::builder()
            .sort(doc! { "name": 1, "_id": 1 })
            .build();

        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        let docs: Vec<UserDocument> = cursor.try_collect().await?;

        docs.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update(&self, user: User) -> UserResult<User> {
        let result = self
            .collection
            .replace_one(doc! { "_id": user.id.to_string() }, UserDocument::from(&user))
            .await
            .map_err(|e| Self::map_write_error(e, &user.email))?;

        if result.matched_count == 0 {
            return Err(UserError::NotFound(user.id));
        }

        tracing::info!(user_id = %user.id, "Updated user");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_round_trip() {
        let mut user = User::new("Ada".into(), "ada@example.com".into(), "hash".into());
        user.role = Role::Admin;

        let doc = UserDocument::from(&user);
        assert_eq!(doc.id, user.id.to_string());
        assert_eq!(doc.role, "admin");

        let back = User::try_from(doc).unwrap();
        assert_eq!(back.id, user.id);
        assert_eq!(back.role, Role::Admin);
        assert_eq!(back.created_at.timestamp_millis(), user.created_at.timestamp_millis());
    }

    #[test]
    fn test_corrupt_role_is_database_error() {
        let user = User::new("Ada".into(), "ada@example.com".into(), "hash".into());
        let mut doc = UserDocument::from(&user);
        doc.role = "superuser".to_string();

        assert!(matches!(User::try_from(doc), Err(UserError::Database(_))));
    }
}
