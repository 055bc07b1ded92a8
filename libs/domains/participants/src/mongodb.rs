//! MongoDB implementation of ParticipantRepository

use async_trait::async_trait;
use database::mongodb::{from_bson_datetime, is_duplicate_key_error, to_bson_datetime};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Document, doc},
    options::{FindOptions, IndexOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ParticipantError, ParticipantResult};
use crate::models::{InvitationStatus, Participant};
use crate::repository::ParticipantRepository;

pub const PARTICIPANTS_COLLECTION: &str = "participants";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ParticipantDocument {
    #[serde(rename = "_id")]
    id: String,
    event_id: String,
    user_id: String,
    invitation_status: String,
    joined_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl From<&Participant> for ParticipantDocument {
    fn from(participant: &Participant) -> Self {
        Self {
            id: participant.id.to_string(),
            event_id: participant.event_id.to_string(),
            user_id: participant.user_id.to_string(),
            invitation_status: participant.invitation_status.to_string(),
            joined_at: to_bson_datetime(participant.joined_at),
            updated_at: to_bson_datetime(participant.updated_at),
        }
    }
}

impl TryFrom<ParticipantDocument> for Participant {
    type Error = ParticipantError;

    fn try_from(doc: ParticipantDocument) -> Result<Self, Self::Error> {
        let parse_id = |value: &str| {
            Uuid::parse_str(value)
                .map_err(|e| ParticipantError::Database(format!("Invalid id '{}': {}", value, e)))
        };

        Ok(Self {
            id: parse_id(&doc.id)?,
            event_id: parse_id(&doc.event_id)?,
            user_id: parse_id(&doc.user_id)?,
            invitation_status: doc.invitation_status.parse::<InvitationStatus>().map_err(
                |_| {
                    ParticipantError::Database(format!(
                        "Invalid invitation status '{}' for participant {}",
                        doc.invitation_status, doc.id
                    ))
                },
            )?,
            joined_at: from_bson_datetime(doc.joined_at),
            updated_at: from_bson_datetime(doc.updated_at),
        })
    }
}

#[derive(Clone)]
pub struct MongoParticipantRepository {
    collection: Collection<ParticipantDocument>,
}

impl MongoParticipantRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(PARTICIPANTS_COLLECTION),
        }
    }

    /// Composite unique index on (event_id, user_id), plus the per-user lookup
    pub async fn ensure_indexes(&self) -> ParticipantResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "event_id": 1, "user_id": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("participants_event_user_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "invitation_status": 1 })
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        Ok(())
    }

    async fn find_sorted(&self, filter: Document) -> ParticipantResult<Vec<Participant>> {
        let options = FindOptions::builder()
            .sort(doc! { "joined_at": 1, "_id": 1 })
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        let docs: Vec<ParticipantDocument> = cursor.try_collect().await?;
        docs.into_iter().map(Participant::try_from).collect()
    }
}

#[async_trait]
impl ParticipantRepository for MongoParticipantRepository {
    #[instrument(skip(self, participant), fields(participant_id = %participant.id))]
    async fn create(&self, participant: Participant) -> ParticipantResult<Participant> {
        self.collection
            .insert_one(ParticipantDocument::from(&participant))
            .await
            .map_err(|e| {
                if is_duplicate_key_error(&e) {
                    ParticipantError::Duplicate
                } else {
                    e.into()
                }
            })?;

        tracing::info!(
            event_id = %participant.event_id,
            user_id = %participant.user_id,
            status = %participant.invitation_status,
            "Participant created"
        );
        Ok(participant)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ParticipantResult<Option<Participant>> {
        self.collection
            .find_one(doc! { "_id": id.to_string() })
            .await?
            .map(Participant::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find(&self, event_id: Uuid, user_id: Uuid) -> ParticipantResult<Option<Participant>> {
        self.collection
            .find_one(doc! { "event_id": event_id.to_string(), "user_id": user_id.to_string() })
            .await?
            .map(Participant::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_by_event(&self, event_id: Uuid) -> ParticipantResult<Vec<Participant>> {
        self.find_sorted(doc! { "event_id": event_id.to_string() })
            .await
    }

    #[instrument(skip(self))]
    async fn list_by_user(
        &self,
        user_id: Uuid,
        status: Option<InvitationStatus>,
    ) -> ParticipantResult<Vec<Participant>> {
        let mut filter = doc! { "user_id": user_id.to_string() };
        if let Some(status) = status {
            filter.insert("invitation_status", status.to_string());
        }
        self.find_sorted(filter).await
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        id: Uuid,
        status: InvitationStatus,
    ) -> ParticipantResult<Participant> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! {
                    "_id": id.to_string(),
                    "invitation_status": InvitationStatus::Pending.to_string(),
                },
                doc! { "$set": {
                    "invitation_status": status.to_string(),
                    "updated_at": to_bson_datetime(chrono::Utc::now()),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        let Some(updated) = updated else {
            // Either gone or decided by a concurrent request
            return Err(match self.get_by_id(id).await? {
                Some(current) => ParticipantError::not_pending(current.invitation_status),
                None => ParticipantError::InvitationNotFound,
            });
        };

        tracing::info!(participant_id = %id, status = %status, "Invitation status updated");
        Participant::try_from(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> ParticipantResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() })
            .await?;

        if result.deleted_count > 0 {
            tracing::info!(participant_id = %id, "Participant deleted");
        }
        Ok(result.deleted_count > 0)
    }
}
