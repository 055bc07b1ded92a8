//! MongoDB implementation of EventRepository

use async_trait::async_trait;
use database::mongodb::{from_bson_datetime, to_bson_datetime};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Document, doc},
    options::FindOptions,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{EventError, EventResult};
use crate::models::{Event, EventFilter, EventStatus, Pagination};
use crate::repository::EventRepository;

pub const EVENTS_COLLECTION: &str = "events";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventDocument {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    description: String,
    location: String,
    date: bson::DateTime,
    created_by: String,
    status: String,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl From<&Event> for EventDocument {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.to_string(),
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            date: to_bson_datetime(event.date),
            created_by: event.created_by.to_string(),
            status: event.status.to_string(),
            created_at: to_bson_datetime(event.created_at),
            updated_at: to_bson_datetime(event.updated_at),
        }
    }
}

impl TryFrom<EventDocument> for Event {
    type Error = EventError;

    fn try_from(doc: EventDocument) -> Result<Self, Self::Error> {
        let parse_id = |value: &str| {
            Uuid::parse_str(value)
                .map_err(|e| EventError::Database(format!("Invalid id '{}': {}", value, e)))
        };

        Ok(Self {
            id: parse_id(&doc.id)?,
            created_by: parse_id(&doc.created_by)?,
            status: doc.status.parse::<EventStatus>().map_err(|_| {
                EventError::Database(format!("Invalid status '{}' for event {}", doc.status, doc.id))
            })?,
            title: doc.title,
            description: doc.description,
            location: doc.location,
            date: from_bson_datetime(doc.date),
            created_at: from_bson_datetime(doc.created_at),
            updated_at: from_bson_datetime(doc.updated_at),
        })
    }
}

#[derive(Clone)]
pub struct MongoEventRepository {
    collection: Collection<EventDocument>,
}

impl MongoEventRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(EVENTS_COLLECTION),
        }
    }

    /// Indexes backing the list sort and the status/owner filters
    pub async fn ensure_indexes(&self) -> EventResult<()> {
        let indexes = vec![
            IndexModel::builder().keys(doc! { "date": 1, "_id": 1 }).build(),
            IndexModel::builder()
                .keys(doc! { "status": 1, "date": 1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "created_by": 1, "date": 1 })
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        Ok(())
    }

    /// Build a MongoDB filter document from EventFilter
    fn build_filter(filter: &EventFilter) -> Document {
        let mut doc = doc! {};

        if let Some(search) = &filter.search {
            let pattern = regex::escape(search);
            doc.insert(
                "$or",
                vec![
                    doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                    doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
                ],
            );
        }

        if let Some(location) = &filter.location {
            doc.insert(
                "location",
                doc! { "$regex": regex::escape(location), "$options": "i" },
            );
        }

        if let Some(status) = filter.status {
            doc.insert("status", status.to_string());
        }

        let mut date = doc! {};
        if let Some(start) = filter.start_date {
            date.insert("$gte", to_bson_datetime(start));
        }
        if let Some(end) = filter.end_date {
            date.insert("$lte", to_bson_datetime(end));
        }
        if !date.is_empty() {
            doc.insert("date", date);
        }

        if let Some(owner) = filter.created_by {
            doc.insert("created_by", owner.to_string());
        }

        doc
    }

    async fn collect(cursor: mongodb::Cursor<EventDocument>) -> EventResult<Vec<Event>> {
        let docs: Vec<EventDocument> = cursor.try_collect().await?;
        docs.into_iter().map(Event::try_from).collect()
    }
}

#[async_trait]
impl EventRepository for MongoEventRepository {
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn create(&self, event: Event) -> EventResult<Event> {
        self.collection.insert_one(EventDocument::from(&event)).await?;

        tracing::info!(event_id = %event.id, "Event created successfully");
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> EventResult<Option<Event>> {
        self.collection
            .find_one(doc! { "_id": id.to_string() })
            .await?
            .map(Event::try_from)
            .transpose()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_by_ids(&self, ids: &[Uuid]) -> EventResult<Vec<Event>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let cursor = self.collection.find(doc! { "_id": { "$in": ids } }).await?;
        Self::collect(cursor).await
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &EventFilter, pagination: Pagination) -> EventResult<Vec<Event>> {
        let options = FindOptions::builder()
            .sort(doc! { "date": 1, "_id": 1 })
            .skip(pagination.skip())
            .limit(pagination.limit as i64)
            .build();

        let cursor = self
            .collection
            .find(Self::build_filter(filter))
            .with_options(options)
            .await?;
        Self::collect(cursor).await
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: &EventFilter) -> EventResult<u64> {
        let count = self
            .collection
            .count_documents(Self::build_filter(filter))
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner: Uuid) -> EventResult<Vec<Event>> {
        let options = FindOptions::builder()
            .sort(doc! { "date": 1, "_id": 1 })
            .build();

        let cursor = self
            .collection
            .find(Self::build_filter(&EventFilter::owned_by(owner)))
            .with_options(options)
            .await?;
        Self::collect(cursor).await
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    async fn update(&self, event: Event) -> EventResult<Event> {
        let result = self
            .collection
            .replace_one(doc! { "_id": event.id.to_string() }, EventDocument::from(&event))
            .await?;

        if result.matched_count == 0 {
            return Err(EventError::NotFound(event.id));
        }

        tracing::info!(event_id = %event.id, "Event updated successfully");
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> EventResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() })
            .await?;

        if result.deleted_count > 0 {
            tracing::info!(event_id = %id, "Event deleted successfully");
        }
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_build_filter_empty() {
        let doc = MongoEventRepository::build_filter(&EventFilter::default());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_build_filter_escapes_search() {
        let filter = EventFilter {
            search: Some("c++ (advanced)".to_string()),
            ..Default::default()
        };
        let doc = MongoEventRepository::build_filter(&filter);

        let clauses = doc.get_array("$or").unwrap();
        let title = clauses[0].as_document().unwrap().get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r"c\+\+ \(advanced\)");
        assert_eq!(title.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_build_filter_date_range_and_status() {
        let now = Utc::now();
        let filter = EventFilter {
            status: Some(EventStatus::Approved),
            start_date: Some(now),
            end_date: Some(now),
            ..Default::default()
        };
        let doc = MongoEventRepository::build_filter(&filter);

        assert_eq!(doc.get_str("status").unwrap(), "approved");
        let date = doc.get_document("date").unwrap();
        assert!(date.contains_key("$gte"));
        assert!(date.contains_key("$lte"));
    }

    #[test]
    fn test_build_filter_owner() {
        let owner = Uuid::now_v7();
        let doc = MongoEventRepository::build_filter(&EventFilter::owned_by(owner));
        assert_eq!(doc.get_str("created_by").unwrap(), owner.to_string());
    }
}
