//! MongoEventRepository against a real MongoDB container

use chrono::{Duration, Utc};
use domain_events::*;
use test_utils::TestMongo;
use uuid::Uuid;

fn event(title: &str, location: &str, days_ahead: i64, owner: Uuid) -> Event {
    Event::new(
        CreateEvent {
            title: title.to_string(),
            description: "Stored in mongo".to_string(),
            location: location.to_string(),
            date: Utc::now() + Duration::days(days_ahead),
        },
        owner,
    )
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_filtered_paginated_listing() {
    let mongo = TestMongo::new().await;
    let repo = MongoEventRepository::new(&mongo.database());
    repo.ensure_indexes().await.unwrap();
    let owner = Uuid::now_v7();

    for i in 0..6 {
        repo.create(event(&format!("Run {}", i), "Oslo", i + 1, owner))
            .await
            .unwrap();
    }
    repo.create(event("Swim (open water)", "Bergen", 2, owner))
        .await
        .unwrap();

    let oslo = EventFilter {
        location: Some("oslo".to_string()),
        ..Default::default()
    };
    assert_eq!(repo.count(&oslo).await.unwrap(), 6);

    let page = repo.list(&oslo, Pagination::new(Some(2), Some(4))).await.unwrap();
    let titles: Vec<_> = page.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Run 4", "Run 5"]);

    // Regex metacharacters in the search term are literal
    let search = EventFilter {
        search: Some("(open".to_string()),
        ..Default::default()
    };
    assert_eq!(repo.count(&search).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_status_update_and_delete() {
    let mongo = TestMongo::new().await;
    let repo = MongoEventRepository::new(&mongo.database());
    let owner = Uuid::now_v7();

    let mut stored = repo.create(event("Gala", "Rome", 5, owner)).await.unwrap();
    assert_eq!(repo.count(&EventFilter::pending()).await.unwrap(), 1);

    stored.status = EventStatus::Approved;
    repo.update(stored.clone()).await.unwrap();
    let fetched = repo.get_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, EventStatus::Approved);
    assert_eq!(repo.count(&EventFilter::pending()).await.unwrap(), 0);

    assert_eq!(repo.list_by_owner(owner).await.unwrap().len(), 1);

    assert!(repo.delete(stored.id).await.unwrap());
    assert!(!repo.delete(stored.id).await.unwrap());
    assert!(repo.get_by_id(stored.id).await.unwrap().is_none());
}
