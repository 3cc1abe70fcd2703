//! Tests for the admin write path
//! 管理写入路径测试

use std::sync::Arc;

use serde_json::{json, Value};

use super::drafts::{parse_symbols, EventDraft, StatisticDraft, TeamMemberDraft};
use super::writer::AdminWriter;
use crate::backend::memory::MEMORY_PUBLIC_BASE;
use crate::backend::{FileUpload, MemoryBackend};
use crate::constants::{buckets, tables};
use crate::content::testing::seeded_backend;
use crate::content::{ContentError, EventDay, MemberType, Resource, SiteDataStore, Vibe};
use crate::storage::StorageGateway;

fn writer_for(backend: &MemoryBackend) -> AdminWriter {
    AdminWriter::new(
        Arc::new(backend.clone()),
        StorageGateway::new(Arc::new(backend.clone())),
    )
}

fn heist_draft() -> EventDraft {
    EventDraft {
        title: "The Heist Protocol".to_string(),
        inspiration: "Money Heist".to_string(),
        description: "Crack the vault before the clock runs out.".to_string(),
        image: String::new(),
        color: "crimson".to_string(),
        symbols: parse_symbols("♠, ♦"),
        day: EventDay::Two,
        vibe: Vibe::Crime,
    }
}

fn row_by_id(backend: &MemoryBackend, table: &str, id: &str) -> Option<Value> {
    backend
        .rows(table)
        .into_iter()
        .find(|row| row["id"] == Value::String(id.to_string()))
}

fn poster_url(path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        MEMORY_PUBLIC_BASE,
        buckets::EVENT_POSTERS,
        path
    )
}

#[tokio::test]
async fn test_create_event_derives_slug_id() {
    let backend = MemoryBackend::new().with_table(tables::EVENTS, vec![]);
    let writer = writer_for(&backend);

    let id = writer.create_event(&heist_draft(), None).await.unwrap();
    assert_eq!(id, "the-heist-protocol");

    let row = row_by_id(&backend, tables::EVENTS, "the-heist-protocol").unwrap();
    assert_eq!(row["title"], "The Heist Protocol");
    assert_eq!(row["symbols"], json!(["♠", "♦"]));
    assert_eq!(row["day"], 2);
    assert_eq!(row["vibe"], "crime");
}

#[tokio::test]
async fn test_create_event_with_poster_uploads_first() {
    let backend = MemoryBackend::new().with_table(tables::EVENTS, vec![]);
    let writer = writer_for(&backend);

    writer
        .create_event(&heist_draft(), Some(&FileUpload::new("heist.jpg", vec![7; 8])))
        .await
        .unwrap();

    let paths = backend.object_paths(buckets::EVENT_POSTERS);
    assert_eq!(paths.len(), 1);
    let row = row_by_id(&backend, tables::EVENTS, "the-heist-protocol").unwrap();
    assert_eq!(row["image"], Value::String(poster_url(&paths[0])));
}

#[tokio::test]
async fn test_slug_collision_surfaces_write_error() {
    let backend = seeded_backend();
    let writer = writer_for(&backend);

    let err = writer.create_event(&heist_draft(), None).await.unwrap_err();
    assert_eq!(
        err,
        ContentError::Write(
            "duplicate key value violates unique constraint \"events_pkey\"".to_string()
        )
    );
    let heists = backend
        .rows(tables::EVENTS)
        .into_iter()
        .filter(|r| r["id"] == "the-heist-protocol")
        .count();
    assert_eq!(heists, 1);
}

#[tokio::test]
async fn test_update_without_poster_keeps_image_and_stamps_updated_at() {
    let backend = seeded_backend();
    let writer = writer_for(&backend);
    let before = row_by_id(&backend, tables::EVENTS, "dragon-trials").unwrap();

    let draft = EventDraft {
        title: "Dragon Trials".to_string(),
        inspiration: "How to Train Your Dragon".to_string(),
        description: "Four rounds now.".to_string(),
        image: before["image"].as_str().unwrap().to_string(),
        color: "emerald".to_string(),
        symbols: vec![],
        day: EventDay::One,
        vibe: Vibe::Fantasy,
    };
    writer.update_event("dragon-trials", &draft, None).await.unwrap();

    let after = row_by_id(&backend, tables::EVENTS, "dragon-trials").unwrap();
    assert_eq!(after["description"], "Four rounds now.");
    assert_eq!(after["image"], before["image"]);
    let stamp = after["updated_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    assert_eq!(backend.calls().uploads, 0);
}

#[tokio::test]
async fn test_update_with_poster_replaces_old_image() {
    let backend = seeded_backend();
    backend.put_object(buckets::EVENT_POSTERS, "old-heist.png", 5);
    let writer = writer_for(&backend);

    let draft = EventDraft {
        image: poster_url("old-heist.png"),
        ..heist_draft()
    };
    writer
        .update_event(
            "the-heist-protocol",
            &draft,
            Some(&FileUpload::new("new-heist.webp", vec![1; 4])),
        )
        .await
        .unwrap();

    let paths = backend.object_paths(buckets::EVENT_POSTERS);
    assert_eq!(paths.len(), 1);
    assert!(paths[0].ends_with(".webp"));
    let row = row_by_id(&backend, tables::EVENTS, "the-heist-protocol").unwrap();
    assert_eq!(row["image"], Value::String(poster_url(&paths[0])));
}

#[tokio::test]
async fn test_failed_upload_aborts_update() {
    let backend = seeded_backend();
    backend.put_object(buckets::EVENT_POSTERS, "old-heist.png", 5);
    backend.fail_bucket(buckets::EVENT_POSTERS, "payload too large");
    let writer = writer_for(&backend);
    let before = row_by_id(&backend, tables::EVENTS, "the-heist-protocol").unwrap();

    let draft = EventDraft {
        image: poster_url("old-heist.png"),
        ..heist_draft()
    };
    let err = writer
        .update_event(
            "the-heist-protocol",
            &draft,
            Some(&FileUpload::new("huge.png", vec![0; 64])),
        )
        .await
        .unwrap_err();

    assert_eq!(err, ContentError::Storage("payload too large".to_string()));
    assert_eq!(backend.calls().writes, 0);
    assert_eq!(backend.calls().removes, 0);
    assert_eq!(
        row_by_id(&backend, tables::EVENTS, "the-heist-protocol").unwrap(),
        before
    );
}

#[tokio::test]
async fn test_unparseable_old_image_does_not_block_update() {
    let backend = seeded_backend();
    let writer = writer_for(&backend);

    let draft = EventDraft {
        image: "https://cdn.example.com/legacy/heist.png".to_string(),
        ..heist_draft()
    };
    writer
        .update_event(
            "the-heist-protocol",
            &draft,
            Some(&FileUpload::new("heist.png", vec![1])),
        )
        .await
        .unwrap();

    assert_eq!(backend.calls().removes, 0);
    let row = row_by_id(&backend, tables::EVENTS, "the-heist-protocol").unwrap();
    assert!(row["image"]
        .as_str()
        .unwrap()
        .starts_with(&poster_url("")));
}

#[tokio::test]
async fn test_write_failure_leaves_cache_until_section_refetch() {
    let backend = seeded_backend();
    let store = SiteDataStore::new(Arc::new(backend.clone()));
    let writer = writer_for(&backend);
    let before = store.refetch().await.data.unwrap();

    backend.fail_table(tables::STATISTICS, "new row violates row-level security policy");
    let draft = StatisticDraft {
        label: "Workshops".to_string(),
        value: "6".to_string(),
        order: 5,
    };
    let err = writer.create(&draft).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "new row violates row-level security policy"
    );
    assert_eq!(store.data().unwrap(), before);

    backend.clear_failures();
    assert_eq!(writer.create(&draft).await.unwrap(), None);
    assert_eq!(store.data().unwrap().statistics.len(), 4);

    store.refetch_section(Resource::Statistics).await.unwrap();
    let stats = store.data().unwrap().statistics;
    assert_eq!(stats.len(), 5);
    assert_eq!(stats.last().unwrap().label, "Workshops");
}

#[tokio::test]
async fn test_team_member_crud() {
    let backend = seeded_backend();
    let writer = writer_for(&backend);

    let draft = TeamMemberDraft {
        name: "Neha Das".to_string(),
        role: "Design Lead".to_string(),
        phone: "9800000006".to_string(),
        member_type: MemberType::Student,
        order: 6,
    };
    writer.create(&draft).await.unwrap();
    let created = backend
        .rows(tables::TEAM_MEMBERS)
        .into_iter()
        .find(|r| r["name"] == "Neha Das")
        .unwrap();
    assert_eq!(created["type"], "student");
    let id = created["id"].as_str().unwrap().to_string();

    let promoted = TeamMemberDraft {
        role: "Festival Head".to_string(),
        ..draft
    };
    writer.update(&id, &promoted).await.unwrap();
    assert_eq!(
        row_by_id(&backend, tables::TEAM_MEMBERS, &id).unwrap()["role"],
        "Festival Head"
    );

    writer.delete(Resource::TeamMembers, &id).await.unwrap();
    assert!(row_by_id(&backend, tables::TEAM_MEMBERS, &id).is_none());
}

#[tokio::test]
async fn test_invalid_draft_is_rejected_before_writing() {
    let backend = seeded_backend();
    let writer = writer_for(&backend);

    let draft = EventDraft {
        title: "   ".to_string(),
        ..heist_draft()
    };
    let err = writer
        .create_event(&draft, Some(&FileUpload::new("a.png", vec![1])))
        .await
        .unwrap_err();
    assert_eq!(err, ContentError::InvalidInput("title is required".to_string()));
    assert_eq!(backend.calls().writes, 0);
    assert_eq!(backend.calls().uploads, 0);
}

#[tokio::test]
async fn test_gallery_featured_and_delete() {
    let backend = MemoryBackend::new().with_table(
        tables::GALLERY_IMAGES,
        vec![json!({
            "id": "g1",
            "image_url": poster_url("gallery-g1.jpg"),
            "order": 1,
            "is_featured": false
        })],
    );
    backend.put_object(buckets::EVENT_POSTERS, "gallery-g1.jpg", 9);
    let writer = writer_for(&backend);

    writer.set_gallery_featured("g1", true).await.unwrap();
    let row = row_by_id(&backend, tables::GALLERY_IMAGES, "g1").unwrap();
    assert_eq!(row["is_featured"], true);
    assert!(row.get("updated_at").is_some());

    writer
        .delete_gallery_image("g1", &poster_url("gallery-g1.jpg"))
        .await
        .unwrap();
    assert!(backend.rows(tables::GALLERY_IMAGES).is_empty());
    assert!(backend.object_paths(buckets::EVENT_POSTERS).is_empty());
}
