//! End-to-end tests over the in-memory backend
//! 基于内存后端的端到端测试

mod common;

use std::sync::Arc;

use festival_site::admin::{AdminWriter, EventDraft, StatisticDraft};
use festival_site::auth::AuthGate;
use festival_site::backend::FileUpload;
use festival_site::constants::{buckets, tables, SITE_CONTENT_RPC};
use festival_site::content::{fetcher, AggregateStatus, EventDay, LoadSource, Vibe};
use festival_site::storage::{DocumentLibrary, StorageGateway};
use festival_site::{BackendHandles, ContentError, Resource, SiteDataStore};

#[tokio::test]
async fn test_backend_handles_from_memory_config() {
    let handles = BackendHandles::from_config(&common::memory_config()).unwrap();
    let store = SiteDataStore::new(handles.content);

    let snapshot = store.refetch().await;
    assert_eq!(snapshot.status, AggregateStatus::Ready);
    assert_eq!(snapshot.source, Some(LoadSource::Batched));
    let data = snapshot.data.unwrap();
    assert_eq!(data.events.len(), 3);
    assert_eq!(data.button_text("register"), "Register Now");
}

#[tokio::test]
async fn test_missing_fixture_is_config_error() {
    let mut config = common::memory_config();
    config.fixture = Some("does/not/exist.json".into());

    let err = BackendHandles::from_config(&config).unwrap_err();
    assert!(matches!(err, ContentError::Config(_)));
}

#[tokio::test]
async fn test_batched_and_fallback_agree() {
    let (backend, handles) = common::seeded_handles();
    let store = SiteDataStore::new(handles.content.clone());
    let batched = store.refetch().await.data.unwrap();

    backend.fail_rpc(SITE_CONTENT_RPC, "function timed out");
    let snapshot = store.refetch().await;
    assert_eq!(snapshot.source, Some(LoadSource::Parallel));
    assert_eq!(snapshot.data.unwrap(), batched);
}

#[tokio::test]
async fn test_fetchers_match_aggregate() {
    let (_, handles) = common::seeded_handles();
    let store = SiteDataStore::new(handles.content.clone());
    let data = store.refetch().await.data.unwrap();

    let events = fetcher::events(handles.content.clone()).refetch().await;
    assert_eq!(events.data.unwrap(), data.events);

    let team = fetcher::team_members(handles.content.clone());
    team.refetch().await;
    assert_eq!(team.staff(), data.staff_members);
    assert_eq!(team.students(), data.student_members);

    let preview = fetcher::gallery_preview(handles.content).refetch().await;
    let urls: Vec<String> = data.gallery_images.iter().map(|g| g.image_url.clone()).collect();
    assert_eq!(preview.data.unwrap(), urls);
}

#[tokio::test]
async fn test_admin_session_writes_and_refreshes() {
    let (backend, handles) = common::seeded_handles();
    let gate = AuthGate::new(handles.auth.clone(), handles.content.clone());
    let state = gate.sign_in("admin@fest.edu", "festival-admin").await.unwrap();
    assert!(state.is_admin);

    let store = SiteDataStore::new(handles.content.clone());
    store.refetch().await;

    let writer = AdminWriter::new(
        handles.content.clone(),
        StorageGateway::new(handles.storage.clone()),
    );
    let id = writer
        .create_event(
            &EventDraft {
                title: "Upside Down Quiz".to_string(),
                inspiration: "Stranger Things".to_string(),
                description: "Trivia from the other side.".to_string(),
                image: String::new(),
                color: "scarlet".to_string(),
                symbols: vec!["⚡".to_string()],
                day: EventDay::One,
                vibe: Vibe::Horror,
            },
            Some(&FileUpload::new("quiz.png", vec![1, 2, 3])),
        )
        .await
        .unwrap();
    assert_eq!(id, "upside-down-quiz");
    assert_eq!(backend.object_paths(buckets::EVENT_POSTERS).len(), 1);

    writer
        .create(&StatisticDraft {
            label: "Workshops".to_string(),
            value: "6".to_string(),
            order: 5,
        })
        .await
        .unwrap();

    // Cache is untouched until a section refetch / 在分区重新获取前缓存保持不变
    assert_eq!(store.data().unwrap().events.len(), 3);
    store.refetch_section(Resource::Events).await.unwrap();
    store.refetch_section_named("statistics").await.unwrap();

    let data = store.data().unwrap();
    assert_eq!(data.events.len(), 4);
    assert_eq!(data.statistics.len(), 5);
    let quiz = data.events.iter().find(|e| e.id == id).unwrap();
    assert!(quiz.image.contains(buckets::EVENT_POSTERS));
}

#[tokio::test]
async fn test_guest_cannot_sign_in() {
    let (backend, handles) = common::seeded_handles();
    let gate = AuthGate::new(handles.auth, handles.content);

    let err = gate.sign_in("guest@fest.edu", "guest-pass").await.unwrap_err();
    assert_eq!(err.to_string(), "Incorrect email or password");
    assert!(!gate.state().is_admin);
    assert_eq!(backend.rows(tables::ADMINS).len(), 1);
}

#[tokio::test]
async fn test_document_library_round_trip() {
    let (backend, handles) = common::seeded_handles();
    let library = DocumentLibrary::new(StorageGateway::new(handles.storage));

    assert!(library.refetch().await.data.unwrap().is_empty());

    let url = library
        .upload(&FileUpload::new("rules.pdf", b"%PDF".to_vec()))
        .await
        .unwrap();
    let docs = library.refetch().await.data.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].url, url);
    assert!(docs[0].name.ends_with(".pdf"));

    library.delete(&url).await.unwrap();
    assert!(backend.object_paths(buckets::ADMIN_DOCUMENTS).is_empty());
}
