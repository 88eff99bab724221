use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use verso_core::model::Project;
use verso_core::{MockBackend, PoemStore, StoreError};

fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

fn seeded_backend(ids: &[&str]) -> MockBackend {
    let backend = MockBackend::new();
    for id in ids {
        backend.insert(Project {
            id: id.to_string(),
            title: format!("Poem {id}"),
            ..Default::default()
        });
    }
    backend
}

#[test]
fn list_mirrors_server_projects() {
    let runtime = test_runtime();
    let backend = seeded_backend(&["a", "b"]);
    let store = PoemStore::new(Arc::new(backend.clone()));

    let returned = runtime.block_on(store.load_projects()).expect("list");
    assert_eq!(store.projects(), returned);
    assert_eq!(store.projects_count(), 2);

    runtime
        .block_on(store.delete_projects(&["a".to_string()]))
        .expect("delete");
    backend.insert(Project {
        id: "c".into(),
        ..Default::default()
    });
    runtime.block_on(store.load_projects()).expect("list");
    let ids: Vec<String> = store.projects().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["b".to_string(), "c".to_string()]);
}

#[test]
fn full_poem_flow_over_mock_service() {
    let runtime = test_runtime();
    let store = PoemStore::new(Arc::new(MockBackend::new()));

    let project = runtime
        .block_on(store.create_project("Plum blossoms", "plum blossoms in snow"))
        .expect("create");
    let snapshot = store.snapshot();
    assert_eq!(snapshot.current_project.as_ref(), Some(&project));
    assert!(snapshot.conversation_state.is_empty());
    assert!(!snapshot.is_loading);

    let mut reply = runtime
        .block_on(store.send_conversation(None, None))
        .expect("first turn");
    while !reply.is_complete {
        reply = runtime
            .block_on(store.send_conversation(Some(json!({"id": null, "value": "more snow"})), None))
            .expect("next turn");
    }
    assert_eq!(reply.ready_for_blueprint, Some(true));

    let generated = runtime
        .block_on(store.generate_blueprint(None))
        .expect("blueprint");
    assert_eq!(generated.blueprint.title, "Plum blossoms");

    let mut blueprint = generated.blueprint.clone();
    blueprint.title = "Plum Blossoms in Snow".into();
    let saved = runtime
        .block_on(store.save_blueprint(&blueprint, None))
        .expect("save");
    assert_eq!(saved.title, "Plum Blossoms in Snow");
    assert_eq!(store.current_project(), Some(saved));

    let poems = runtime
        .block_on(store.generate_poem_content(None))
        .expect("generate");
    assert_eq!(poems.status, "success");
    assert_eq!(store.poem_versions().len(), poems.versions.len());

    runtime
        .block_on(store.delete_projects(&[project.id.clone()]))
        .expect("delete");
    let snapshot = store.snapshot();
    assert!(!snapshot.has_current_project());
    assert!(snapshot.conversation_state.is_empty());
    assert!(snapshot.poem_versions.is_empty());
}

#[test]
fn project_scoped_operations_need_a_project() {
    let runtime = test_runtime();
    let backend = MockBackend::new();
    let store = PoemStore::new(Arc::new(backend.clone()));

    let err = runtime
        .block_on(store.generate_poem_content(None))
        .unwrap_err();
    assert!(matches!(err, StoreError::NoCurrentProject));
    assert_eq!(backend.request_count(), 0);
    assert!(!store.is_loading());
    assert!(store.error().is_some());
}

#[test]
fn service_errors_are_stored_and_returned() {
    let runtime = test_runtime();
    let backend = seeded_backend(&["fresh"]);
    let store = PoemStore::new(Arc::new(backend));

    // No conversation yet, so the service refuses to draft a blueprint.
    let err = runtime
        .block_on(store.generate_blueprint(Some("fresh")))
        .unwrap_err();
    assert!(matches!(err, StoreError::Api { .. }));
    assert!(!store.is_loading());
    let message = store.error().expect("error message");
    assert!(message.contains("missing conversation history"));
    assert_eq!(
        store.current_project().map(|p| p.id).as_deref(),
        Some("fresh")
    );
}
