use std::sync::Arc;
use tempfile::TempDir;
use verso::config::{load_cli_state, CliState, Scope};
use verso::VersoApp;
use verso_core::{MockBackend, PoemStore};

fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

fn build_app(backend: &MockBackend, dir: &TempDir, cli_state: CliState) -> VersoApp {
    let store = PoemStore::new(Arc::new(backend.clone()));
    VersoApp::new(store, Scope::Directory(dir.path().to_path_buf()), cli_state)
}

fn output(buffer: Vec<u8>) -> String {
    String::from_utf8(buffer).expect("utf8 output")
}

#[test]
fn create_then_list_remembers_project() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let backend = MockBackend::new();
    let mut app = build_app(&backend, &dir, CliState::default());

    let mut out = Vec::new();
    runtime
        .block_on(app.create("Spring river", "a river in spring", &mut out))
        .expect("create");
    runtime.block_on(app.list(&mut out)).expect("list");
    let text = output(out);
    assert!(text.contains("Created Spring river [poem-1]"));
    assert!(text.contains("poem-1  Spring river"));

    let scope = Scope::Directory(dir.path().to_path_buf());
    let saved = runtime.block_on(load_cli_state(&scope)).expect("state");
    assert_eq!(saved.last_project.as_deref(), Some("poem-1"));
}

#[test]
fn later_run_falls_back_to_last_project() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let backend = MockBackend::new();

    let mut first = build_app(&backend, &dir, CliState::default());
    runtime
        .block_on(first.create("Night rain", "", &mut Vec::new()))
        .expect("create");

    // A fresh store has no current project; the remembered id fills in.
    let state = first.cli_state().clone();
    let mut second = build_app(&backend, &dir, state);
    let mut out = Vec::new();
    runtime
        .block_on(second.converse(None, "1\n/quit\n".as_bytes(), &mut out))
        .expect("converse");
    let text = output(out);
    assert!(text.contains("[1] Regulated verse"));
    assert!(text.contains("turn 2"));
    assert_eq!(
        second.store().current_project().map(|p| p.id).as_deref(),
        Some("poem-1")
    );
}

#[test]
fn converse_stops_when_concept_is_complete() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let backend = MockBackend::new();
    let mut app = build_app(&backend, &dir, CliState::default());
    runtime
        .block_on(app.create("Frost", "", &mut Vec::new()))
        .expect("create");

    let mut out = Vec::new();
    runtime
        .block_on(app.converse(None, "2\n\nsilver frost\nignored\n".as_bytes(), &mut out))
        .expect("converse");
    let text = output(out);
    assert!(text.contains("Concept complete"));
    let turns = app.store().conversation_state()["turns"].clone();
    assert_eq!(turns, serde_json::json!(3));
}

#[test]
fn show_without_any_project_reports_error() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let backend = MockBackend::new();
    let mut app = build_app(&backend, &dir, CliState::default());

    let err = runtime
        .block_on(app.show(None, &mut Vec::new()))
        .unwrap_err();
    assert_eq!(app.describe_error(&err), "No current project");
    assert_eq!(backend.request_count(), 0);
}

#[test]
fn delete_forgets_removed_projects() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let backend = MockBackend::new();
    let mut app = build_app(&backend, &dir, CliState::default());
    runtime
        .block_on(app.create("Gone", "", &mut Vec::new()))
        .expect("create");

    let mut out = Vec::new();
    runtime
        .block_on(app.delete(&["poem-1".to_string()], &mut out))
        .expect("delete");
    assert!(output(out).contains("deleted 1 poem projects"));
    assert!(app.cli_state().last_project.is_none());
    assert!(!app.store().has_current_project());
}

#[test]
fn blueprint_generate_and_save_then_write_poems() {
    let runtime = test_runtime();
    let dir = TempDir::new().expect("temp dir");
    let backend = MockBackend::new();
    let mut app = build_app(&backend, &dir, CliState::default());
    runtime
        .block_on(app.create("Autumn wind", "wind over fields", &mut Vec::new()))
        .expect("create");
    runtime
        .block_on(app.converse(None, "/quit\n".as_bytes(), &mut Vec::new()))
        .expect("converse");

    let mut out = Vec::new();
    runtime
        .block_on(app.generate_blueprint(None, true, &mut out))
        .expect("blueprint");
    runtime.block_on(app.generate(None, &mut out)).expect("generate");
    let text = output(out);
    assert!(text.contains("blueprint: Autumn wind"));
    assert!(text.contains("Saved blueprint to poem-1"));
    assert!(text.contains("--- version 3: Autumn wind"));
}
