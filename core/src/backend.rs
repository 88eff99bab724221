use crate::error::{ApiError, ApiResult};
use crate::model::{
    user_input_or_empty, Blueprint, BlueprintGenerationResponse, ChoiceOption,
    ConversationState, ConverseResponse, DeleteProjectsResponse, PoemGenerationResponse,
    PoemVersion, Project, ProjectSummary, UiControl,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Remote operations on poem projects.
#[async_trait]
pub trait PoemBackend: Send + Sync {
    async fn create_poem(&self, title: &str, initial_prompt: &str) -> ApiResult<Project>;

    async fn get_poem(&self, project_id: &str) -> ApiResult<Project>;

    async fn list_poems(&self) -> ApiResult<Vec<ProjectSummary>>;

    async fn converse(
        &self,
        project_id: &str,
        user_input: Option<Value>,
        conversation_state: &ConversationState,
    ) -> ApiResult<ConverseResponse>;

    async fn generate_blueprint(&self, project_id: &str)
        -> ApiResult<BlueprintGenerationResponse>;

    async fn save_blueprint(&self, project_id: &str, blueprint: &Blueprint) -> ApiResult<Project>;

    async fn generate_poem_content(&self, project_id: &str) -> ApiResult<PoemGenerationResponse>;

    async fn delete_poems(&self, project_ids: &[String]) -> ApiResult<DeleteProjectsResponse>;
}

const CONCEPT_TURNS: usize = 3;

/// In-process backend that imitates the poem service closely enough for
/// smoke runs and tests.
#[derive(Clone, Default)]
pub struct MockBackend {
    projects: Arc<RwLock<Vec<Project>>>,
    next_id: Arc<AtomicUsize>,
    requests: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests served so far, failed ones included.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn insert(&self, project: Project) {
        self.projects.write().push(project);
    }

    fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn find(&self, project_id: &str) -> ApiResult<Project> {
        self.projects
            .read()
            .iter()
            .find(|project| project.id == project_id)
            .cloned()
            .ok_or_else(|| not_found(project_id))
    }

    fn update<T>(
        &self,
        project_id: &str,
        apply: impl FnOnce(&mut Project) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let mut projects = self.projects.write();
        let project = projects
            .iter_mut()
            .find(|project| project.id == project_id)
            .ok_or_else(|| not_found(project_id))?;
        apply(project)
    }
}

fn not_found(project_id: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::NOT_FOUND,
        detail: format!("project {project_id} not found"),
    }
}

fn bad_request(detail: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::BAD_REQUEST,
        detail: detail.to_string(),
    }
}

fn history_entry(role: &str, content: String) -> Map<String, Value> {
    let mut entry = Map::new();
    entry.insert("role".into(), Value::String(role.into()));
    entry.insert("content".into(), Value::String(content));
    entry
}

#[async_trait]
impl PoemBackend for MockBackend {
    async fn create_poem(&self, title: &str, initial_prompt: &str) -> ApiResult<Project> {
        self.record_request();
        let id = format!("poem-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let project = Project {
            id,
            user_id: 1,
            title: title.to_string(),
            initial_prompt: initial_prompt.to_string(),
            ..Default::default()
        };
        self.insert(project.clone());
        Ok(project)
    }

    async fn get_poem(&self, project_id: &str) -> ApiResult<Project> {
        self.record_request();
        self.find(project_id)
    }

    async fn list_poems(&self) -> ApiResult<Vec<ProjectSummary>> {
        self.record_request();
        Ok(self.projects.read().iter().map(Project::summary).collect())
    }

    async fn converse(
        &self,
        project_id: &str,
        user_input: Option<Value>,
        conversation_state: &ConversationState,
    ) -> ApiResult<ConverseResponse> {
        self.record_request();
        let user_content = user_input_or_empty(user_input).to_string();
        self.update(project_id, |project| {
            project
                .conversation_history
                .push(history_entry("user", user_content));
            let turns = project
                .conversation_history
                .iter()
                .filter(|entry| entry.get("role").and_then(Value::as_str) == Some("user"))
                .count();
            let is_complete = turns >= CONCEPT_TURNS;
            let ai_message = if is_complete {
                "The concept is settled. Ready to draft the blueprint.".to_string()
            } else {
                format!("Tell me more about \"{}\" (turn {turns}).", project.title)
            };
            let ui_control = if is_complete {
                UiControl {
                    kind: "info_display".into(),
                    options: None,
                    placeholder: None,
                }
            } else if turns == 1 {
                UiControl {
                    kind: "single_choice".into(),
                    options: Some(vec![
                        ChoiceOption {
                            id: "option_1".into(),
                            label: "Regulated verse".into(),
                        },
                        ChoiceOption {
                            id: "option_2".into(),
                            label: "Free verse".into(),
                        },
                    ]),
                    placeholder: None,
                }
            } else {
                UiControl {
                    kind: "text_input".into(),
                    options: None,
                    placeholder: Some("Describe the imagery".into()),
                }
            };
            let mut state = conversation_state.clone();
            state.insert("turns".into(), json!(turns));
            let reply = ConverseResponse {
                ai_message,
                ui_control,
                conversation_state: state,
                is_complete,
                ready_for_blueprint: is_complete.then_some(true),
            };
            let assistant_content =
                serde_json::to_string(&reply).map_err(|source| ApiError::Decode {
                    source,
                    body: String::new(),
                })?;
            project
                .conversation_history
                .push(history_entry("assistant", assistant_content));
            Ok(reply)
        })
    }

    async fn generate_blueprint(
        &self,
        project_id: &str,
    ) -> ApiResult<BlueprintGenerationResponse> {
        self.record_request();
        self.update(project_id, |project| {
            if project.conversation_history.is_empty() {
                return Err(bad_request(
                    "missing conversation history, finish the concept conversation first",
                ));
            }
            let blueprint = Blueprint {
                title: project.title.clone(),
                genre: "poem".into(),
                one_sentence_summary: project.initial_prompt.clone(),
                ..Default::default()
            };
            project.blueprint = Some(blueprint.clone());
            Ok(BlueprintGenerationResponse {
                blueprint,
                ai_message: "The poem's outline is ready. Confirm it or ask for changes.".into(),
            })
        })
    }

    async fn save_blueprint(&self, project_id: &str, blueprint: &Blueprint) -> ApiResult<Project> {
        self.record_request();
        self.update(project_id, |project| {
            if !blueprint.title.is_empty() {
                project.title = blueprint.title.clone();
            }
            project.blueprint = Some(blueprint.clone());
            Ok(project.clone())
        })
    }

    async fn generate_poem_content(&self, project_id: &str) -> ApiResult<PoemGenerationResponse> {
        self.record_request();
        let project = self.find(project_id)?;
        let blueprint = project.blueprint.ok_or_else(|| {
            bad_request("project has no blueprint yet, generate one before writing")
        })?;
        let versions: Vec<PoemVersion> = (1..=3)
            .map(|n| PoemVersion {
                version_number: n,
                content: format!("{} ({n})", blueprint.one_sentence_summary),
                title: blueprint.title.clone(),
                notes: format!("draft {n}"),
            })
            .collect();
        Ok(PoemGenerationResponse {
            status: "success".into(),
            message: format!("generated {} poem versions", versions.len()),
            versions,
        })
    }

    async fn delete_poems(&self, project_ids: &[String]) -> ApiResult<DeleteProjectsResponse> {
        self.record_request();
        self.projects
            .write()
            .retain(|project| !project_ids.contains(&project.id));
        Ok(DeleteProjectsResponse {
            status: "success".into(),
            message: format!("deleted {} poem projects", project_ids.len()),
        })
    }
}
