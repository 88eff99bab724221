use crate::backend::PoemBackend;
use crate::error::{Operation, StoreError, StoreResult};
use crate::model::{
    Blueprint, BlueprintGenerationResponse, ConversationState, ConverseResponse,
    DeleteProjectsResponse, PoemGenerationResponse, PoemVersion, Project, ProjectSummary,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Everything the front end renders, copied out of the store in one piece.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub projects: Vec<ProjectSummary>,
    pub current_project: Option<Project>,
    pub conversation_state: ConversationState,
    pub poem_versions: Vec<PoemVersion>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl StoreSnapshot {
    pub fn projects_count(&self) -> usize {
        self.projects.len()
    }

    pub fn has_current_project(&self) -> bool {
        self.current_project.is_some()
    }

    fn replace_current(&mut self, project: Option<Project>) {
        let same_project = match (&self.current_project, &project) {
            (Some(old), Some(new)) => old.id == new.id,
            (None, None) => true,
            _ => false,
        };
        if !same_project {
            self.poem_versions.clear();
        }
        self.current_project = project;
    }
}

/// Client-side state for poem projects.
///
/// Each async operation marks the store as loading, clears the previous error,
/// calls the backend and folds the result into the state. A failure leaves its
/// message in [`StoreSnapshot::error`] and is returned to the caller as well.
/// The loading flag is advisory: overlapping calls are not rejected and the
/// last response to arrive wins.
#[derive(Clone)]
pub struct PoemStore {
    inner: Arc<RwLock<StoreSnapshot>>,
    backend: Arc<dyn PoemBackend>,
    revision: Arc<watch::Sender<u64>>,
}

impl PoemStore {
    pub fn new(backend: Arc<dyn PoemBackend>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(StoreSnapshot::default())),
            backend,
            revision: Arc::new(revision),
        }
    }

    /// Receiver that observes a new revision after every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.read().clone()
    }

    pub fn projects(&self) -> Vec<ProjectSummary> {
        self.inner.read().projects.clone()
    }

    pub fn projects_count(&self) -> usize {
        self.inner.read().projects_count()
    }

    pub fn current_project(&self) -> Option<Project> {
        self.inner.read().current_project.clone()
    }

    pub fn has_current_project(&self) -> bool {
        self.inner.read().has_current_project()
    }

    pub fn conversation_state(&self) -> ConversationState {
        self.inner.read().conversation_state.clone()
    }

    pub fn poem_versions(&self) -> Vec<PoemVersion> {
        self.inner.read().poem_versions.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.read().error.clone()
    }

    pub fn set_current_project(&self, project: Option<Project>) {
        self.mutate(|state| state.replace_current(project));
    }

    pub async fn load_projects(&self) -> StoreResult<Vec<ProjectSummary>> {
        let operation = Operation::LoadProjects;
        self.run(operation, false, async {
            let projects = self
                .backend
                .list_poems()
                .await
                .map_err(|err| StoreError::api(operation, err))?;
            info!(count = projects.len(), "loaded poem projects");
            self.mutate(|state| state.projects = projects.clone());
            Ok(projects)
        })
        .await
    }

    pub async fn create_project(&self, title: &str, initial_prompt: &str) -> StoreResult<Project> {
        let operation = Operation::CreateProject;
        self.run(operation, false, async {
            let project = self
                .backend
                .create_poem(title, initial_prompt)
                .await
                .map_err(|err| StoreError::api(operation, err))?;
            info!(project_id = %project.id, "created poem project");
            self.mutate(|state| {
                state.replace_current(Some(project.clone()));
                state.conversation_state = ConversationState::new();
            });
            Ok(project)
        })
        .await
    }

    /// Fetches a project and makes it current. A silent load leaves the
    /// loading flag alone.
    pub async fn load_project(&self, project_id: &str, silent: bool) -> StoreResult<Project> {
        let operation = Operation::LoadProject;
        self.run(operation, silent, async {
            let project = self
                .backend
                .get_poem(project_id)
                .await
                .map_err(|err| StoreError::api(operation, err))?;
            self.mutate(|state| state.replace_current(Some(project.clone())));
            Ok(project)
        })
        .await
    }

    pub async fn send_conversation(
        &self,
        user_input: Option<Value>,
        fallback_id: Option<&str>,
    ) -> StoreResult<ConverseResponse> {
        let operation = Operation::Converse;
        self.run(operation, false, async {
            let project_id = self.ensure_project_id(fallback_id).await?;
            let conversation_state = self.conversation_state();
            let response = self
                .backend
                .converse(&project_id, user_input, &conversation_state)
                .await
                .map_err(|err| StoreError::api(operation, err))?;
            self.mutate(|state| {
                state.conversation_state = response.conversation_state.clone();
            });
            Ok(response)
        })
        .await
    }

    pub async fn generate_blueprint(
        &self,
        fallback_id: Option<&str>,
    ) -> StoreResult<BlueprintGenerationResponse> {
        let operation = Operation::GenerateBlueprint;
        self.run(operation, false, async {
            let project_id = self.ensure_project_id(fallback_id).await?;
            self.backend
                .generate_blueprint(&project_id)
                .await
                .map_err(|err| StoreError::api(operation, err))
        })
        .await
    }

    pub async fn save_blueprint(
        &self,
        blueprint: &Blueprint,
        fallback_id: Option<&str>,
    ) -> StoreResult<Project> {
        let operation = Operation::SaveBlueprint;
        self.run(operation, false, async {
            let project_id = self.ensure_project_id(fallback_id).await?;
            let project = self
                .backend
                .save_blueprint(&project_id, blueprint)
                .await
                .map_err(|err| StoreError::api(operation, err))?;
            info!(project_id = %project.id, "saved blueprint");
            self.mutate(|state| state.replace_current(Some(project.clone())));
            Ok(project)
        })
        .await
    }

    pub async fn generate_poem_content(
        &self,
        fallback_id: Option<&str>,
    ) -> StoreResult<PoemGenerationResponse> {
        let operation = Operation::GeneratePoem;
        self.run(operation, false, async {
            let project_id = self.ensure_project_id(fallback_id).await?;
            let response = self
                .backend
                .generate_poem_content(&project_id)
                .await
                .map_err(|err| StoreError::api(operation, err))?;
            info!(
                project_id = %project_id,
                versions = response.versions.len(),
                "generated poem versions"
            );
            self.mutate(|state| state.poem_versions = response.versions.clone());
            Ok(response)
        })
        .await
    }

    pub async fn delete_projects(&self, project_ids: &[String]) -> StoreResult<DeleteProjectsResponse> {
        let operation = Operation::DeleteProjects;
        self.run(operation, false, async {
            let response = self
                .backend
                .delete_poems(project_ids)
                .await
                .map_err(|err| StoreError::api(operation, err))?;
            info!(count = project_ids.len(), "deleted poem projects");
            self.mutate(|state| {
                state
                    .projects
                    .retain(|project| !project_ids.contains(&project.id));
                let active_deleted = state
                    .current_project
                    .as_ref()
                    .is_some_and(|project| project_ids.contains(&project.id));
                if active_deleted {
                    state.replace_current(None);
                    state.conversation_state = ConversationState::new();
                }
            });
            Ok(response)
        })
        .await
    }

    /// Id of the project an operation should act on: the current project if
    /// one is loaded, else `fallback_id` after loading it silently.
    pub async fn ensure_project_id(&self, fallback_id: Option<&str>) -> StoreResult<String> {
        if let Some(id) = self.current_project_id() {
            return Ok(id);
        }
        if let Some(fallback_id) = fallback_id.filter(|id| !id.is_empty()) {
            self.load_project(fallback_id, true).await?;
            if let Some(id) = self.current_project_id() {
                return Ok(id);
            }
        }
        Err(StoreError::NoCurrentProject)
    }

    fn current_project_id(&self) -> Option<String> {
        self.inner
            .read()
            .current_project
            .as_ref()
            .map(|project| project.id.clone())
            .filter(|id| !id.is_empty())
    }

    async fn run<T, F>(&self, operation: Operation, silent: bool, work: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        self.mutate(|state| {
            if !silent {
                state.is_loading = true;
            }
            state.error = None;
        });
        let result = work.await;
        if let Err(err) = &result {
            warn!(%operation, error = %err, "poem store operation failed");
            let message = err.user_message();
            self.mutate(|state| state.error = Some(message));
        }
        if !silent {
            self.mutate(|state| state.is_loading = false);
        }
        result
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut StoreSnapshot) -> R) -> R {
        let result = {
            let mut inner = self.inner.write();
            apply(&mut inner)
        };
        self.revision.send_modify(|revision| *revision += 1);
        result
    }
}
