use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const RECENT_LIMIT: usize = 10;

/// Where `cli_state.json` is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    User,
    Directory(PathBuf),
}

/// Small amount of state the terminal client remembers between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliState {
    #[serde(default)]
    pub last_project: Option<String>,
    #[serde(default)]
    pub recent_projects: Vec<String>,
}

impl CliState {
    /// Marks `project_id` as the most recently used project.
    pub fn remember(&mut self, project_id: &str) {
        self.last_project = Some(project_id.to_string());
        self.recent_projects.retain(|entry| entry != project_id);
        self.recent_projects.insert(0, project_id.to_string());
        self.recent_projects.truncate(RECENT_LIMIT);
    }

    /// Drops deleted projects from the remembered ids.
    pub fn forget(&mut self, project_ids: &[String]) {
        if self
            .last_project
            .as_ref()
            .is_some_and(|last| project_ids.contains(last))
        {
            self.last_project = None;
        }
        self.recent_projects
            .retain(|entry| !project_ids.contains(entry));
    }
}

pub async fn load_cli_state(scope: &Scope) -> Result<CliState> {
    let path = cli_state_path(scope);
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(state) => Ok(state),
            Err(err) => {
                let defaults = CliState::default();
                save_cli_state(scope, &defaults).await?;
                warn!(
                    error = ?err,
                    "failed to parse cli_state.json, resetting to defaults"
                );
                Ok(defaults)
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(CliState::default()),
        Err(err) => Err(err).context("failed to read cli_state.json"),
    }
}

pub async fn save_cli_state(scope: &Scope, state: &CliState) -> Result<()> {
    let path = cli_state_path(scope);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(state)?;
    tokio::fs::write(&path, serialized)
        .await
        .with_context(|| format!("failed to write cli_state.json at {}", path.display()))
}

fn cli_state_path(scope: &Scope) -> PathBuf {
    match scope {
        Scope::User => config_dir().join("cli_state.json"),
        Scope::Directory(path) => local_dir(path).join("cli_state.json"),
    }
}

fn local_dir(path: &Path) -> PathBuf {
    path.join(".verso")
}

fn config_dir() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        base.config_dir().join("verso")
    } else {
        PathBuf::from(".verso")
    }
}
