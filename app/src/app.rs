use crate::config::{save_cli_state, CliState, Scope};
use crate::ui;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::warn;
use verso_core::model::Blueprint;
use verso_core::{PoemStore, StoreError};

const QUIT_COMMAND: &str = "/quit";

/// Terminal front end over a [`PoemStore`].
///
/// Project-scoped commands accept an explicit project id; without one they
/// fall back to the last project this client worked on.
pub struct VersoApp {
    store: PoemStore,
    scope: Scope,
    cli_state: CliState,
}

impl VersoApp {
    pub fn new(store: PoemStore, scope: Scope, cli_state: CliState) -> Self {
        Self {
            store,
            scope,
            cli_state,
        }
    }

    pub fn store(&self) -> &PoemStore {
        &self.store
    }

    pub fn cli_state(&self) -> &CliState {
        &self.cli_state
    }

    /// Message to print for a failed command, preferring the one the store
    /// recorded for the UI.
    pub fn describe_error(&self, err: &anyhow::Error) -> String {
        if let Some(store_err) = err.downcast_ref::<StoreError>() {
            return self
                .store
                .error()
                .unwrap_or_else(|| store_err.user_message());
        }
        format!("{err:#}")
    }

    pub async fn list(&mut self, out: &mut dyn Write) -> Result<()> {
        let projects = self.store.load_projects().await?;
        out.write_all(ui::render_project_list(&projects).as_bytes())?;
        Ok(())
    }

    pub async fn create(&mut self, title: &str, prompt: &str, out: &mut dyn Write) -> Result<()> {
        let project = self.store.create_project(title, prompt).await?;
        writeln!(out, "Created {} [{}]", project.title, project.id)?;
        self.remember(&project.id).await;
        Ok(())
    }

    pub async fn show(&mut self, project_id: Option<&str>, out: &mut dyn Write) -> Result<()> {
        let target = self.target(project_id)?;
        let project = self.store.load_project(&target, false).await?;
        out.write_all(ui::render_project(&project).as_bytes())?;
        self.remember(&project.id).await;
        Ok(())
    }

    /// Runs the concept conversation until the service reports it complete,
    /// input ends, or the user types `/quit`.
    pub async fn converse<R>(
        &mut self,
        project_id: Option<&str>,
        input: R,
        out: &mut dyn Write,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let fallback = self.fallback(project_id);
        let mut reply = self.store.send_conversation(None, fallback.as_deref()).await?;
        if let Some(project_id) = self.current_id() {
            self.remember(&project_id).await;
        }
        let mut lines = input.lines();
        loop {
            out.write_all(ui::render_reply(&reply).as_bytes())?;
            if reply.is_complete {
                break;
            }
            let Some(line) = read_answer(&mut lines, out).await? else {
                break;
            };
            let answer = ui::parse_answer(&line, &reply.ui_control);
            reply = self.store.send_conversation(Some(answer), None).await?;
        }
        Ok(())
    }

    pub async fn generate_blueprint(
        &mut self,
        project_id: Option<&str>,
        save: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        let fallback = self.fallback(project_id);
        let generated = self.store.generate_blueprint(fallback.as_deref()).await?;
        writeln!(out, "{}", generated.ai_message)?;
        out.write_all(ui::render_blueprint(&generated.blueprint).as_bytes())?;
        if save {
            let project = self.store.save_blueprint(&generated.blueprint, None).await?;
            writeln!(out, "Saved blueprint to {}", project.id)?;
        }
        if let Some(project_id) = self.current_id() {
            self.remember(&project_id).await;
        }
        Ok(())
    }

    pub async fn save_blueprint(
        &mut self,
        file: &Path,
        project_id: Option<&str>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let contents = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("failed to read blueprint at {}", file.display()))?;
        let blueprint: Blueprint = serde_json::from_str(&contents)
            .with_context(|| format!("invalid blueprint JSON at {}", file.display()))?;
        let fallback = self.fallback(project_id);
        let project = self
            .store
            .save_blueprint(&blueprint, fallback.as_deref())
            .await?;
        writeln!(out, "Saved blueprint to {}", project.id)?;
        self.remember(&project.id).await;
        Ok(())
    }

    pub async fn generate(&mut self, project_id: Option<&str>, out: &mut dyn Write) -> Result<()> {
        let fallback = self.fallback(project_id);
        let response = self.store.generate_poem_content(fallback.as_deref()).await?;
        writeln!(out, "{}", response.message)?;
        out.write_all(ui::render_versions(&response.versions).as_bytes())?;
        if let Some(project_id) = self.current_id() {
            self.remember(&project_id).await;
        }
        Ok(())
    }

    pub async fn delete(&mut self, project_ids: &[String], out: &mut dyn Write) -> Result<()> {
        let response = self.store.delete_projects(project_ids).await?;
        writeln!(out, "{}", response.message)?;
        self.cli_state.forget(project_ids);
        self.persist().await;
        Ok(())
    }

    fn fallback(&self, project_id: Option<&str>) -> Option<String> {
        project_id
            .map(str::to_string)
            .or_else(|| self.cli_state.last_project.clone())
    }

    fn target(&self, project_id: Option<&str>) -> Result<String> {
        self.fallback(project_id)
            .ok_or_else(|| anyhow::Error::new(StoreError::NoCurrentProject))
    }

    fn current_id(&self) -> Option<String> {
        self.store.current_project().map(|project| project.id)
    }

    async fn remember(&mut self, project_id: &str) {
        self.cli_state.remember(project_id);
        self.persist().await;
    }

    async fn persist(&self) {
        if let Err(err) = save_cli_state(&self.scope, &self.cli_state).await {
            warn!(error = %err, "failed to persist cli state");
        }
    }
}

/// Prompts until a non-empty line arrives. `None` on end of input or `/quit`.
async fn read_answer<R>(lines: &mut Lines<R>, out: &mut dyn Write) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim();
        if line == QUIT_COMMAND {
            return Ok(None);
        }
        if !line.is_empty() {
            return Ok(Some(line.to_string()));
        }
    }
}
