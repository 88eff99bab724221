use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;
use verso_core::{telemetry, BackendSettings, MockBackend, PoemApi, PoemBackend, PoemStore};

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Automation helpers for Verso")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the whole poem flow (create, converse, blueprint, generate, delete)
    /// through the store.
    Smoke {
        /// Run against a live service instead of the in-process mock.
        #[arg(long)]
        base_url: Option<String>,
    },
}

fn main() -> Result<()> {
    telemetry::init_tracing("info")?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Smoke { base_url } => smoke_test(base_url.as_deref()),
    }
}

fn smoke_test(base_url: Option<&str>) -> Result<()> {
    let runtime = Runtime::new()?;
    let backend: Arc<dyn PoemBackend> = match base_url {
        Some(url) => {
            let settings =
                BackendSettings::parse(url).map_err(|err| anyhow::anyhow!(err.user_message()))?;
            Arc::new(PoemApi::new(&settings)?)
        }
        None => Arc::new(MockBackend::new()),
    };
    let store = PoemStore::new(backend);

    runtime.block_on(async {
        let project = store
            .create_project("Smoke poem", "a lantern in the wind")
            .await?;
        let mut reply = store.send_conversation(None, None).await?;
        let mut turns = 1;
        while !reply.is_complete && turns < 8 {
            let answer = json!({ "id": null, "value": "keep it short" });
            reply = store.send_conversation(Some(answer), None).await?;
            turns += 1;
        }
        if !reply.is_complete {
            bail!("concept conversation did not complete after {turns} turns");
        }
        let generated = store.generate_blueprint(None).await?;
        store.save_blueprint(&generated.blueprint, None).await?;
        let poems = store.generate_poem_content(None).await?;
        store.load_projects().await?;
        info!(
            projects = store.projects_count(),
            versions = poems.versions.len(),
            "smoke test poem written"
        );
        store.delete_projects(&[project.id]).await?;
        if store.has_current_project() {
            bail!("deleted project is still current");
        }
        Ok(())
    })
}
