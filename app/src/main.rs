use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::runtime::Runtime;
use verso::config::{load_cli_state, Scope};
use verso::VersoApp;
use verso_core::{telemetry, BackendSettings, MockBackend, PoemApi, PoemBackend, PoemStore};

#[derive(Parser, Debug)]
#[command(name = "verso", version, about = "Work on poem projects from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Explicit verso.yaml instead of the default search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Keep client state in ./.verso instead of the user config directory.
    #[arg(long, global = true)]
    local: bool,
    /// Run against an in-process mock service.
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List poem projects.
    List,
    /// Create a project and make it current.
    Create {
        title: String,
        #[arg(long, default_value = "")]
        prompt: String,
    },
    /// Show a project.
    Show { project: Option<String> },
    /// Talk through the concept of a poem.
    Converse { project: Option<String> },
    /// Draft or save a blueprint.
    #[command(subcommand)]
    Blueprint(BlueprintCommand),
    /// Write poem versions from the saved blueprint.
    Generate { project: Option<String> },
    /// Delete projects.
    Delete {
        #[arg(required = true)]
        projects: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum BlueprintCommand {
    /// Ask the service to draft a blueprint from the conversation.
    Generate {
        project: Option<String>,
        /// Save the drafted blueprint right away.
        #[arg(long)]
        save: bool,
    },
    /// Save a blueprint from a JSON file.
    Save {
        file: PathBuf,
        #[arg(long)]
        project: Option<String>,
    },
}

fn main() -> ExitCode {
    if let Err(err) = telemetry::init_tracing("warn") {
        eprintln!("failed to initialise logging: {err:#}");
    }

    let cli = Cli::parse();
    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = match runtime.block_on(build_app(&cli)) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout();
    let result = runtime.block_on(run(&mut app, cli.command, &mut stdout));
    let _ = stdout.flush();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", app.describe_error(&err));
            ExitCode::FAILURE
        }
    }
}

async fn build_app(cli: &Cli) -> anyhow::Result<VersoApp> {
    let backend: Arc<dyn PoemBackend> = if cli.offline {
        Arc::new(MockBackend::new())
    } else {
        let settings = BackendSettings::load(cli.config.as_deref())
            .map_err(|err| anyhow::anyhow!(err.user_message()))?;
        Arc::new(PoemApi::new(&settings)?)
    };
    let scope = if cli.local {
        Scope::Directory(std::env::current_dir()?)
    } else {
        Scope::User
    };
    let cli_state = load_cli_state(&scope).await?;
    Ok(VersoApp::new(PoemStore::new(backend), scope, cli_state))
}

async fn run(app: &mut VersoApp, command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::List => app.list(out).await,
        Command::Create { title, prompt } => app.create(&title, &prompt, out).await,
        Command::Show { project } => app.show(project.as_deref(), out).await,
        Command::Converse { project } => {
            let stdin = BufReader::new(tokio::io::stdin());
            app.converse(project.as_deref(), stdin, out).await
        }
        Command::Blueprint(BlueprintCommand::Generate { project, save }) => {
            app.generate_blueprint(project.as_deref(), save, out).await
        }
        Command::Blueprint(BlueprintCommand::Save { file, project }) => {
            app.save_blueprint(&file, project.as_deref(), out).await
        }
        Command::Generate { project } => app.generate(project.as_deref(), out).await,
        Command::Delete { projects } => app.delete(&projects, out).await,
    }
}
