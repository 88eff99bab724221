pub mod app;
pub mod config;
pub mod ui;

pub use app::VersoApp;
pub use config::{load_cli_state, save_cli_state, CliState, Scope};
