pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod telemetry;

pub use api::PoemApi;
pub use backend::{MockBackend, PoemBackend};
pub use config::{BackendSettings, ConfigError};
pub use error::{ApiError, Operation, StoreError};
pub use model::{
    Blueprint, BlueprintGenerationResponse, ConversationState, ConverseResponse,
    DeleteProjectsResponse, PoemGenerationResponse, PoemVersion, Project, ProjectSummary,
};
pub use store::{PoemStore, StoreSnapshot};
