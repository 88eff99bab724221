use reqwest::StatusCode;
use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },
    #[error("unexpected response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Builds a status error, preferring the `detail` field of a FastAPI error
    /// document over the raw body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| match value.get("detail") {
                Some(serde_json::Value::String(text)) => Some(text.clone()),
                Some(other) if !other.is_null() => Some(other.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| body.trim().to_string());
        Self::Status { status, detail }
    }

    /// Text worth showing to a person, if the error carries any.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Status { detail, .. } if !detail.is_empty() => Some(detail.clone()),
            Self::Status { .. } => None,
            other => Some(other.to_string()),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}

/// Store operations, used to pick the failure message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadProjects,
    CreateProject,
    LoadProject,
    Converse,
    GenerateBlueprint,
    SaveBlueprint,
    GeneratePoem,
    DeleteProjects,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::LoadProjects => "Failed to load projects",
            Self::CreateProject => "Failed to create project",
            Self::LoadProject => "Failed to load project",
            Self::Converse => "Conversation failed",
            Self::GenerateBlueprint => "Failed to generate blueprint",
            Self::SaveBlueprint => "Failed to save blueprint",
            Self::GeneratePoem => "Failed to generate poem",
            Self::DeleteProjects => "Failed to delete projects",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_message())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("no current project")]
    NoCurrentProject,
    #[error("{operation}: {source}")]
    Api {
        operation: Operation,
        #[source]
        source: ApiError,
    },
}

impl StoreError {
    pub fn api(operation: Operation, source: ApiError) -> Self {
        Self::Api { operation, source }
    }

    /// The string stored in the store's `error` field.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoCurrentProject => "No current project".to_string(),
            Self::Api { operation, source } => source
                .message()
                .unwrap_or_else(|| operation.failure_message().to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
pub type StoreResult<T> = Result<T, StoreError>;
