use directories::BaseDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_API_PREFIX: &str = "/api";

/// Where the poem service lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub base_url: Url,
    pub api_prefix: String,
    pub access_token: Option<String>,
}

impl BackendSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            access_token: None,
        }
    }

    /// Settings for `base_url` with the default prefix, validated the same way
    /// as a configured URL.
    pub fn parse(base_url: &str) -> Result<Self, ConfigError> {
        let section = BackendSection {
            base_url: Some(base_url.to_string()),
            ..Default::default()
        };
        resolve_backend_settings(section, &EnvOverrides::default())
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("backend not configured: create verso.yaml or set VERSO_BASE_URL.")]
    Missing,
    #[error("backend configuration invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Missing => {
                "Backend not configured. Create verso.yaml or set VERSO_BASE_URL.".to_string()
            }
            Self::Invalid(detail) => {
                format!("Backend not configured: {detail}. Update verso.yaml.")
            }
        }
    }
}

impl BackendSettings {
    /// Loads settings from the first `verso.yaml` found (or `explicit` when
    /// given), then applies `VERSO_*` environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let section = match explicit {
            Some(path) => Some(read_section(path)?),
            None => match locate_config_file() {
                Some(path) => Some(read_section(&path)?),
                None => None,
            },
        };
        resolve_backend_settings(section.unwrap_or_default(), &EnvOverrides::from_process())
    }
}

fn read_section(path: &Path) -> Result<BackendSection, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        ConfigError::Invalid(format!("failed to read {}: {err}", path.display()))
    })?;
    let config: VersoConfig = serde_yaml::from_str(&contents)
        .map_err(|err| ConfigError::Invalid(format!("invalid verso.yaml: {err}")))?;
    config
        .backend
        .ok_or_else(|| ConfigError::Invalid("missing `backend` section".to_string()))
}

#[derive(Debug, Default)]
struct EnvOverrides {
    base_url: Option<String>,
    api_prefix: Option<String>,
    access_token: Option<String>,
}

impl EnvOverrides {
    fn from_process() -> Self {
        Self {
            base_url: std::env::var("VERSO_BASE_URL").ok(),
            api_prefix: std::env::var("VERSO_API_PREFIX").ok(),
            access_token: std::env::var("VERSO_ACCESS_TOKEN").ok(),
        }
    }
}

fn resolve_backend_settings(
    section: BackendSection,
    env: &EnvOverrides,
) -> Result<BackendSettings, ConfigError> {
    let raw_url = env
        .base_url
        .clone()
        .or(section.base_url)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing)?;
    let base_url = Url::parse(&raw_url)
        .map_err(|err| ConfigError::Invalid(format!("invalid base_url {raw_url}: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(format!(
            "base_url must use http or https, got {}",
            base_url.scheme()
        )));
    }
    let api_prefix = env
        .api_prefix
        .clone()
        .or(section.api_prefix)
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());
    let access_token = env
        .access_token
        .clone()
        .or(section.access_token)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    Ok(BackendSettings {
        base_url,
        api_prefix,
        access_token,
    })
}

fn locate_config_file() -> Option<PathBuf> {
    verso_yaml_candidates()
        .into_iter()
        .find(|path| path.exists())
}

fn verso_yaml_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(base) = BaseDirs::new() {
        let config_dir = base.config_dir().join("verso");
        paths.push(config_dir.join("verso.yaml"));
        paths.push(config_dir.join("verso.yml"));
        let home_dir = base.home_dir();
        paths.push(home_dir.join(".verso").join("verso.yaml"));
        paths.push(home_dir.join(".verso").join("verso.yml"));
    } else {
        paths.push(PathBuf::from("verso.yaml"));
        paths.push(PathBuf::from("verso.yml"));
    }
    paths
}

#[derive(Debug, Deserialize)]
struct VersoConfig {
    backend: Option<BackendSection>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendSection {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_prefix: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}
