use crate::backend::PoemBackend;
use crate::config::BackendSettings;
use crate::error::{ApiError, ApiResult};
use crate::model::{
    user_input_or_empty, Blueprint, BlueprintGenerationResponse, ConversationState,
    ConverseResponse, DeleteProjectsResponse, PoemGenerationResponse, Project, ProjectSummary,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// HTTP client for the `/poems` resource.
///
/// Every call maps to exactly one request. Failures are returned as they
/// happen: there is no retry, no backoff and no request timeout.
#[derive(Clone, Debug)]
pub struct PoemApi {
    http: Client,
    poems_base: Url,
    access_token: Option<String>,
}

#[derive(Serialize)]
struct CreatePoemRequest<'a> {
    title: &'a str,
    initial_prompt: &'a str,
}

#[derive(Serialize)]
struct ConverseRequest<'a> {
    user_input: Value,
    conversation_state: &'a ConversationState,
}

impl PoemApi {
    pub fn new(settings: &BackendSettings) -> ApiResult<Self> {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(http: Client, settings: &BackendSettings) -> ApiResult<Self> {
        let poems_base = poems_base_url(&settings.base_url, &settings.api_prefix)?;
        Ok(Self {
            http,
            poems_base,
            access_token: settings.access_token.clone(),
        })
    }

    pub fn poems_base(&self) -> &Url {
        &self.poems_base
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.poems_base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.poems_base.to_string()))?
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "poem api request");
        let builder = self.http.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!(%status, "poem api request failed");
            return Err(ApiError::from_status(status, &body));
        }
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { source, body })
    }
}

#[async_trait]
impl PoemBackend for PoemApi {
    async fn create_poem(&self, title: &str, initial_prompt: &str) -> ApiResult<Project> {
        let url = self.endpoint(&[])?;
        let body = CreatePoemRequest {
            title,
            initial_prompt,
        };
        self.send(self.request(Method::POST, url).json(&body)).await
    }

    async fn get_poem(&self, project_id: &str) -> ApiResult<Project> {
        let url = self.endpoint(&[project_id])?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn list_poems(&self) -> ApiResult<Vec<ProjectSummary>> {
        let url = self.endpoint(&[])?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn converse(
        &self,
        project_id: &str,
        user_input: Option<Value>,
        conversation_state: &ConversationState,
    ) -> ApiResult<ConverseResponse> {
        let url = self.endpoint(&[project_id, "concept", "converse"])?;
        let body = ConverseRequest {
            user_input: user_input_or_empty(user_input),
            conversation_state,
        };
        self.send(self.request(Method::POST, url).json(&body)).await
    }

    async fn generate_blueprint(
        &self,
        project_id: &str,
    ) -> ApiResult<BlueprintGenerationResponse> {
        let url = self.endpoint(&[project_id, "blueprint", "generate"])?;
        self.send(self.request(Method::POST, url)).await
    }

    async fn save_blueprint(&self, project_id: &str, blueprint: &Blueprint) -> ApiResult<Project> {
        let url = self.endpoint(&[project_id, "blueprint", "save"])?;
        self.send(self.request(Method::POST, url).json(blueprint))
            .await
    }

    async fn generate_poem_content(&self, project_id: &str) -> ApiResult<PoemGenerationResponse> {
        let url = self.endpoint(&[project_id, "generate"])?;
        self.send(self.request(Method::POST, url)).await
    }

    async fn delete_poems(&self, project_ids: &[String]) -> ApiResult<DeleteProjectsResponse> {
        let url = self.endpoint(&[])?;
        self.send(self.request(Method::DELETE, url).json(project_ids))
            .await
    }
}

fn poems_base_url(base_url: &Url, api_prefix: &str) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?;
        segments.pop_if_empty();
        segments.extend(api_prefix.split('/').filter(|part| !part.is_empty()));
        segments.push("poems");
    }
    Ok(url)
}
