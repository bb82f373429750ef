use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use urlencoding::encode;

use super::config_service::Settings;
use super::error::{ApiError, ApiResult};
use crate::models::{
    ChatRequest, ChatResponse, NewWorkspace, PaperPayload, SearchResponse, SearchResult,
    SummarizeRequest, SummarizeResponse, UploadResponse, UserDocument, UserDocumentRow,
    Workspace, WorkspacePaper,
};

/// Supplies the bearer token attached to backend requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> ApiResult<String>;
}

/// Fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> ApiResult<String> {
        self.0.clone().ok_or(ApiError::NotAuthenticated)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Client for the ResearchPilot workspace/paper/RAG API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenSource>) -> ApiResult<Self> {
        Self::with_timeout(base_url, tokens, None)
    }

    /// Without a timeout, requests wait as long as the transport allows.
    pub fn with_timeout(
        base_url: &str,
        tokens: Arc<dyn TokenSource>,
        timeout: Option<Duration>,
    ) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn from_settings(settings: &Settings, tokens: Arc<dyn TokenSource>) -> ApiResult<Self> {
        Self::with_timeout(&settings.api_url, tokens, settings.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authorized(&self, request: RequestBuilder) -> ApiResult<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token))
    }

    /// Attach a token when one is available; these endpoints also serve anonymous callers.
    async fn maybe_authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.access_token().await {
            Ok(token) => request.bearer_auth(token),
            Err(_) => request,
        }
    }

    async fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .and_then(|d| d.as_str().map(str::to_string));

        tracing::debug!(status = status.as_u16(), detail = ?detail, "Request rejected");
        Err(ApiError::from_status(status.as_u16(), detail))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ApiResult<T> {
        let response = Self::check(request.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_unit(request: RequestBuilder) -> ApiResult<()> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Workspaces
    // ------------------------------------------------------------------

    pub async fn list_workspaces(&self) -> ApiResult<Vec<Workspace>> {
        let request = self.client.get(self.url("/workspaces/"));
        Self::send(self.authorized(request).await?).await
    }

    pub async fn create_workspace(&self, workspace: &NewWorkspace) -> ApiResult<Workspace> {
        let request = self.client.post(self.url("/workspaces/")).json(workspace);
        Self::send(self.authorized(request).await?).await
    }

    pub async fn get_workspace(&self, workspace_id: &str) -> ApiResult<Workspace> {
        let request = self
            .client
            .get(self.url(&format!("/workspaces/{}", encode(workspace_id))));
        Self::send(self.authorized(request).await?).await
    }

    pub async fn list_workspace_papers(&self, workspace_id: &str) -> ApiResult<Vec<WorkspacePaper>> {
        let request = self
            .client
            .get(self.url(&format!("/workspaces/{}/papers", encode(workspace_id))));
        Self::send(self.authorized(request).await?).await
    }

    /// Returns whatever the backend echoes for the stored paper.
    pub async fn add_workspace_paper(
        &self,
        workspace_id: &str,
        paper: &WorkspacePaper,
    ) -> ApiResult<serde_json::Value> {
        let request = self
            .client
            .post(self.url(&format!("/workspaces/{}/papers", encode(workspace_id))))
            .json(&PaperPayload::from(paper));
        Self::send(self.authorized(request).await?).await
    }

    pub async fn remove_workspace_paper(&self, workspace_id: &str, paper_id: &str) -> ApiResult<()> {
        let request = self.client.delete(self.url(&format!(
            "/workspaces/{}/papers/{}",
            encode(workspace_id),
            encode(paper_id)
        )));
        Self::send_unit(self.authorized(request).await?).await
    }

    pub async fn list_user_documents(&self) -> ApiResult<Vec<UserDocument>> {
        let request = self.client.get(self.url("/workspaces/user/papers"));
        let rows: Vec<UserDocumentRow> = Self::send(self.authorized(request).await?).await?;
        Ok(rows.into_iter().map(UserDocument::from).collect())
    }

    // ------------------------------------------------------------------
    // Papers
    // ------------------------------------------------------------------

    pub async fn search_papers(&self, query: &str) -> ApiResult<Vec<SearchResult>> {
        let request = self
            .client
            .get(self.url("/papers/search"))
            .query(&[("query", query)]);
        let response: SearchResponse = Self::send(self.maybe_authorized(request).await).await?;
        Ok(response.papers.into_iter().map(SearchResult::from).collect())
    }

    pub async fn summarize_paper(&self, request: &SummarizeRequest) -> ApiResult<SummarizeResponse> {
        let request = self.client.post(self.url("/papers/summarize")).json(request);
        Self::send(self.maybe_authorized(request).await).await
    }

    // ------------------------------------------------------------------
    // RAG
    // ------------------------------------------------------------------

    pub async fn chat(&self, request: &ChatRequest) -> ApiResult<ChatResponse> {
        let request = self.client.post(self.url("/rag/chat")).json(request);
        Self::send(self.authorized(request).await?).await
    }

    pub async fn upload_pdf(&self, workspace_id: &str, path: &Path) -> ApiResult<UploadResponse> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let request = self
            .client
            .post(self.url("/rag/upload"))
            .query(&[("workspace_id", workspace_id)])
            .multipart(form);
        Self::send(self.authorized(request).await?).await
    }

    pub async fn process_paper(&self, paper_id: &str) -> ApiResult<()> {
        let request = self
            .client
            .post(self.url(&format!("/chat/process-paper/{}", encode(paper_id))));
        Self::send_unit(self.authorized(request).await?).await
    }
}
