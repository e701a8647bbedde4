//! HTTP transport to the chat backend, built on reqwest.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use quatuor_core::config::BackendConfig;
use quatuor_core::{FileContext, ReplyRecord, SessionId, SessionSummary, Turn};

use crate::error::TransportError;
use crate::transport::{AuthStore, FileStore, Transport};
use crate::wire::{ChatRequest, ChatResponse, LoginRequest, LoginResponse, TurnRecord, UploadResponse};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Backend client. Every core request carries the bearer token from the
/// [`AuthStore`] and a fresh `x-request-id`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    base: Url,
    auth: Arc<dyn AuthStore>,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        auth: Arc<dyn AuthStore>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(base_url));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            base,
            auth,
        })
    }

    pub fn from_config(
        config: &BackendConfig,
        auth: Arc<dyn AuthStore>,
    ) -> Result<Self, TransportError> {
        Self::new(
            config.base_url.clone(),
            auth,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}/<segments>/<session id>`, with the id percent-encoded as a
    /// single path segment.
    fn session_url(&self, segments: &[&str], session_id: &SessionId) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments)
            .push(session_id.as_str());
        Ok(url)
    }

    /// Sign in and store the issued token.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, TransportError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(username, "Login rejected");
            return Err(TransportError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let login: LoginResponse = decode(response).await?;
        self.auth.set_token(&login.access_token)?;
        info!(username, "Signed in");
        Ok(login)
    }

    /// Attach credentials, send, and map the status line.
    ///
    /// A 401 clears the stored token so the next attempt asks the user to
    /// sign in again.
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, TransportError> {
        let token = self
            .auth
            .token()
            .filter(|t| !t.is_empty())
            .ok_or(TransportError::MissingCredential)?;
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        let response = request
            .bearer_auth(token)
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .map_err(|e| {
                warn!(operation, request_id = %request_id, error = %e, "Backend request failed");
                TransportError::Network(e.to_string())
            })?;

        let status = response.status();
        debug!(
            operation,
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backend responded"
        );

        if status == StatusCode::UNAUTHORIZED {
            warn!(operation, "Access token rejected; signing out");
            self.auth.clear();
            return Err(TransportError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation, status = status.as_u16(), "Backend returned an error");
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    response
        .json::<T>()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ReplyRecord, TransportError> {
        let builder = self.client.post(self.url("/api/chat")).json(request);
        let response = self.execute("send_chat", builder).await?;
        let reply: ChatResponse = decode(response).await?;
        Ok(reply.into_reply(request.mode))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, TransportError> {
        let builder = self.client.get(self.url("/api/sessions"));
        let response = self.execute("list_sessions", builder).await?;
        decode(response).await
    }

    async fn get_history(&self, session_id: &SessionId) -> Result<Vec<Turn>, TransportError> {
        let url = self.session_url(&["api", "chat", "history"], session_id)?;
        let builder = self.client.get(url);
        let response = self.execute("get_history", builder).await?;
        let records: Vec<TurnRecord> = decode(response).await?;
        Ok(records.into_iter().map(Turn::from).collect())
    }

    async fn rename_session(
        &self,
        session_id: &SessionId,
        name: &str,
    ) -> Result<(), TransportError> {
        let url = self.session_url(&["api", "sessions"], session_id)?;
        let builder = self.client.put(url).query(&[("session_name", name)]);
        self.execute("rename_session", builder).await?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), TransportError> {
        let url = self.session_url(&["api", "sessions"], session_id)?;
        let builder = self.client.delete(url);
        self.execute("delete_session", builder).await?;
        Ok(())
    }
}

#[async_trait]
impl FileStore for HttpTransport {
    async fn upload(&self, path: &Path) -> Result<FileContext, TransportError> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.clone());
        let form = reqwest::multipart::Form::new().part("file", part);

        let builder = self.client.post(self.url("/api/files/upload")).multipart(form);
        let response = self.execute("upload", builder).await?;
        let upload: UploadResponse = decode(response).await?;
        info!(file_id = %upload.file_id, filename = %filename, size, "File uploaded");
        Ok(upload.into())
    }
}
