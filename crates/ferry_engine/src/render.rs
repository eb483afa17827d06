use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use crate::decode::decode_body;
use crate::types::{FailureKind, RenderError};

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
    pub allowed_content_types: Vec<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 8 * 1024 * 1024,
            user_agent: "Mozilla/5.0 (compatible; ferry-schedule/0.1)".to_string(),
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

/// Turns a URL into page HTML.
///
/// Implementations must return promptly with [`FailureKind::Cancelled`] once
/// `cancel` fires. Errors are per call and never poison the renderer.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str, cancel: &CancellationToken) -> Result<String, RenderError>;
}

/// Plain HTTP renderer over one shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestRenderer {
    client: reqwest::Client,
    settings: RenderSettings,
}

impl ReqwestRenderer {
    pub fn new(settings: RenderSettings) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| RenderError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    async fn download(&self, url: reqwest::Url) -> Result<String, RenderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(declared) = response.content_length() {
            if declared > max_bytes {
                return Err(too_large(max_bytes, declared));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(RenderError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }

        decode_body(&body, content_type.as_deref())
    }
}

#[async_trait::async_trait]
impl Renderer for ReqwestRenderer {
    async fn render(&self, url: &str, cancel: &CancellationToken) -> Result<String, RenderError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| RenderError::new(FailureKind::InvalidUrl, err.to_string()))?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RenderError::cancelled()),
            result = self.download(parsed) => result,
        }
    }
}

fn too_large(max_bytes: u64, actual: u64) -> RenderError {
    RenderError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> RenderError {
    if err.is_timeout() {
        return RenderError::new(FailureKind::Timeout, err.to_string());
    }
    RenderError::new(FailureKind::Network, err.to_string())
}
