use crate::config::{LlmConfig, McpConfig};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the bucket legacy flat tool lists are filed under.
const LEGACY_TOOLS_BUCKET: &str = "tools";

pub type ToolsByServer = IndexMap<String, Vec<ToolInfo>>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to reach the dashboard backend: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{message}")]
    Status { code: u16, message: String },
    /// The backend answered `success: false` with its own error string.
    #[error("{0}")]
    Backend(String),
}

impl ClientError {
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ClientError::Status { code: 500 | 503, .. } => {
                Some("the agent backend may still be initializing; try again in a moment")
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: HttpClient,
    base_url: String,
}

impl DashboardClient {
    pub fn init(base_url: &str) -> Result<Self> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .with_context(|| "Failed to build http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn chat(&self, message: &str) -> Result<String, ClientError> {
        let res = self
            .http
            .post(self.endpoint("/chat"))
            .json(&json!({ "message": message }))
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            // the error body may still carry a human-readable `response`
            let message = res
                .json::<ChatPayload>()
                .await
                .map(|v| v.response)
                .unwrap_or_else(|_| format!("chat request failed with HTTP {}", status.as_u16()));
            return Err(ClientError::Status {
                code: status.as_u16(),
                message,
            });
        }
        Ok(res.json::<ChatPayload>().await?.response)
    }

    pub async fn get_config(&self) -> Result<McpConfig, ClientError> {
        self.get_json("/api/config").await
    }

    pub async fn save_config(&self, config: &McpConfig) -> Result<(), ClientError> {
        self.post_acked("/api/config", config).await
    }

    pub async fn get_tools(&self, refresh: bool) -> Result<ToolsByServer, ClientError> {
        let mut req = self.http.get(self.endpoint("/api/tools"));
        if refresh {
            req = req.query(&[("refresh", "true")]);
        }
        let res = req.send().await?;
        let payload: ToolsPayload = Self::ensure_status(res, "/api/tools")?.json().await?;
        Ok(match payload {
            ToolsPayload::ByServer(tools) => tools,
            ToolsPayload::Flat(tools) => IndexMap::from([(LEGACY_TOOLS_BUCKET.to_string(), tools)]),
        })
    }

    pub async fn get_env(&self) -> Result<String, ClientError> {
        let payload: EnvPayload = self.get_json("/api/env").await?;
        Ok(payload.content)
    }

    pub async fn save_env(&self, content: &str) -> Result<(), ClientError> {
        self.post_acked("/api/env", &json!({ "content": content })).await
    }

    pub async fn get_llm_config(&self) -> Result<LlmConfig, ClientError> {
        self.get_json("/api/llm_config").await
    }

    pub async fn save_llm_config(&self, config: &LlmConfig) -> Result<(), ClientError> {
        self.post_acked("/api/llm_config", config).await
    }

    /// Ask the backend to reconnect its MCP servers and rebuild the agent.
    /// Slow and fallible; there is deliberately no timeout and no retry.
    pub async fn reinitialize(&self) -> Result<(), ClientError> {
        let res = self.http.post(self.endpoint("/api/init")).send().await?;
        Self::ack(res, "/api/init").await
    }

    pub async fn server_status(&self) -> Result<ServerStatus, ClientError> {
        self.get_json("/api/server-status").await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let res = self.http.get(self.endpoint(path)).send().await?;
        Ok(Self::ensure_status(res, path)?.json().await?)
    }

    async fn post_acked<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(), ClientError> {
        let res = self.http.post(self.endpoint(path)).json(body).send().await?;
        Self::ack(res, path).await
    }

    async fn ack(res: Response, path: &str) -> Result<(), ClientError> {
        let ack: Ack = Self::ensure_status(res, path)?.json().await?;
        if ack.success {
            Ok(())
        } else {
            Err(ClientError::Backend(
                ack.error.unwrap_or_else(|| "unknown server error".to_string()),
            ))
        }
    }

    fn ensure_status(res: Response, path: &str) -> Result<Response, ClientError> {
        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else {
            Err(ClientError::Status {
                code: status.as_u16(),
                message: format!("{path} failed with HTTP {}", status.as_u16()),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatPayload {
    response: String,
}

#[derive(Debug, Deserialize)]
struct Ack {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnvPayload {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolsPayload {
    ByServer(ToolsByServer),
    Flat(Vec<ToolInfo>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub active_servers: Vec<ActiveServer>,
    #[serde(default)]
    pub inactive_servers: Vec<InactiveServer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActiveServer {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InactiveServer {
    pub name: String,
    #[serde(default)]
    pub error: String,
}
