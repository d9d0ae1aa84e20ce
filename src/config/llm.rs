use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// The provider list is owned by the backend; anything it reports beyond the
/// two known providers is carried as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LlmProvider {
    OpenAi,
    Ollama,
    Other(String),
}

impl From<String> for LlmProvider {
    fn from(value: String) -> Self {
        match value.as_str() {
            "openai" => LlmProvider::OpenAi,
            "ollama" => LlmProvider::Ollama,
            _ => LlmProvider::Other(value),
        }
    }
}

impl From<LlmProvider> for String {
    fn from(value: LlmProvider) -> Self {
        match value {
            LlmProvider::OpenAi => "openai".into(),
            LlmProvider::Ollama => "ollama".into(),
            LlmProvider::Other(v) => v,
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::OpenAi => write!(f, "openai"),
            LlmProvider::Ollama => write!(f, "ollama"),
            LlmProvider::Other(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub llm_provider: LlmProvider,
    #[serde(default)]
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ollama_base_url: Option<String>,
}

impl LlmConfig {
    /// Checked before the settings are submitted; nothing goes on the wire
    /// when this fails.
    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            bail!("Model name is required");
        }
        if self.llm_provider == LlmProvider::Ollama
            && self
                .ollama_base_url
                .as_deref()
                .map_or(true, |v| v.trim().is_empty())
        {
            bail!("Ollama base URL is required when the provider is ollama");
        }
        Ok(())
    }
}
