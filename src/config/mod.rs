mod env_file;
mod import;
mod llm;
mod server;

pub use self::env_file::{parse_env, serialize_env, EnvVar};
pub use self::import::{merge, parse_payload, ImportError, ImportPayload};
pub use self::llm::{LlmConfig, LlmProvider};
pub use self::server::{McpConfig, ServerEntry};

use crate::chat::Transcript;
use crate::client::{ServerStatus, ToolsByServer};
use crate::utils::{get_env_name, now};

use anyhow::{anyhow, bail, Context, Result};
use nu_ansi_term::Color;
use parking_lot::RwLock;
use serde::Deserialize;
use std::{
    env,
    fs::{create_dir_all, read_to_string, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

const SETTINGS_FILE_NAME: &str = "config.yaml";
const MESSAGES_FILE_NAME: &str = "messages.md";
const HISTORY_FILE_NAME: &str = "history.txt";

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5001";

/// Client-side state: a few file-backed settings plus everything fetched
/// from the dashboard backend for this session. The fetched configuration
/// is replaced wholesale on load and only ever mutated through the named
/// operations below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the dashboard backend
    pub server_url: String,
    /// Whether to append chat exchanges to the messages file
    pub save: bool,
    /// REPL keybindings. values: emacs, vi
    pub keybindings: Keybindings,

    /// The editable server configuration, as last fetched
    #[serde(skip)]
    pub mcp: McpConfig,
    /// LLM settings, as last fetched
    #[serde(skip)]
    pub llm: Option<LlmConfig>,
    /// Tools grouped by server, as last fetched
    #[serde(skip)]
    pub tools: ToolsByServer,
    /// Connection status per server, as last fetched
    #[serde(skip)]
    pub status: ServerStatus,
    #[serde(skip)]
    pub transcript: Transcript,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            save: true,
            keybindings: Default::default(),
            mcp: Default::default(),
            llm: None,
            tools: Default::default(),
            status: Default::default(),
            transcript: Default::default(),
        }
    }
}

pub type GlobalConfig = Arc<RwLock<Config>>;

impl Config {
    pub fn init() -> Result<Self> {
        let settings_path = Self::settings_file()?;
        let mut config = if settings_path.exists() {
            Self::load_settings(&settings_path)?
        } else {
            Self::default()
        };
        if let Ok(server_url) = env::var(get_env_name("server_url")) {
            config.server_url = server_url;
        }
        Ok(config)
    }

    pub fn init_shared() -> Result<GlobalConfig> {
        Ok(Arc::new(RwLock::new(Self::init()?)))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let env_name = get_env_name("config_dir");
        let path = if let Some(v) = env::var_os(env_name) {
            PathBuf::from(v)
        } else {
            let mut dir = dirs::config_dir().ok_or_else(|| anyhow!("Not found config dir"))?;
            dir.push(env!("CARGO_CRATE_NAME"));
            dir
        };
        Ok(path)
    }

    pub fn local_path(name: &str) -> Result<PathBuf> {
        let mut path = Self::config_dir()?;
        path.push(name);
        Ok(path)
    }

    pub fn settings_file() -> Result<PathBuf> {
        Self::local_path(SETTINGS_FILE_NAME)
    }

    pub fn messages_file() -> Result<PathBuf> {
        Self::local_path(MESSAGES_FILE_NAME)
    }

    pub fn history_file() -> Result<PathBuf> {
        Self::local_path(HISTORY_FILE_NAME)
    }

    /// Replace the whole store with a freshly fetched configuration.
    pub fn replace_mcp(&mut self, fetched: McpConfig) {
        self.mcp = fetched;
    }

    /// Merge import candidates into the store; see [`merge`].
    pub fn import_servers(
        &mut self,
        candidates: Vec<ServerEntry>,
        overwrite: impl FnMut(&str) -> Result<bool>,
    ) -> Result<usize> {
        merge(&mut self.mcp, candidates, overwrite)
    }

    /// Remove the entry at `index`; later entries shift down by one, so
    /// callers must not hold on to indices across a delete.
    pub fn delete_server(&mut self, index: usize) -> Result<ServerEntry> {
        if index >= self.mcp.mcp_servers.len() {
            bail!("No server at index {index}");
        }
        Ok(self.mcp.mcp_servers.remove(index))
    }

    pub fn server_name(&self, index: usize) -> Option<&str> {
        self.mcp.mcp_servers.get(index).map(|v| v.name.as_str())
    }

    pub fn validated(&self) -> McpConfig {
        self.mcp.validated()
    }

    pub fn save_message(&self, input: &str, output: &str) -> Result<()> {
        if !self.save || output.is_empty() {
            return Ok(());
        }
        let mut file = Self::open_messages_file()?;
        let timestamp = now();
        let content = format!("# CHAT:[{timestamp}]\n{input}\n--------\n{output}\n--------\n\n");
        file.write_all(content.as_bytes())
            .with_context(|| "Failed to save message")
    }

    pub fn render_servers(&self) -> String {
        if self.mcp.mcp_servers.is_empty() {
            return String::from("No servers configured. Use .import to add some.");
        }
        let mut output = String::new();
        for (index, entry) in self.mcp.mcp_servers.iter().enumerate() {
            let status = self.server_state_label(&entry.name);
            let mut line = format!("{index:>3}  {:<24} {status:<10} {}", entry.name, entry.summary());
            if !entry.is_valid() {
                line.push_str("  (incomplete, will not be saved)");
            }
            output.push_str(&line);
            output.push('\n');
        }
        output
    }

    pub fn render_tools(&self) -> String {
        if self.tools.is_empty() {
            return String::from("No tools available.");
        }
        let mut output = String::new();
        for (server, tools) in &self.tools {
            output.push_str(&format!("{server} ({} tools):\n", tools.len()));
            for tool in tools {
                match tool.description.as_deref() {
                    Some(description) if !description.is_empty() => {
                        output.push_str(&format!("  - {}: {description}\n", tool.name));
                    }
                    _ => output.push_str(&format!("  - {}\n", tool.name)),
                }
            }
        }
        output
    }

    pub fn render_status(&self) -> String {
        if self.status.active_servers.is_empty() && self.status.inactive_servers.is_empty() {
            return String::from("No server status reported.");
        }
        let mut output = String::new();
        for server in &self.status.active_servers {
            output.push_str(&format!(
                "{} {}\n",
                Color::Green.paint("active  "),
                server.name
            ));
        }
        for server in &self.status.inactive_servers {
            output.push_str(&format!(
                "{} {} ({})\n",
                Color::Red.paint("inactive"),
                server.name,
                server.error
            ));
        }
        output
    }

    pub fn render_llm(&self) -> String {
        match self.llm.as_ref() {
            None => String::from("LLM settings not loaded."),
            Some(llm) => {
                let mut output = format!(
                    "provider    {}\nmodel       {}\n",
                    llm.llm_provider, llm.model_name
                );
                if let Some(base_url) = llm.ollama_base_url.as_deref() {
                    output.push_str(&format!("base_url    {base_url}\n"));
                }
                output
            }
        }
    }

    pub fn info(&self) -> Result<String> {
        let path_info = |path: &Path| {
            let state = if path.exists() { "" } else { " ⚠️" };
            format!("{}{state}", path.display())
        };
        let items = vec![
            ("server_url", self.server_url.clone()),
            ("settings_file", path_info(&Self::settings_file()?)),
            ("messages_file", path_info(&Self::messages_file()?)),
            ("servers", self.mcp.mcp_servers.len().to_string()),
            ("save", self.save.to_string()),
            ("keybindings", self.keybindings.stringify().into()),
        ];
        let mut output = String::new();
        for (name, value) in items {
            output.push_str(&format!("{name:<20}{value}\n"));
        }
        Ok(output)
    }

    fn server_state_label(&self, name: &str) -> String {
        if self.status.active_servers.iter().any(|v| v.name == name) {
            Color::Green.paint("active").to_string()
        } else if self.status.inactive_servers.iter().any(|v| v.name == name) {
            Color::Red.paint("inactive").to_string()
        } else {
            String::from("-")
        }
    }

    fn load_settings(path: &Path) -> Result<Self> {
        let ctx = || format!("Failed to load settings at {}", path.display());
        let content = read_to_string(path).with_context(ctx)?;
        let config: Self = serde_yaml::from_str(&content).with_context(ctx)?;
        Ok(config)
    }

    fn open_messages_file() -> Result<File> {
        let path = Self::messages_file()?;
        ensure_parent_exists(&path)?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to create/append {}", path.display()))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub enum Keybindings {
    #[serde(rename = "emacs")]
    #[default]
    Emacs,
    #[serde(rename = "vi")]
    Vi,
}

impl Keybindings {
    pub fn is_vi(&self) -> bool {
        matches!(self, Keybindings::Vi)
    }
    pub fn stringify(&self) -> &str {
        match self {
            Keybindings::Emacs => "emacs",
            Keybindings::Vi => "vi",
        }
    }
}

pub fn ensure_parent_exists(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("Failed to write to {}, No parent path", path.display()))?;
    if !parent.exists() {
        create_dir_all(parent).with_context(|| {
            format!(
                "Failed to write {}, Cannot create parent directory",
                path.display()
            )
        })?;
    }
    Ok(())
}
