use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single MCP server configuration entry.
///
/// Only `name`, `command`, `args` and `url` are interpreted client-side;
/// anything else the backend stores (env, headers, ...) is carried through
/// untouched and in order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ServerEntry {
    #[serde(default)]
    pub name: String,

    /// Command to execute to start the MCP server (stdio servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Arguments to pass to the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Endpoint of a remote MCP server (http servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ServerEntry {
    /// An entry can be persisted when it is named and launchable, either
    /// via a command or via a url.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && (has_text(&self.command) || has_text(&self.url))
    }

    pub fn summary(&self) -> String {
        match (&self.command, &self.url) {
            (Some(command), _) if !command.is_empty() => {
                let args = self.args.as_deref().unwrap_or_default().join(" ");
                if args.is_empty() {
                    command.clone()
                } else {
                    format!("{command} {args}")
                }
            }
            (_, Some(url)) if !url.is_empty() => url.clone(),
            _ => String::from("<unconfigured>"),
        }
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// The editable configuration document, as served by `GET /api/config`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct McpConfig {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: Vec<ServerEntry>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl McpConfig {
    /// Pure projection used right before every save: keeps only entries
    /// satisfying [`ServerEntry::is_valid`], never mutates the store.
    pub fn validated(&self) -> McpConfig {
        McpConfig {
            mcp_servers: self
                .mcp_servers
                .iter()
                .filter(|v| v.is_valid())
                .cloned()
                .collect(),
            extra: self.extra.clone(),
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.mcp_servers.iter().position(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry(name: &str, command: Option<&str>, url: Option<&str>) -> ServerEntry {
        ServerEntry {
            name: name.into(),
            command: command.map(Into::into),
            url: url.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn test_entry_validity() {
        assert!(entry("a", Some("python"), None).is_valid());
        assert!(entry("a", None, Some("http://localhost:9000/mcp")).is_valid());
        assert!(!entry("a", None, None).is_valid());
        assert!(!entry("", Some("python"), None).is_valid());
        assert!(!entry("  ", Some("python"), None).is_valid());
        assert!(!entry("a", Some(""), Some("")).is_valid());
    }

    #[test]
    fn test_validated_filters_without_mutating() {
        let config = McpConfig {
            mcp_servers: vec![
                entry("a", Some("python"), None),
                entry("", Some("python"), None),
                entry("b", None, None),
                entry("c", None, Some("http://127.0.0.1:8000")),
            ],
            ..Default::default()
        };
        let clean = config.validated();
        let names: Vec<&str> = clean.mcp_servers.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(config.mcp_servers.len(), 4);
    }

    #[test]
    fn test_passthrough_fields_round_trip() {
        let raw = json!({
            "mcpServers": [
                {"name": "naver-search", "command": "python", "args": ["src/naver_mcp_server.py"], "env": {"NAVER_CLIENT_ID": "x"}},
            ],
            "version": 2,
        });
        let config: McpConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(config.mcp_servers[0].extra["env"]["NAVER_CLIENT_ID"], "x");
        assert_eq!(config.extra["version"], 2);
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }
}
