use super::{McpConfig, ServerEntry};

use anyhow::Result;
use serde_json::{Map, Value};

const SERVERS_FIELD: &str = "mcpServers";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object or array of server configurations")]
    NotAConfig,
}

/// The recognized shapes of a pasted configuration payload, in the order
/// they are probed.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    /// `[{"name": ..}, ..]`
    EntryList(Vec<Value>),
    /// `{"mcpServers": [{"name": ..}, ..], ..}`
    NestedList(Vec<Value>),
    /// `{"mcpServers": {"<name>": {..}, ..}, ..}`
    NestedMap(Map<String, Value>),
    /// a single `{"name": .., "command"|"url": ..}` object
    Single(Map<String, Value>),
    /// `{"<name>": {..}, ..}` at the root
    RootMap(Map<String, Value>),
}

/// Parse raw pasted text into a recognized payload shape. The store is not
/// touched on failure.
pub fn parse_payload(text: &str) -> Result<ImportPayload, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    classify(value)
}

fn classify(value: Value) -> Result<ImportPayload, ImportError> {
    match value {
        Value::Array(items) => Ok(ImportPayload::EntryList(items)),
        Value::Object(mut map) => match map.remove(SERVERS_FIELD) {
            Some(Value::Array(items)) => Ok(ImportPayload::NestedList(items)),
            Some(Value::Object(inner)) => Ok(ImportPayload::NestedMap(inner)),
            other => {
                if let Some(value) = other {
                    map.insert(SERVERS_FIELD.to_string(), value);
                }
                if looks_like_entry(&map) {
                    Ok(ImportPayload::Single(map))
                } else {
                    Ok(ImportPayload::RootMap(map))
                }
            }
        },
        _ => Err(ImportError::NotAConfig),
    }
}

fn looks_like_entry(map: &Map<String, Value>) -> bool {
    map.contains_key("name") && (map.contains_key("url") || map.contains_key("command"))
}

impl ImportPayload {
    /// Reduce the payload to canonical candidate entries. Elements that are
    /// not objects and entries without a name are dropped silently.
    pub fn into_candidates(self) -> Vec<ServerEntry> {
        match self {
            ImportPayload::EntryList(items) | ImportPayload::NestedList(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => entry_from_object(map),
                    _ => None,
                })
                .collect(),
            ImportPayload::NestedMap(map) | ImportPayload::RootMap(map) => map
                .into_iter()
                .filter_map(|(name, config)| entry_from_keyed(name, config))
                .collect(),
            ImportPayload::Single(map) => entry_from_object(map).into_iter().collect(),
        }
    }
}

fn entry_from_object(map: Map<String, Value>) -> Option<ServerEntry> {
    let entry: ServerEntry = serde_json::from_value(Value::Object(map)).ok()?;
    if entry.name.is_empty() {
        return None;
    }
    Some(entry)
}

fn entry_from_keyed(name: String, config: Value) -> Option<ServerEntry> {
    match config {
        Value::Object(map) => {
            // A `name` carried inside the config wins over the outer key.
            let named = map.contains_key("name");
            let mut entry: ServerEntry = serde_json::from_value(Value::Object(map)).ok()?;
            if !named {
                entry.name = name;
            }
            if entry.name.is_empty() {
                return None;
            }
            Some(entry)
        }
        other => {
            let url = match other {
                Value::String(v) => v,
                v => v.to_string(),
            };
            Some(ServerEntry {
                name,
                url: Some(url),
                ..Default::default()
            })
        }
    }
}

/// Merge candidates into the configuration. An existing entry with the same
/// name is replaced in place once `overwrite` agrees; declined candidates
/// are skipped. Returns the number of entries actually imported.
pub fn merge(
    config: &mut McpConfig,
    candidates: Vec<ServerEntry>,
    mut overwrite: impl FnMut(&str) -> Result<bool>,
) -> Result<usize> {
    let mut imported = 0;
    for candidate in candidates {
        if candidate.name.is_empty() {
            continue;
        }
        match config.position(&candidate.name) {
            Some(pos) => {
                if overwrite(&candidate.name)? {
                    config.mcp_servers[pos] = candidate;
                    imported += 1;
                }
            }
            None => {
                config.mcp_servers.push(candidate);
                imported += 1;
            }
        }
    }
    Ok(imported)
}
