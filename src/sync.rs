use crate::client::{ClientError, DashboardClient};
use crate::config::{Config, GlobalConfig};

use anyhow::{anyhow, Result};
use log::{error, info};

/// Result of a save round trip. `reinitialized` is false when the
/// configuration was persisted but the backend failed to rebuild the agent;
/// dependent views are stale in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub reinitialized: bool,
}

/// Pushes the validated configuration to the backend and keeps the
/// dependent views (tools, server status, LLM settings) consistent with it.
#[derive(Clone)]
pub struct Synchronizer {
    config: GlobalConfig,
    client: DashboardClient,
}

impl Synchronizer {
    pub fn new(config: GlobalConfig, client: DashboardClient) -> Self {
        Self { config, client }
    }

    /// Validate, persist, reinitialize, re-fetch.
    ///
    /// A backend rejection (`success: false`) aborts before
    /// reinitialization and surfaces the backend's error string; nothing is
    /// re-fetched. A reinitialization failure is reported inline in the
    /// transcript and also skips the re-fetch, leaving the views stale
    /// rather than wrong.
    pub async fn save(&self) -> Result<SaveReport> {
        let validated = self.config.read().validated();
        match self.client.save_config(&validated).await {
            Ok(()) => {}
            Err(ClientError::Backend(error)) => {
                return Err(anyhow!("The server rejected the configuration: {error}"));
            }
            Err(err) => return Err(err.into()),
        }
        info!("saved configuration with {} servers", validated.mcp_servers.len());

        match self.client.reinitialize().await {
            Ok(()) => {
                self.refresh_all().await?;
                Ok(SaveReport { reinitialized: true })
            }
            Err(err) => {
                error!("reinitialization failed: {err}");
                self.config
                    .write()
                    .transcript
                    .push_notice(&format!("Reinitialization failed: {err}"));
                Ok(SaveReport { reinitialized: false })
            }
        }
    }

    /// Remove the entry at `index` and persist the change. The local
    /// deletion happens first and `render` runs on the mutated state before
    /// the round trip; when the save fails the local deletion stays (no
    /// rollback), matching what the next successful load will reconcile.
    pub async fn delete_entry(
        &self,
        index: usize,
        render: impl FnOnce(&Config),
    ) -> Result<SaveReport> {
        let removed = self.config.write().delete_server(index)?;
        info!("deleted server '{}' at index {index}", removed.name);
        render(&self.config.read());
        self.save().await
    }

    /// Re-fetch the configuration and its dependent views.
    pub async fn refresh(&self) -> Result<()> {
        let fetched = self.client.get_config().await?;
        let tools = self.client.get_tools(false).await?;
        let status = self.client.server_status().await?;
        let mut config = self.config.write();
        config.replace_mcp(fetched);
        config.tools = tools;
        config.status = status;
        Ok(())
    }

    /// Unconditional re-fetch after a successful reinitialization: all
    /// dependent remote state is treated as stale.
    pub async fn refresh_all(&self) -> Result<()> {
        let fetched = self.client.get_config().await?;
        let tools = self.client.get_tools(true).await?;
        let status = self.client.server_status().await?;
        let llm = self.client.get_llm_config().await?;
        let mut config = self.config.write();
        config.replace_mcp(fetched);
        config.tools = tools;
        config.status = status;
        config.llm = Some(llm);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatRole;
    use crate::config::Config;
    use crate::testutil::{spawn, MockBackend, SharedBackend};

    use parking_lot::RwLock;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    async fn setup(backend: MockBackend) -> (GlobalConfig, Synchronizer, SharedBackend) {
        let shared = Arc::new(Mutex::new(backend));
        let addr = spawn(shared.clone()).await;
        let config: GlobalConfig = Arc::new(RwLock::new(Config {
            server_url: format!("http://{addr}"),
            save: false,
            ..Default::default()
        }));
        let client = DashboardClient::init(&config.read().server_url).unwrap();
        let sync = Synchronizer::new(config.clone(), client);
        (config, sync, shared)
    }

    fn set_store(config: &GlobalConfig, doc: Value) {
        config.write().mcp = serde_json::from_value(doc).unwrap();
    }

    fn store_names(config: &GlobalConfig) -> Vec<String> {
        config
            .read()
            .mcp
            .mcp_servers
            .iter()
            .map(|v| v.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_save_validates_reinitializes_and_refetches() {
        let mut backend = MockBackend::new();
        backend.tools = json!({ "qa": [{ "name": "answer", "description": "Answer questions" }] });
        backend.status = json!({ "active_servers": [{ "name": "qa" }], "inactive_servers": [] });
        let (config, sync, shared) = setup(backend).await;
        set_store(
            &config,
            json!({
                "mcpServers": [
                    { "name": "qa", "command": "python" },
                    { "name": "draft" },
                ]
            }),
        );

        let report = sync.save().await.unwrap();
        assert!(report.reinitialized);

        {
            let state = shared.lock().unwrap();
            assert_eq!(state.saved.len(), 1);
            assert_eq!(
                state.saved[0],
                json!({ "mcpServers": [{ "name": "qa", "command": "python" }] })
            );
            assert_eq!(state.init_calls, 1);
        }

        // the store now holds the backend's canonical view, views included
        assert_eq!(store_names(&config), vec!["qa"]);
        assert_eq!(config.read().tools["qa"][0].name, "answer");
        assert_eq!(config.read().status.active_servers[0].name, "qa");
        assert!(config.read().llm.is_some());
    }

    #[tokio::test]
    async fn test_backend_rejection_skips_reinit_and_refetch() {
        let mut backend = MockBackend::new();
        backend.reject_save = Some("disk full".into());
        backend.config = json!({ "mcpServers": [{ "name": "remote", "command": "python" }] });
        let (config, sync, shared) = setup(backend).await;
        set_store(&config, json!({ "mcpServers": [{ "name": "local", "command": "python" }] }));

        let err = sync.save().await.unwrap_err();
        assert!(err.to_string().contains("disk full"));

        let state = shared.lock().unwrap();
        assert_eq!(state.init_calls, 0);
        drop(state);
        assert_eq!(store_names(&config), vec!["local"]);
    }

    #[tokio::test]
    async fn test_init_failure_reports_inline_and_keeps_stale_views() {
        let mut backend = MockBackend::new();
        backend.fail_init = Some("spawn failed".into());
        backend.tools = json!({ "qa": [{ "name": "answer" }] });
        let (config, sync, _shared) = setup(backend).await;
        set_store(&config, json!({ "mcpServers": [{ "name": "qa", "command": "python" }] }));

        let report = sync.save().await.unwrap();
        assert!(!report.reinitialized);

        let config = config.read();
        let notice = config
            .transcript
            .entries()
            .iter()
            .rev()
            .find(|v| v.role == ChatRole::Notice)
            .expect("notice entry");
        assert!(notice.text.contains("spawn failed"));
        // dependent views were not re-fetched
        assert!(config.tools.is_empty());
    }

    #[tokio::test]
    async fn test_delete_entry_renders_locally_then_persists() {
        let backend = MockBackend::new();
        let (config, sync, shared) = setup(backend).await;
        set_store(
            &config,
            json!({
                "mcpServers": [
                    { "name": "a", "command": "x" },
                    { "name": "b", "command": "y" },
                    { "name": "c", "command": "z" },
                ]
            }),
        );

        let mut rendered = vec![];
        sync.delete_entry(1, |config| {
            rendered = config
                .mcp
                .mcp_servers
                .iter()
                .map(|v| v.name.clone())
                .collect();
        })
        .await
        .unwrap();

        assert_eq!(rendered, vec!["a", "c"]);
        let state = shared.lock().unwrap();
        assert_eq!(
            state.saved[0],
            json!({ "mcpServers": [{ "name": "a", "command": "x" }, { "name": "c", "command": "z" }] })
        );
    }

    #[tokio::test]
    async fn test_delete_entry_out_of_range_touches_nothing() {
        let backend = MockBackend::new();
        let (config, sync, shared) = setup(backend).await;
        set_store(&config, json!({ "mcpServers": [{ "name": "a", "command": "x" }] }));

        let err = sync.delete_entry(3, |_| {}).await.unwrap_err();
        assert!(err.to_string().contains("No server at index 3"));
        assert_eq!(store_names(&config), vec!["a"]);
        assert!(shared.lock().unwrap().saved.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_replaces_the_store_wholesale() {
        let mut backend = MockBackend::new();
        backend.config = json!({ "mcpServers": [{ "name": "remote", "url": "http://h" }] });
        backend.status =
            json!({ "active_servers": [], "inactive_servers": [{ "name": "remote", "error": "timeout" }] });
        let (config, sync, _shared) = setup(backend).await;
        set_store(&config, json!({ "mcpServers": [{ "name": "local", "command": "x" }] }));

        sync.refresh().await.unwrap();
        assert_eq!(store_names(&config), vec!["remote"]);
        assert_eq!(config.read().status.inactive_servers[0].error, "timeout");
    }
}
