use crate::chat::ChatRole;
use crate::client::DashboardClient;
use crate::config::{parse_env, parse_payload, serialize_env, GlobalConfig, LlmConfig, LlmProvider};
use crate::print_now;
use crate::sync::{SaveReport, Synchronizer};
use crate::utils::truncate_for_log;

use anyhow::{bail, Result};
use inquire::{Confirm, Editor, Select, Text};
use log::{error, info};
use nu_ansi_term::Color;
use std::fs;
use std::path::Path;
use std::time::Instant;

const LOG_TEXT_LIMIT: usize = 200;

pub enum ReplCmd {
    Submit(String),
    ViewInfo,
    ListServers,
    Refresh,
    Import(Option<String>),
    Delete(usize),
    Save,
    ShowEnv,
    EditEnv,
    ShowLlm,
    EditLlm,
    ShowTools { refresh: bool },
    ShowStatus,
    Reinit,
}

pub struct ReplCmdHandler {
    config: GlobalConfig,
    client: DashboardClient,
    sync: Synchronizer,
}

impl ReplCmdHandler {
    pub fn init(config: GlobalConfig, client: DashboardClient, sync: Synchronizer) -> Self {
        Self {
            config,
            client,
            sync,
        }
    }

    pub async fn handle(&self, cmd: ReplCmd) -> Result<()> {
        match cmd {
            ReplCmd::Submit(input) => self.submit(&input).await?,
            ReplCmd::ViewInfo => {
                let output = self.config.read().info()?;
                print_now!("{}\n", output);
            }
            ReplCmd::ListServers => {
                let output = self.config.read().render_servers();
                print_now!("{}\n", output);
            }
            ReplCmd::Refresh => {
                self.sync.refresh().await?;
                let output = self.config.read().render_servers();
                print_now!("{}\n", output);
            }
            ReplCmd::Import(source) => self.import(source).await?,
            ReplCmd::Delete(index) => self.delete(index).await?,
            ReplCmd::Save => {
                let report = self.sync.save().await?;
                self.report_saved(report);
            }
            ReplCmd::ShowEnv => {
                let content = self.client.get_env().await?;
                let vars = parse_env(&content);
                print_now!(
                    "{}({} variables)\n\n",
                    serialize_env(&vars),
                    vars.len()
                );
            }
            ReplCmd::EditEnv => self.edit_env().await?,
            ReplCmd::ShowLlm => {
                let llm = self.client.get_llm_config().await?;
                self.config.write().llm = Some(llm);
                let output = self.config.read().render_llm();
                print_now!("{}\n", output);
            }
            ReplCmd::EditLlm => self.edit_llm().await?,
            ReplCmd::ShowTools { refresh } => {
                let tools = self.client.get_tools(refresh).await?;
                self.config.write().tools = tools;
                let output = self.config.read().render_tools();
                print_now!("{}\n", output);
            }
            ReplCmd::ShowStatus => {
                let status = self.client.server_status().await?;
                self.config.write().status = status;
                let output = self.config.read().render_status();
                print_now!("{}\n", output);
            }
            ReplCmd::Reinit => self.reinit().await?,
        }
        Ok(())
    }

    /// One chat round trip. Sends are serialized: the next prompt is not
    /// read until this returns.
    async fn submit(&self, input: &str) -> Result<()> {
        if input.is_empty() {
            return Ok(());
        }
        let id = self.config.write().transcript.begin(input);
        let started = Instant::now();
        match self.client.chat(input).await {
            Ok(reply) => {
                info!(
                    "chat done: duration_ms={:.1}, user='{}', response='{}'",
                    started.elapsed().as_secs_f64() * 1000.0,
                    truncate_for_log(input, LOG_TEXT_LIMIT),
                    truncate_for_log(&reply, LOG_TEXT_LIMIT),
                );
                self.config.write().transcript.resolve(id, &reply);
                print_now!("{}\n\n", reply.trim_end());
                self.config.read().save_message(input, &reply)?;
            }
            Err(err) => {
                error!("chat failed: {err}");
                let message = err.to_string();
                let hint = err.hint().map(|v| v.to_string());
                self.config
                    .write()
                    .transcript
                    .fail(id, &message, hint.clone());
                print_now!("{}\n", Color::Red.paint(format!("Error: {message}")));
                if let Some(hint) = hint {
                    print_now!("{}\n", Color::DarkGray.paint(format!("({hint})")));
                }
                print_now!("\n");
            }
        }
        Ok(())
    }

    async fn import(&self, source: Option<String>) -> Result<()> {
        let text = match source {
            Some(arg) => {
                let path = Path::new(&arg);
                if path.exists() {
                    fs::read_to_string(path)?
                } else {
                    arg
                }
            }
            None => Editor::new("Paste server configuration JSON:").prompt()?,
        };
        let candidates = parse_payload(&text)?.into_candidates();
        let imported = self.config.write().import_servers(candidates, |name| {
            Confirm::new(&format!("Server \"{name}\" already exists. Overwrite?"))
                .with_default(false)
                .prompt()
                .map_err(Into::into)
        })?;
        if imported == 0 {
            print_now!("No valid server configurations found.\n\n");
        } else {
            let label = if imported == 1 { "server" } else { "servers" };
            print_now!("Imported {imported} {label}. Review with .servers, then .save to persist.\n\n");
        }
        Ok(())
    }

    async fn delete(&self, index: usize) -> Result<()> {
        let name = match self.config.read().server_name(index) {
            Some(name) => name.to_string(),
            None => bail!("No server at index {index}"),
        };
        let ans = Confirm::new(&format!("Are you sure you want to delete server \"{name}\"?"))
            .with_default(false)
            .prompt()?;
        if !ans {
            print_now!("\n");
            return Ok(());
        }
        let report = self
            .sync
            .delete_entry(index, |config| {
                print_now!("{}\n", config.render_servers());
            })
            .await?;
        self.report_saved(report);
        Ok(())
    }

    async fn edit_env(&self) -> Result<()> {
        let current = self.client.get_env().await?;
        let edited = Editor::new("Environment variables (KEY=VALUE per line):")
            .with_predefined_text(&current)
            .prompt()?;
        self.client.save_env(&edited).await?;
        print_now!("Environment saved.\n\n");
        Ok(())
    }

    async fn edit_llm(&self) -> Result<()> {
        let current = match self.client.get_llm_config().await {
            Ok(llm) => Some(llm),
            Err(_) => self.config.read().llm.clone(),
        };
        let providers = vec!["openai", "ollama"];
        let cursor = match current.as_ref().map(|v| &v.llm_provider) {
            Some(LlmProvider::Ollama) => 1,
            _ => 0,
        };
        let provider = Select::new("Provider:", providers)
            .with_starting_cursor(cursor)
            .prompt()?;
        let llm_provider = LlmProvider::from(provider.to_string());

        let mut model_prompt = Text::new("Model name:");
        let current_model = current.as_ref().map(|v| v.model_name.clone()).unwrap_or_default();
        if !current_model.is_empty() {
            model_prompt = model_prompt.with_default(&current_model);
        }
        let model_name = model_prompt.prompt()?;

        let ollama_base_url = if llm_provider == LlmProvider::Ollama {
            let current_url = current
                .as_ref()
                .and_then(|v| v.ollama_base_url.clone())
                .unwrap_or_else(|| "http://localhost:11434/v1".to_string());
            Some(
                Text::new("Ollama base URL:")
                    .with_default(&current_url)
                    .prompt()?,
            )
        } else {
            current.as_ref().and_then(|v| v.ollama_base_url.clone())
        };

        let llm = LlmConfig {
            llm_provider,
            model_name,
            ollama_base_url,
        };
        llm.validate()?;
        self.client.save_llm_config(&llm).await?;
        self.config.write().llm = Some(llm);
        print_now!("LLM settings saved.\n\n");
        Ok(())
    }

    async fn reinit(&self) -> Result<()> {
        match self.client.reinitialize().await {
            Ok(()) => {
                self.sync.refresh_all().await?;
                let active = self.config.read().status.active_servers.len();
                print_now!("Reinitialized: {active} active servers.\n\n");
            }
            Err(err) => {
                error!("reinitialization failed: {err}");
                let notice = format!("Reinitialization failed: {err}");
                self.config.write().transcript.push_notice(&notice);
                print_now!("{}\n\n", Color::Red.paint(notice));
            }
        }
        Ok(())
    }

    fn report_saved(&self, report: SaveReport) {
        if report.reinitialized {
            print_now!("Configuration saved.\n\n");
        } else {
            let notice = self
                .config
                .read()
                .transcript
                .entries()
                .iter()
                .rev()
                .find(|v| v.role == ChatRole::Notice)
                .map(|v| v.text.clone())
                .unwrap_or_else(|| "Reinitialization failed".to_string());
            print_now!("Configuration saved. {}\n\n", Color::Red.paint(notice));
        }
    }
}
