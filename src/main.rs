mod chat;
mod cli;
mod client;
mod config;
mod logger;
mod repl;
mod sync;
#[cfg(test)]
mod testutil;
mod utils;

use crate::cli::Cli;
use crate::client::DashboardClient;
use crate::config::{parse_payload, Config, GlobalConfig};
use crate::repl::{Repl, ReplCmdHandler};
use crate::sync::Synchronizer;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use inquire::Confirm;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::setup_logger()?;
    let config = Config::init_shared()?;
    if let Some(server_url) = &cli.server_url {
        config.write().server_url = server_url.clone();
    }
    let client = DashboardClient::init(&config.read().server_url)?;
    let sync = Synchronizer::new(config.clone(), client.clone());

    if cli.info {
        let info = config.read().info()?;
        print!("{info}");
        return Ok(());
    }
    if let Some(file) = &cli.import {
        return import_and_save(&config, &sync, file, cli.yes).await;
    }
    if cli.list_servers {
        sync.refresh().await?;
        print!("{}", config.read().render_servers());
        return Ok(());
    }
    if cli.list_tools {
        let tools = client.get_tools(false).await?;
        config.write().tools = tools;
        print!("{}", config.read().render_tools());
        return Ok(());
    }
    if cli.status {
        let status = client.server_status().await?;
        config.write().status = status;
        print!("{}", config.read().render_status());
        return Ok(());
    }

    match cli.text()? {
        Some(text) => start_directive(&config, &client, &text).await,
        None => start_interactive(config, client, sync).await,
    }
}

async fn start_directive(
    config: &GlobalConfig,
    client: &DashboardClient,
    input: &str,
) -> Result<()> {
    let id = config.write().transcript.begin(input);
    match client.chat(input).await {
        Ok(reply) => {
            config.write().transcript.resolve(id, &reply);
            println!("{}", reply.trim_end());
            config.read().save_message(input, &reply)
        }
        Err(err) => {
            let hint = err.hint();
            config
                .write()
                .transcript
                .fail(id, &err.to_string(), hint.map(|v| v.to_string()));
            match hint {
                Some(hint) => Err(anyhow!("{err} ({hint})")),
                None => Err(err.into()),
            }
        }
    }
}

async fn start_interactive(
    config: GlobalConfig,
    client: DashboardClient,
    sync: Synchronizer,
) -> Result<()> {
    // best effort; the REPL stays usable against an unreachable backend
    if let Err(err) = sync.refresh().await {
        print_now!("Warning: failed to load configuration: {err}\n");
    }
    let mut repl = Repl::init(&config)?;
    let handler = Arc::new(ReplCmdHandler::init(config, client, sync));
    repl.run(handler).await
}

async fn import_and_save(
    config: &GlobalConfig,
    sync: &Synchronizer,
    file: &str,
    yes: bool,
) -> Result<()> {
    // merge into the backend's current configuration, not an empty store
    sync.refresh().await?;
    let text = std::fs::read_to_string(file).with_context(|| format!("Failed to read {file}"))?;
    let candidates = parse_payload(&text)?.into_candidates();
    let imported = config.write().import_servers(candidates, |name| {
        if yes {
            Ok(true)
        } else {
            Confirm::new(&format!("Server \"{name}\" already exists. Overwrite?"))
                .with_default(false)
                .prompt()
                .map_err(Into::into)
        }
    })?;
    if imported == 0 {
        println!("No valid server configurations found.");
        return Ok(());
    }
    let report = sync.save().await?;
    let label = if imported == 1 { "server" } else { "servers" };
    println!("Imported {imported} {label} and saved.");
    if !report.reinitialized {
        eprintln!("Reinitialization failed; the agent is still running with the previous configuration.");
    }
    Ok(())
}
