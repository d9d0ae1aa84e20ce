use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use std::io::{stdin, Read};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the dashboard backend
    #[clap(short = 'u', long, value_name = "URL")]
    pub server_url: Option<String>,
    /// Import server configurations from a JSON file and save
    #[clap(long, value_name = "FILE")]
    pub import: Option<String>,
    /// Overwrite duplicate servers without asking
    #[clap(short = 'y', long)]
    pub yes: bool,
    /// List the configured servers
    #[clap(long)]
    pub list_servers: bool,
    /// List tools grouped by server
    #[clap(long)]
    pub list_tools: bool,
    /// Show server connection status
    #[clap(long)]
    pub status: bool,
    /// Display information
    #[clap(long)]
    pub info: bool,
    /// Input text
    #[clap(trailing_var_arg = true)]
    text: Vec<String>,
}

impl Cli {
    pub fn text(&self) -> Result<Option<String>> {
        let mut stdin_text = String::new();
        if !stdin().is_terminal() {
            stdin()
                .read_to_string(&mut stdin_text)
                .context("Invalid stdin pipe")?;
        }
        match self.text.is_empty() {
            true => {
                if stdin_text.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(stdin_text))
                }
            }
            false => {
                let text = self.text.join(" ");
                if stdin_text.is_empty() {
                    Ok(Some(text))
                } else {
                    Ok(Some(format!("{text}\n{stdin_text}")))
                }
            }
        }
    }
}
