mod handler;
mod init;

pub use self::handler::{ReplCmd, ReplCmdHandler};
pub use self::init::Repl;

use crate::print_now;

use anyhow::Result;
use reedline::Signal;
use std::sync::Arc;

pub const REPL_COMMANDS: [(&str, &str); 16] = [
    (".help", "Print this help message"),
    (".info", "Print system info"),
    (".servers", "List the configured MCP servers"),
    (".refresh", "Reload the configuration from the server"),
    (".import", "Import servers from pasted JSON or a file"),
    (".delete", "Delete the server at an index"),
    (".save", "Validate and save the configuration"),
    (".env", "Show backend environment variables"),
    (".env edit", "Edit backend environment variables"),
    (".llm", "Show LLM settings"),
    (".llm edit", "Edit LLM settings"),
    (".tools", "List tools grouped by server"),
    (".status", "Show server connection status"),
    (".init", "Reinitialize the agent"),
    (".clear", "Clear the screen"),
    (".exit", "Exit the REPL"),
];

impl Repl {
    pub async fn run(&mut self, handler: Arc<ReplCmdHandler>) -> Result<()> {
        print_now!("Welcome to mcpdash {}\n", env!("CARGO_PKG_VERSION"));
        print_now!("Type \".help\" for more information.\n");
        let mut already_ctrlc = false;
        loop {
            let sig = self.editor.read_line(&self.prompt);
            match sig {
                Ok(Signal::Success(line)) => {
                    already_ctrlc = false;
                    match self.handle_line(&handler, &line).await {
                        Ok(quit) => {
                            if quit {
                                break;
                            }
                        }
                        Err(err) => {
                            let err = format!("{err:?}");
                            print_now!("Error: {}\n\n", err.trim());
                        }
                    }
                }
                Ok(Signal::CtrlC) => {
                    if already_ctrlc {
                        break;
                    }
                    already_ctrlc = true;
                    print_now!("(To exit, press Ctrl+C again or Ctrl+D or type .exit)\n\n");
                }
                Ok(Signal::CtrlD) => {
                    break;
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn handle_line(&mut self, handler: &Arc<ReplCmdHandler>, line: &str) -> Result<bool> {
        let line = line.trim();
        match parse_command(line) {
            Some((cmd, args)) => match cmd {
                ".help" => {
                    dump_repl_help();
                }
                ".exit" => {
                    return Ok(true);
                }
                ".clear" => {
                    self.editor.clear_scrollback()?;
                }
                ".info" => handler.handle(ReplCmd::ViewInfo).await?,
                ".servers" => handler.handle(ReplCmd::ListServers).await?,
                ".refresh" => handler.handle(ReplCmd::Refresh).await?,
                ".import" => {
                    handler
                        .handle(ReplCmd::Import(args.map(|v| v.to_string())))
                        .await?
                }
                ".delete" => match args.and_then(|v| v.parse::<usize>().ok()) {
                    Some(index) => handler.handle(ReplCmd::Delete(index)).await?,
                    None => print_now!("Usage: .delete <index>\n\n"),
                },
                ".save" => handler.handle(ReplCmd::Save).await?,
                ".env" => match args {
                    None => handler.handle(ReplCmd::ShowEnv).await?,
                    Some("edit") => handler.handle(ReplCmd::EditEnv).await?,
                    Some(_) => unknown_command(),
                },
                ".llm" => match args {
                    None => handler.handle(ReplCmd::ShowLlm).await?,
                    Some("edit") => handler.handle(ReplCmd::EditLlm).await?,
                    Some(_) => unknown_command(),
                },
                ".tools" => match args {
                    None => handler.handle(ReplCmd::ShowTools { refresh: false }).await?,
                    Some("refresh") => handler.handle(ReplCmd::ShowTools { refresh: true }).await?,
                    Some(_) => unknown_command(),
                },
                ".status" => handler.handle(ReplCmd::ShowStatus).await?,
                ".init" => handler.handle(ReplCmd::Reinit).await?,
                _ => unknown_command(),
            },
            None => {
                if !line.is_empty() {
                    handler.handle(ReplCmd::Submit(line.to_string())).await?;
                }
            }
        }

        Ok(false)
    }
}

fn parse_command(line: &str) -> Option<(&str, Option<&str>)> {
    if !line.starts_with('.') {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((cmd, tail)) => {
            let args = tail.trim();
            let args = if args.is_empty() { None } else { Some(args) };
            Some((cmd, args))
        }
        None => Some((line, None)),
    }
}

fn unknown_command() {
    print_now!("Unknown command. Type \".help\" for more information.\n\n");
}

fn dump_repl_help() {
    let head = REPL_COMMANDS
        .iter()
        .map(|(name, desc)| format!("{name:<15} {desc}"))
        .collect::<Vec<String>>()
        .join("\n");
    print_now!(
        "{head}\n\nType anything else to chat with the agent.\nPress Ctrl+C to abort readline, Ctrl+D to exit the REPL\n\n",
    );
}
