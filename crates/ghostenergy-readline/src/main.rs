mod app;
mod command;
mod helper;
mod render;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use ghostenergy_infrastructure::ConfigService;

use crate::app::{App, Flow};
use crate::command::Command;
use crate::helper::CliHelper;

/// Entry point of the GhostEnergy terminal client.
///
/// Logs go to stderr (filter with `RUST_LOG`); conversation and dashboard
/// output go to stdout.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ghostenergy=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigService::load()?;
    let app = App::from_config(&config)?;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== GhostEnergy ===".bright_magenta().bold());
    println!(
        "{}",
        "Commands: /login /logout /sites /site /kpis /new /chats /open /health /quit. Anything else asks the assistant."
            .bright_black()
    );
    println!();

    app.start().await?;

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let command = Command::parse(trimmed);
                // Keep passwords out of the history file.
                if !matches!(command, Command::Login { .. }) {
                    let _ = rl.add_history_entry(trimmed);
                }

                if app.handle(command).await == Flow::Quit {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
