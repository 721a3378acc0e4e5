//! Command dispatch over the three stores.

use std::sync::Arc;

use chrono::Local;
use colored::Colorize;
use ghostenergy_application::{ChatSessionManager, LoadOutcome, SendOutcome, SessionStore, SiteDataLoader};
use ghostenergy_core::auth::Navigation;
use ghostenergy_infrastructure::{ClientConfig, HttpApiClient, JsonFileKeyValueStore};

use crate::command::Command;
use crate::render;

/// Whether the REPL keeps running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    session: SessionStore,
    sites: SiteDataLoader,
    chat: ChatSessionManager,
}

impl App {
    /// Wires the HTTP client and file storage into the stores.
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let client = Arc::new(HttpApiClient::new(config)?);
        let storage = Arc::new(JsonFileKeyValueStore::new(config.resolve_storage_file()?));
        tracing::debug!("API at {}", client.api_base());

        Ok(Self {
            session: SessionStore::new(storage, client.clone()),
            sites: SiteDataLoader::new(client.clone(), config.stale_loads),
            chat: ChatSessionManager::new(client),
        })
    }

    /// Restores a stored session and, if there is one, loads the dashboard.
    pub async fn start(&self) -> anyhow::Result<()> {
        match self.session.restore().await? {
            Some(user) => {
                println!("{}", format!("Welcome back, {} ({})", user.name, user.role).bright_green());
                self.open_dashboard().await;
            }
            None => println!("{}", "Sign in with /login <user> <password>".bright_black()),
        }
        Ok(())
    }

    pub async fn handle(&self, command: Command) -> Flow {
        if command.requires_auth() && !self.session.is_authenticated().await {
            println!("{}", "Please /login first.".yellow());
            return Flow::Continue;
        }

        match command {
            Command::Login { username, password } => match self.session.login(&username, &password).await {
                Ok(Navigation::Dashboard) => {
                    if let Some(user) = self.session.current_user() {
                        println!("{}", format!("Signed in as {}", user.name).bright_green());
                    }
                    self.open_dashboard().await;
                }
                Ok(Navigation::Login) => {}
                Err(_) => {
                    let message = self.session.error_message().unwrap_or_default();
                    println!("{}", message.red());
                }
            },
            Command::Logout => {
                if self.session.logout().await == Navigation::Login {
                    self.reset_user_state();
                    println!("{}", "Signed out.".bright_green());
                }
            }
            Command::Sites => {
                if let Err(e) = self.sites.list_sites().await {
                    println!("{}", e.user_message().red());
                }
                let selected = self.sites.selected_site();
                for site in self.sites.sites() {
                    let marker = if Some(&site) == selected.as_ref() { "*" } else { " " };
                    println!(" {} {}", marker, site);
                }
            }
            Command::Site(id) => {
                if !self.sites.sites().contains(&id) {
                    println!("{}", format!("Unknown site '{}'. See /sites.", id).yellow());
                    return Flow::Continue;
                }
                self.report_load(self.sites.select_site(&id).await);
            }
            Command::Kpis => self.print_snapshot(),
            Command::NewChat => {
                let id = self.chat.create_session();
                println!("{}", format!("New chat {}", render::short_id(&id)).bright_black());
            }
            Command::Chats => {
                let sessions = self.chat.sessions();
                let active = self.chat.active_session_id();
                for line in render::session_lines(&sessions, active.as_deref(), &Local::now()) {
                    println!("{}", line);
                }
            }
            Command::Open(prefix) => self.open_chat(&prefix),
            Command::Health => match self.sites.health().await {
                Ok(health) if health.is_online() => println!("{}", format!("online: {}", health.message).green()),
                Ok(health) => println!("{}", format!("status '{}': {}", health.status, health.message).yellow()),
                Err(e) => println!("{}", format!("offline: {}", e.user_message()).red()),
            },
            Command::Ask(text) => self.ask(&text).await,
            Command::Usage(usage) => println!("{}", format!("Usage: {}", usage).yellow()),
            Command::Unknown(name) => println!("{}", format!("Unknown command {}", name).bright_black()),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Drops the dashboard data and chats of the user who just signed out.
    fn reset_user_state(&self) {
        self.sites.reset();
        self.chat.reset();
    }

    async fn open_dashboard(&self) {
        match self.sites.load_initial().await {
            Ok(Some(outcome)) => self.report_load(outcome),
            Ok(None) => println!("{}", "No sites available.".yellow()),
            Err(_) => self.print_snapshot(),
        }
    }

    fn report_load(&self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Discarded => {}
            LoadOutcome::Applied | LoadOutcome::Failed(_) => self.print_snapshot(),
        }
    }

    fn print_snapshot(&self) {
        for line in render::snapshot_lines(&self.sites.snapshot()) {
            println!("{}", line);
        }
    }

    fn open_chat(&self, prefix: &str) {
        let matches: Vec<String> = self
            .chat
            .sessions()
            .into_iter()
            .map(|s| s.id)
            .filter(|id| id.starts_with(prefix))
            .collect();

        match matches.as_slice() {
            [id] if self.chat.select_session(id) => {
                for message in self.chat.current_messages() {
                    println!("{}", render::message_line(&message));
                }
            }
            [] | [_] => println!("{}", format!("No chat matches '{}'", prefix).yellow()),
            _ => println!("{}", format!("'{}' matches several chats", prefix).yellow()),
        }
    }

    async fn ask(&self, text: &str) {
        let site = self.sites.selected_site().unwrap_or_default();
        let outcome = self.chat.send_message(text, &site).await;

        if outcome == SendOutcome::Ignored {
            println!("{}", "Still waiting for the previous answer.".bright_black());
            return;
        }
        if let Some(reply) = self.chat.current_messages().last() {
            for line in render::message_line(reply).lines() {
                println!("{}", line);
            }
        }
    }
}
