//! Line command parsing.

/// Every slash command the REPL understands with its argument synopsis.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/login", "<user> <password>"),
    ("/logout", ""),
    ("/sites", ""),
    ("/site", "<id>"),
    ("/kpis", ""),
    ("/new", ""),
    ("/chats", ""),
    ("/open", "<id>"),
    ("/health", ""),
    ("/quit", ""),
];

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    Sites,
    Site(String),
    Kpis,
    NewChat,
    Chats,
    Open(String),
    Health,
    Quit,
    /// Plain text for the assistant
    Ask(String),
    /// A command used with the wrong arguments
    Usage(&'static str),
    Unknown(String),
}

impl Command {
    /// Parses a non-empty, trimmed line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') {
            return Command::Ask(line.to_string());
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (name, args.as_slice()) {
            ("/login", [username, password]) => Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            },
            ("/login", _) => Command::Usage("/login <user> <password>"),
            ("/logout", []) => Command::Logout,
            ("/sites", []) => Command::Sites,
            // Site names may contain spaces; keep them as typed.
            ("/site", [_, ..]) => Command::Site(line[name.len()..].trim().to_string()),
            ("/site", []) => Command::Usage("/site <id>"),
            ("/kpis", []) => Command::Kpis,
            ("/new", []) => Command::NewChat,
            ("/chats", []) => Command::Chats,
            ("/open", [id]) => Command::Open(id.to_string()),
            ("/open", _) => Command::Usage("/open <id>"),
            ("/health", []) => Command::Health,
            ("/quit" | "/exit", []) => Command::Quit,
            _ => Command::Unknown(name.to_string()),
        }
    }

    /// Whether the command needs a signed-in user.
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Command::Login { .. }
                | Command::Health
                | Command::Quit
                | Command::Usage(_)
                | Command::Unknown(_)
        )
    }
}
