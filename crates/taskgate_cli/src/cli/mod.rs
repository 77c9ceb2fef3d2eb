use clap::{Parser, Subcommand};
use taskgate_core::error::AppError;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output JSON
    #[arg(long)]
    pub json: bool,

    /// Name of the user the session starts as
    #[arg(long)]
    pub user: Option<String>,

    /// Role of the starting user (regular or admin)
    #[arg(long)]
    pub role: Option<String>,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE")]
    pub config_override: Vec<String>,
}

/// One line typed into the interactive session.
#[derive(Parser, Debug)]
#[command(name = "taskgate", disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,

    /// Output JSON for this command only
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    /// Log the active user in
    ///
    /// Example: login
    Login,
    /// Log the active user out
    ///
    /// Example: logout
    Logout,
    /// Show the active user, role and session state
    ///
    /// Example: whoami
    Whoami,
    /// Add a new task as the active user
    ///
    /// Example: add "Write report" --priority high
    Add {
        name: Option<String>,
        #[arg(short, long, default_value = "low")]
        priority: String,
    },
    /// List every task visible to the active user
    ///
    /// Example: list
    List,
    /// List high priority tasks
    ///
    /// Example: high
    High,
    /// List tasks selected by a filter
    ///
    /// Example: filter low
    /// Example: filter name report
    Filter {
        #[command(subcommand)]
        filter: FilterCommand,
    },
    /// Show a task by id (admin only)
    ///
    /// Example: show task-0a1b2c
    Show { id: String },
    /// Manage session users
    ///
    /// Example: user add admin ada
    /// Example: user switch ada
    User {
        #[command(subcommand)]
        user: UserCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum FilterCommand {
    /// Only high priority tasks
    High,
    /// Only low priority tasks
    Low,
    /// Tasks whose name contains TEXT (case-insensitive)
    Name { text: String },
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user and make it active
    Add { role: String, name: String },
    /// Make an existing user active
    Switch { name: String },
    /// List users in this session
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    User,
    Role,
    Wiring,
    StartLoggedIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let canonical_field = canonical_key(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "user" => ConfigOverrideTarget::User,
        "role" => ConfigOverrideTarget::Role,
        "wiring" => ConfigOverrideTarget::Wiring,
        "start_logged_in" => {
            if !matches!(value.as_str(), "true" | "false") {
                return Err("start_logged_in override must be true or false".to_string());
            }
            ConfigOverrideTarget::StartLoggedIn
        }
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Lowercases a config key and joins its alphanumeric runs with `_`, so
/// `Start-Logged In` and `start_logged_in` name the same field.
fn canonical_key(raw: &str) -> Option<String> {
    let key = raw
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    (!key.is_empty()).then_some(key)
}

/// Splits one shell line into arguments.
///
/// Words may be wrapped in double or single quotes. Inside double quotes `\"`
/// and `\\` are escapes; any other backslash is kept as typed.
pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut word: Option<String> = None;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some('"'), '\\') => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| AppError::invalid_input("unterminated quote in command"))?;
                let word = word.get_or_insert_with(String::new);
                if escaped != '"' && escaped != '\\' {
                    word.push('\\');
                }
                word.push(escaped);
            }
            (Some(open), _) if ch == open => quote = None,
            (Some(_), _) => word.get_or_insert_with(String::new).push(ch),
            (None, '"' | '\'') => {
                quote = Some(ch);
                word.get_or_insert_with(String::new);
            }
            (None, _) if ch.is_whitespace() => args.extend(word.take()),
            (None, _) => word.get_or_insert_with(String::new).push(ch),
        }
    }

    if quote.is_some() {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }
    args.extend(word);

    Ok(args)
}

/// Reduces a clap failure to its one-line summary as an `invalid_input`.
pub fn parse_failure(err: &clap::Error) -> AppError {
    let rendered = err.render().to_string();
    let summary = rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("invalid command");
    AppError::invalid_input(summary.trim_start_matches("error:").trim())
}
