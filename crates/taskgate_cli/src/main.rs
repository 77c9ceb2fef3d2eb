use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use std::sync::Arc;
use taskgate_cli::cli::{
    Cli, ConfigOverrideTarget, FilterCommand, ShellCommand, ShellLine, UserCommand,
    parse_config_override, parse_failure, split_command_line,
};
use taskgate_core::config::{self, Config, ConfigOverrides};
use taskgate_core::error::AppError;
use taskgate_core::filter::{FilterStrategy, HighPriority, NameContains, PriorityIs};
use taskgate_core::model::{Priority, Task};
use taskgate_core::service::TaskService;
use taskgate_core::user::{ServiceWiring, TaskUser, User, UserFactory};
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Users created during one process run plus the wiring used to give them a
/// task service. Nothing here outlives the process.
struct Shell {
    users: Vec<User>,
    active: usize,
    factory: UserFactory,
    wiring: ServiceWiring,
    shared: Arc<TaskService>,
    json: bool,
}

impl Shell {
    fn from_config(config: &Config, json: bool) -> Result<Self, AppError> {
        let wiring = config.wiring()?;
        let factory = config.user_factory();
        let shared = Arc::new(TaskService::in_memory());
        let first = factory.create_user_with_role(
            config.role()?,
            config.user_name(),
            wiring.service_for(&shared),
        )?;

        Ok(Self {
            users: vec![first],
            active: 0,
            factory,
            wiring,
            shared,
            json,
        })
    }

    fn active(&self) -> &User {
        &self.users[self.active]
    }

    fn active_mut(&mut self) -> &mut User {
        &mut self.users[self.active]
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.users.iter().position(|user| user.name() == name.trim())
    }

    fn run(&mut self, line: ShellLine) -> Result<(), AppError> {
        let json = self.json || line.json;

        match line.command {
            ShellCommand::Login => {
                self.active_mut().login();
                print_user(self.active(), json, "Logged in");
            }
            ShellCommand::Logout => {
                self.active_mut().logout();
                print_user(self.active(), json, "Logged out");
            }
            ShellCommand::Whoami => print_user(self.active(), json, "Active user"),
            ShellCommand::Add { name, priority } => {
                let name = match name {
                    Some(value) if !value.trim().is_empty() => value,
                    _ => return Err(AppError::invalid_input("task name is required")),
                };
                let priority = priority.parse::<Priority>()?;

                let task = self.active().add_task(&name, priority)?;
                if json {
                    print_json(&task)?;
                } else {
                    println!("Added task: {} ({})", task.name(), task.id());
                }
            }
            ShellCommand::List => print_tasks(&self.active().get_all_tasks(), json)?,
            ShellCommand::High => {
                print_tasks(&self.active().filter_tasks(&HighPriority), json)?;
            }
            ShellCommand::Filter { filter } => {
                let strategy: Box<dyn FilterStrategy> = match filter {
                    FilterCommand::High => Box::new(HighPriority),
                    FilterCommand::Low => Box::new(PriorityIs(Priority::Low)),
                    FilterCommand::Name { text } => Box::new(NameContains::new(&text)),
                };
                print_tasks(&self.active().filter_tasks(strategy.as_ref()), json)?;
            }
            ShellCommand::Show { id } => {
                let user = self.active();
                let admin = user.as_admin().ok_or_else(|| {
                    AppError::permission_denied(format!(
                        "user '{}' ({}) cannot look up tasks by id",
                        user.name(),
                        user.role()
                    ))
                })?;

                match admin.get_task_by_id(&id) {
                    Some(task) if json => print_json(&task)?,
                    Some(task) => print_tasks(std::slice::from_ref(&task), false)?,
                    None if json => println!("null"),
                    None => println!("Task not found: {id}"),
                }
            }
            ShellCommand::User { user } => self.run_user_command(user, json)?,
        }

        Ok(())
    }

    fn run_user_command(&mut self, command: UserCommand, json: bool) -> Result<(), AppError> {
        match command {
            UserCommand::Add { role, name } => {
                if self.position_of(&name).is_some() {
                    return Err(AppError::invalid_input(format!(
                        "user '{}' already exists",
                        name.trim()
                    )));
                }
                let service = self.wiring.service_for(&self.shared);
                let user = self.factory.create_user(&role, &name, service)?;
                self.users.push(user);
                self.active = self.users.len() - 1;
                print_user(self.active(), json, "Created user");
            }
            UserCommand::Switch { name } => {
                let index = self.position_of(&name).ok_or_else(|| {
                    AppError::invalid_input(format!("unknown user '{}'", name.trim()))
                })?;
                self.active = index;
                print_user(self.active(), json, "Switched to");
            }
            UserCommand::List => {
                if json {
                    let payload: Vec<serde_json::Value> =
                        self.users.iter().map(user_json).collect();
                    println!("{}", serde_json::Value::Array(payload));
                } else {
                    for (index, user) in self.users.iter().enumerate() {
                        let marker = if index == self.active { "*" } else { " " };
                        println!("{} {}", marker, describe_user(user));
                    }
                }
            }
        }

        Ok(())
    }
}

fn describe_user(user: &User) -> String {
    let state = if user.is_logged_in() {
        "logged in"
    } else {
        "logged out"
    };
    format!("{} ({}, {})", user.name(), user.role(), state)
}

fn user_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "name": user.name(),
        "role": user.role(),
        "logged_in": user.is_logged_in(),
    })
}

fn print_user(user: &User, json: bool, label: &str) {
    if json {
        println!("{}", user_json(user));
    } else {
        println!("{}: {}", label, describe_user(user));
    }
}

fn print_json(task: &Task) -> Result<(), AppError> {
    let value =
        serde_json::to_value(task).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{value}");
    Ok(())
}

fn print_tasks(tasks: &[Task], json: bool) -> Result<(), AppError> {
    if json {
        let value =
            serde_json::to_value(tasks).map_err(|err| AppError::invalid_data(err.to_string()))?;
        println!("{value}");
        return Ok(());
    }

    for task in tasks {
        let created_at = task
            .created_at()
            .format(&Rfc3339)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        println!(
            "{} | {} | {} | {}",
            task.id(),
            task.name(),
            task.priority(),
            created_at
        );
    }

    Ok(())
}

fn print_help() {
    let mut cmd = ShellLine::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_interactive(shell: &mut Shell) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskgate".to_string());
        argv.extend(args);

        let parsed = match ShellLine::try_parse_from(argv) {
            Ok(parsed) => parsed,
            Err(err) if !err.use_stderr() => {
                println!("{err}");
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", parse_failure(&err));
                continue;
            }
        };

        if let Err(err) = shell.run(parsed) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "falling back to default configuration");
        eprintln!("WARNING: {}", err);
    }

    let mut overrides = ConfigOverrides::default();
    for raw in &cli.config_override {
        let parsed = parse_config_override(raw).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::User => overrides.user = Some(parsed.value),
            ConfigOverrideTarget::Role => overrides.role = Some(parsed.value),
            ConfigOverrideTarget::Wiring => overrides.wiring = Some(parsed.value),
            ConfigOverrideTarget::StartLoggedIn => {
                overrides.start_logged_in = Some(parsed.value == "true");
            }
        }
    }
    if let Some(user) = cli.user.as_ref() {
        overrides.user = Some(user.clone());
    }
    if let Some(role) = cli.role.as_ref() {
        overrides.role = Some(role.clone());
    }

    Ok(config::merge_overrides(&loaded.config, &overrides))
}

fn init_tracing() {
    // Opt-in through RUST_LOG; logs go to stderr so stdout stays parseable.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            eprintln!("ERROR: {}", parse_failure(&err));
            std::process::exit(1);
        }
    };

    let shell = resolve_config(&cli).and_then(|config| Shell::from_config(&config, cli.json));
    let mut shell = match shell {
        Ok(shell) => shell,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = run_interactive(&mut shell) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
