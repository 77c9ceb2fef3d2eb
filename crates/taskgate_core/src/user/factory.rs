use super::{AdminUser, RegularUser, Role, Session, SessionState, User};
use crate::error::AppError;
use crate::service::TaskService;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// How newly created users are wired to a task service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceWiring {
    /// Every user works on the same task list.
    #[default]
    Shared,
    /// Every user gets a private, empty task list.
    Isolated,
}

impl ServiceWiring {
    pub fn service_for(self, shared: &Arc<TaskService>) -> Arc<TaskService> {
        match self {
            Self::Shared => Arc::clone(shared),
            Self::Isolated => Arc::new(TaskService::in_memory()),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Isolated => "isolated",
        }
    }
}

impl fmt::Display for ServiceWiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ServiceWiring {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "isolated" => Ok(Self::Isolated),
            other => Err(AppError::invalid_input(format!(
                "unknown wiring '{other}' (expected shared or isolated)"
            ))),
        }
    }
}

/// Sole construction path for [`User`] values.
#[derive(Debug, Clone)]
pub struct UserFactory {
    logged_in_by_default: bool,
}

impl Default for UserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl UserFactory {
    pub fn new() -> Self {
        Self {
            logged_in_by_default: true,
        }
    }

    pub fn with_logged_in_by_default(mut self, logged_in: bool) -> Self {
        self.logged_in_by_default = logged_in;
        self
    }

    /// Builds a user from a textual role tag.
    ///
    /// Unknown tags fail with `InvalidRole`; retrying with the same tag will
    /// fail again.
    pub fn create_user(
        &self,
        role: &str,
        name: &str,
        service: Arc<TaskService>,
    ) -> Result<User, AppError> {
        let role = role.parse::<Role>()?;
        self.create_user_with_role(role, name, service)
    }

    pub fn create_user_with_role(
        &self,
        role: Role,
        name: &str,
        service: Arc<TaskService>,
    ) -> Result<User, AppError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("user name is required"));
        }

        let state = if self.logged_in_by_default {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        };
        let session = Session::new(trimmed.to_string(), state, service);
        debug!(user = %trimmed, %role, ?state, "user created");

        Ok(match role {
            Role::Regular => User::Regular(RegularUser { session }),
            Role::Admin => User::Admin(AdminUser { session }),
        })
    }
}
