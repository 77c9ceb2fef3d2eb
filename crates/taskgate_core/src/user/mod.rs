use crate::error::AppError;
use crate::filter::FilterStrategy;
use crate::model::{Priority, Task};
use crate::service::TaskService;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

mod factory;

pub use factory::{ServiceWiring, UserFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Regular,
    Admin,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(Self::Regular),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::invalid_role(format!(
                "unknown role '{raw}' (expected regular or admin)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
}

/// Per-user session: identity, login flag, and the service the user works
/// through. Each user owns its session; only the service may be shared.
#[derive(Debug)]
pub struct Session {
    name: String,
    state: SessionState,
    service: Arc<TaskService>,
}

impl Session {
    fn new(name: String, state: SessionState, service: Arc<TaskService>) -> Self {
        Self {
            name,
            state,
            service,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn service(&self) -> &Arc<TaskService> {
        &self.service
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!(user = %self.name, ?state, "session state changed");
        }
        self.state = state;
    }
}

/// Capabilities shared by every user variant.
///
/// The session is only ever exposed read-only; `login` and `logout` are the
/// sole ways to change it, so a user's name and service stay fixed.
pub trait TaskUser {
    fn session(&self) -> &Session;

    fn role(&self) -> Role;

    fn login(&mut self);

    fn logout(&mut self);

    fn name(&self) -> &str {
        self.session().name()
    }

    fn session_state(&self) -> SessionState {
        self.session().state()
    }

    fn is_logged_in(&self) -> bool {
        self.session_state() == SessionState::LoggedIn
    }

    /// Creates a task through the user's service.
    ///
    /// Fails with `NotAuthenticated` while logged out, leaving the repository
    /// untouched.
    fn add_task(&self, name: &str, priority: Priority) -> Result<Task, AppError> {
        if !self.is_logged_in() {
            warn!(user = %self.name(), "rejected add_task while logged out");
            return Err(AppError::not_authenticated(format!(
                "user '{}' must log in before adding tasks",
                self.name()
            )));
        }
        self.session().service().create_task(name, priority)
    }

    // Reads are not gated on the session.
    fn get_all_tasks(&self) -> Vec<Task> {
        self.session().service().get_all_tasks()
    }

    fn filter_tasks(&self, strategy: &dyn FilterStrategy) -> Vec<Task> {
        strategy.filter(&self.get_all_tasks())
    }
}

#[derive(Debug)]
pub struct RegularUser {
    session: Session,
}

impl TaskUser for RegularUser {
    fn session(&self) -> &Session {
        &self.session
    }

    fn role(&self) -> Role {
        Role::Regular
    }

    fn login(&mut self) {
        self.session.set_state(SessionState::LoggedIn);
    }

    fn logout(&mut self) {
        self.session.set_state(SessionState::LoggedOut);
    }
}

#[derive(Debug)]
pub struct AdminUser {
    session: Session,
}

impl AdminUser {
    pub fn get_task_by_id(&self, id: &str) -> Option<Task> {
        self.session.service().get_task_by_id(id)
    }
}

impl TaskUser for AdminUser {
    fn session(&self) -> &Session {
        &self.session
    }

    fn role(&self) -> Role {
        Role::Admin
    }

    fn login(&mut self) {
        self.session.set_state(SessionState::LoggedIn);
    }

    fn logout(&mut self) {
        self.session.set_state(SessionState::LoggedOut);
    }
}

/// A user of either role. Built only through [`UserFactory`].
#[derive(Debug)]
pub enum User {
    Regular(RegularUser),
    Admin(AdminUser),
}

impl User {
    pub fn as_admin(&self) -> Option<&AdminUser> {
        match self {
            Self::Admin(admin) => Some(admin),
            Self::Regular(_) => None,
        }
    }
}

impl TaskUser for User {
    fn session(&self) -> &Session {
        match self {
            Self::Regular(user) => user.session(),
            Self::Admin(user) => user.session(),
        }
    }

    fn role(&self) -> Role {
        match self {
            Self::Regular(user) => user.role(),
            Self::Admin(user) => user.role(),
        }
    }

    fn login(&mut self) {
        match self {
            Self::Regular(user) => user.login(),
            Self::Admin(user) => user.login(),
        }
    }

    fn logout(&mut self) {
        match self {
            Self::Regular(user) => user.logout(),
            Self::Admin(user) => user.logout(),
        }
    }
}
