use crate::error::AppError;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Last timestamp handed out by [`Task::create`], used to keep creation times
/// non-decreasing even if the wall clock steps backwards.
static LAST_CREATED_AT: Mutex<Option<OffsetDateTime>> = Mutex::new(None);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    fn generate() -> Self {
        Self(format!("task-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            other => Err(AppError::invalid_input(format!(
                "unknown priority '{other}' (expected high or low)"
            ))),
        }
    }
}

/// A unit of work. Every field is fixed once the task has been created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    id: TaskId,
    name: String,
    priority: Priority,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl Task {
    /// Mints a new task with a fresh id and creation timestamp.
    ///
    /// Only the service layer calls this; there is no other way to obtain a
    /// `Task` from outside the crate.
    pub(crate) fn create(name: &str, priority: Priority) -> Result<Self, AppError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("task name is required"));
        }

        Ok(Self {
            id: TaskId::generate(),
            name: trimmed.to_string(),
            priority,
            created_at: next_created_at(),
        })
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

fn next_created_at() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    let mut last = LAST_CREATED_AT.lock();
    let created_at = clamp_to_watermark(*last, now);
    *last = Some(created_at);
    created_at
}

fn clamp_to_watermark(previous: Option<OffsetDateTime>, now: OffsetDateTime) -> OffsetDateTime {
    match previous {
        Some(previous) if previous > now => previous,
        _ => now,
    }
}
