use crate::model::{Priority, Task};

/// Selects a subset of tasks.
///
/// Strategies are pure: `filter` only reads its input, and surviving tasks
/// keep the order they had in the input. Implementors usually only provide
/// `matches`.
pub trait FilterStrategy {
    fn matches(&self, task: &Task) -> bool;

    fn filter(&self, tasks: &[Task]) -> Vec<Task> {
        tasks
            .iter()
            .filter(|task| self.matches(task))
            .cloned()
            .collect()
    }
}

impl<F> FilterStrategy for F
where
    F: Fn(&Task) -> bool,
{
    fn matches(&self, task: &Task) -> bool {
        self(task)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HighPriority;

impl FilterStrategy for HighPriority {
    fn matches(&self, task: &Task) -> bool {
        task.priority() == Priority::High
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PriorityIs(pub Priority);

impl FilterStrategy for PriorityIs {
    fn matches(&self, task: &Task) -> bool {
        task.priority() == self.0
    }
}

/// Case-insensitive substring match on the task name.
#[derive(Debug, Clone)]
pub struct NameContains {
    needle: String,
}

impl NameContains {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.trim().to_lowercase(),
        }
    }
}

impl FilterStrategy for NameContains {
    fn matches(&self, task: &Task) -> bool {
        task.name().to_lowercase().contains(&self.needle)
    }
}
