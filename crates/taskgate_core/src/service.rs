use crate::error::AppError;
use crate::filter::{FilterStrategy, HighPriority};
use crate::model::{Priority, Task};
use crate::repository::{InMemoryTaskRepository, TaskRepository};
use tracing::debug;

/// Business rules over a single task repository.
///
/// The service is the only place tasks are minted. It performs no session
/// checks; callers decide who may write.
pub struct TaskService {
    repository: Box<dyn TaskRepository>,
}

impl TaskService {
    pub fn new<R>(repository: R) -> Self
    where
        R: TaskRepository + 'static,
    {
        Self {
            repository: Box::new(repository),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(InMemoryTaskRepository::new())
    }

    pub fn create_task(&self, name: &str, priority: Priority) -> Result<Task, AppError> {
        let task = Task::create(name, priority)?;
        self.repository.add(task.clone());
        debug!(task_id = %task.id(), priority = %priority, "task created");
        Ok(task)
    }

    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.repository.list()
    }

    pub fn get_task_by_id(&self, id: &str) -> Option<Task> {
        self.repository.find_by_id(id)
    }

    pub fn get_high_priority_tasks(&self) -> Vec<Task> {
        HighPriority.filter(&self.get_all_tasks())
    }

    pub fn task_count(&self) -> usize {
        self.repository.len()
    }
}

impl std::fmt::Debug for TaskService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskService")
            .field("task_count", &self.task_count())
            .finish()
    }
}
