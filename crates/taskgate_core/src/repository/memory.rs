use super::TaskRepository;
use crate::model::Task;
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn add(&self, task: Task) {
        self.tasks.write().push(task);
    }

    fn list(&self) -> Vec<Task> {
        self.tasks.read().clone()
    }

    fn find_by_id(&self, id: &str) -> Option<Task> {
        self.tasks
            .read()
            .iter()
            .find(|task| task.id().as_str() == id)
            .cloned()
    }

    fn len(&self) -> usize {
        self.tasks.read().len()
    }
}
