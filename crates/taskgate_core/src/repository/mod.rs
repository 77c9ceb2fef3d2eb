use crate::model::Task;

mod memory;

pub use memory::InMemoryTaskRepository;

/// Storage contract for tasks.
///
/// Implementations keep tasks in insertion order and hand out owned copies,
/// so nothing returned from `list` or `find_by_id` can change stored state.
pub trait TaskRepository: Send + Sync {
    fn add(&self, task: Task);

    fn list(&self) -> Vec<Task>;

    /// Returns `None` when no stored task has the given id.
    fn find_by_id(&self, id: &str) -> Option<Task>;

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
