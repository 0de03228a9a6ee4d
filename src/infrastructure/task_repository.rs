use crate::domain::models::Task;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, InfraError>;
    async fn create(&self, task: &Task) -> Result<Task, InfraError>;
    async fn update(&self, task_id: &str, task: &Task) -> Result<Task, InfraError>;
    async fn delete(&self, task_id: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Default)]
struct TaskStore {
    tasks: HashMap<String, Task>,
    order: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    store: Mutex<TaskStore>,
}

impl InMemoryTaskRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, TaskStore>, InfraError> {
        self.store
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("task store lock poisoned: {error}")))
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list(&self) -> Result<Vec<Task>, InfraError> {
        let store = self.lock()?;
        Ok(store
            .order
            .iter()
            .filter_map(|task_id| store.tasks.get(task_id).cloned())
            .collect())
    }

    async fn create(&self, task: &Task) -> Result<Task, InfraError> {
        task.validate().map_err(InfraError::InvalidConfig)?;
        let mut store = self.lock()?;
        if !store.tasks.contains_key(&task.id) {
            store.order.push(task.id.clone());
        }
        store.tasks.insert(task.id.clone(), task.clone());
        Ok(task.clone())
    }

    async fn update(&self, task_id: &str, task: &Task) -> Result<Task, InfraError> {
        task.validate().map_err(InfraError::InvalidConfig)?;
        let mut store = self.lock()?;
        if !store.tasks.contains_key(task_id) {
            return Err(InfraError::TaskNotFound(task_id.to_string()));
        }
        store.tasks.insert(task_id.to_string(), task.clone());
        Ok(task.clone())
    }

    // Deleting an absent task is not an error.
    async fn delete(&self, task_id: &str) -> Result<(), InfraError> {
        let mut store = self.lock()?;
        if store.tasks.remove(task_id).is_some() {
            store.order.retain(|candidate| candidate != task_id);
        }
        Ok(())
    }
}
