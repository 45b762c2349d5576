use crate::errors::{AppError, AppResult};
use crate::models::{
    timestamp_now, PendingGroups, Priority, SearchQuery, Snapshot, TaskRecord, TaskSnapshot,
};
use crate::services::policy;

/// Filters for the completed-task search. `None` imposes no constraint.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaskFilter {
    pub text: Option<String>,
    pub date: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    /// Normalizes raw search input: blanks are dropped, text is trimmed and lower-cased.
    pub fn from_search(query: &SearchQuery) -> AppResult<Self> {
        fn present(value: &Option<String>) -> Option<String> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
        }

        let priority = present(&query.priority)
            .map(|p| p.parse::<Priority>())
            .transpose()
            .map_err(AppError::InvalidInput)?;

        Ok(Self {
            text: present(&query.text).map(|t| t.to_lowercase()),
            date: present(&query.date),
            priority,
        })
    }

    pub fn is_active(&self) -> bool {
        self.text.is_some() || self.date.is_some() || self.priority.is_some()
    }

    fn matches(&self, task: &TaskRecord) -> bool {
        if let Some(text) = &self.text {
            if !task.text.to_lowercase().contains(text.as_str()) {
                return false;
            }
        }
        if let Some(date) = &self.date {
            if task.date.as_deref() != Some(date.as_str()) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        true
    }
}

/// The authoritative in-memory task collection.
///
/// The id counter is derived from the loaded records, never persisted on its own.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<TaskRecord>,
    counter: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the collection wholesale and reseeds the id counter.
    pub fn load(&mut self, records: Vec<TaskRecord>) {
        self.counter = records.iter().map(|t| t.id).max().unwrap_or(0);
        self.tasks = records;
        tracing::debug!("Loaded {} tasks, id counter at {}", self.tasks.len(), self.counter);
    }

    pub fn create(
        &mut self,
        text: &str,
        date: Option<String>,
        priority: Priority,
        acting_user: &str,
    ) -> AppResult<TaskRecord> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidInput("Task description cannot be empty".into()));
        }

        self.counter += 1;
        let task = TaskRecord {
            id: self.counter,
            text: text.to_string(),
            date: date.filter(|d| !d.trim().is_empty()),
            priority,
            additional_info: String::new(),
            is_completed: false,
            last_modified_by: acting_user.to_string(),
            last_modified_date: timestamp_now(),
        };
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Completed tasks keep their priority; the note and attribution always change.
    pub fn edit(
        &mut self,
        id: u64,
        additional_info: &str,
        priority: Priority,
        acting_user: &str,
    ) -> AppResult<TaskRecord> {
        let task = self.find_mut(id)?;
        task.additional_info = additional_info.trim().to_string();
        if !task.is_completed {
            task.priority = priority;
        }
        task.touch(acting_user);
        Ok(task.clone())
    }

    pub fn complete(&mut self, id: u64, acting_user: &str) -> AppResult<TaskRecord> {
        self.set_completed(id, true, acting_user)
    }

    pub fn revert(&mut self, id: u64, acting_user: &str) -> AppResult<TaskRecord> {
        self.set_completed(id, false, acting_user)
    }

    fn set_completed(&mut self, id: u64, completed: bool, acting_user: &str) -> AppResult<TaskRecord> {
        let task = self.find_mut(id)?;
        task.is_completed = completed;
        task.touch(acting_user);
        Ok(task.clone())
    }

    pub fn delete(&mut self, id: u64, acting_user: &str, is_principal: bool) -> AppResult<TaskRecord> {
        let index = self.position(id)?;
        if !policy::can_delete_task(&self.tasks[index], acting_user, is_principal) {
            return Err(AppError::Forbidden(
                "Only the principal account can delete completed tasks".into(),
            ));
        }
        Ok(self.tasks.remove(index))
    }

    /// Removes every task last attributed to `username`, returning how many went.
    pub fn cascade_delete_by_user(&mut self, username: &str) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.last_modified_by != username);
        before - self.tasks.len()
    }

    /// Completed tasks matching every supplied filter, in collection order.
    pub fn query(&self, filter: &TaskFilter) -> Vec<TaskRecord> {
        self.tasks
            .iter()
            .filter(|t| t.is_completed && filter.matches(t))
            .cloned()
            .collect()
    }

    pub fn pending_grouped_by_priority(&self) -> PendingGroups {
        let mut groups = PendingGroups::default();
        for task in self.tasks.iter().filter(|t| !t.is_completed) {
            groups.push(task.clone());
        }
        groups
    }

    #[cfg(test)]
    pub fn get(&self, id: u64) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        Snapshot::new(self.tasks.clone())
    }

    fn position(&self, id: u64) -> AppResult<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Task {} not found", id)))
    }

    fn find_mut(&mut self, id: u64) -> AppResult<&mut TaskRecord> {
        let index = self.position(id)?;
        Ok(&mut self.tasks[index])
    }
}
