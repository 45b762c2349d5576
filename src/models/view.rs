use serde::Serialize;
use super::{Priority, TaskRecord};

/// Pending tasks split by priority; each group keeps insertion order.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct PendingGroups {
    pub high: Vec<TaskRecord>,
    pub medium: Vec<TaskRecord>,
    pub low: Vec<TaskRecord>,
}

impl PendingGroups {
    pub(crate) fn push(&mut self, task: TaskRecord) {
        match task.priority {
            Priority::High => self.high.push(task),
            Priority::Medium => self.medium.push(task),
            Priority::Low => self.low.push(task),
        }
    }
}

#[cfg(test)]
impl PendingGroups {
    pub fn group(&self, priority: Priority) -> &[TaskRecord] {
        match priority {
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }

    /// Groups in display order, high first.
    pub fn iter(&self) -> impl Iterator<Item = (Priority, &[TaskRecord])> + '_ {
        Priority::ORDERED.into_iter().map(move |p| (p, self.group(p)))
    }

    pub fn ids(&self, priority: Priority) -> Vec<u64> {
        self.group(priority).iter().map(|t| t.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.medium.is_empty() && self.low.is_empty()
    }
}
