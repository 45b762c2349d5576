use serde::{Deserialize, Serialize};
use super::{Priority, TaskRecord};
use super::view::PendingGroups;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct NewTaskForm {
    pub text: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: Priority,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTaskForm {
    #[serde(default)]
    pub additional_info: String,
    pub priority: Priority,
}

// New tasks default to low, as on the add form
fn default_priority() -> Priority {
    Priority::Low
}

/// Completed-task search parameters. Empty strings count as "no filter".
#[derive(Debug, Deserialize, Default, Clone)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub date: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub tasks: Vec<TaskRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse<T: Serialize> {
    pub data: T,
    pub board: BoardView,
    pub synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BoardView {
    pub pending: PendingGroups,
    pub completed: Vec<TaskRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub current_user: Option<String>,
    pub is_principal: bool,
    pub can_delete_completed: bool,
}
