//! Stateless authorization rules for board mutations.
use crate::models::TaskRecord;

/// Completed tasks may only be deleted by the principal account.
pub fn can_delete_task(task: &TaskRecord, _acting_user: &str, is_principal: bool) -> bool {
    !(task.is_completed && !is_principal)
}

/// Whether completed tasks should offer a delete action at all.
pub fn can_show_delete_on_completed(is_principal: bool) -> bool {
    is_principal
}

/// Nobody edits or deletes the principal account, and nobody edits or deletes themselves.
pub fn can_edit_or_delete_user(target_username: &str, acting_username: &str, principal: &str) -> bool {
    target_username != principal && target_username != acting_username
}

/// Password changes are allowed on your own account, or wherever user edits are allowed.
pub fn can_change_password(target_username: &str, acting_username: &str, principal: &str) -> bool {
    target_username == acting_username
        || can_edit_or_delete_user(target_username, acting_username, principal)
}

/// User administration is reserved for the principal account.
pub fn can_manage_users(is_principal: bool) -> bool {
    is_principal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn task(is_completed: bool) -> TaskRecord {
        TaskRecord {
            id: 1,
            text: "Call supplier".into(),
            date: None,
            priority: Priority::High,
            additional_info: String::new(),
            is_completed,
            last_modified_by: "alice".into(),
            last_modified_date: String::new(),
        }
    }

    #[test]
    fn completed_task_deletion_needs_principal() {
        assert!(can_delete_task(&task(false), "alice", false));
        assert!(!can_delete_task(&task(true), "alice", false));
        assert!(can_delete_task(&task(true), "TAKEDA", true));
        assert!(can_show_delete_on_completed(true));
        assert!(!can_show_delete_on_completed(false));
    }

    #[test]
    fn principal_and_self_are_protected() {
        assert!(!can_edit_or_delete_user("TAKEDA", "alice", "TAKEDA"));
        assert!(!can_edit_or_delete_user("TAKEDA", "TAKEDA", "TAKEDA"));
        assert!(!can_edit_or_delete_user("alice", "alice", "TAKEDA"));
        assert!(can_edit_or_delete_user("bob", "TAKEDA", "TAKEDA"));
    }

    #[test]
    fn own_password_is_always_changeable() {
        assert!(can_change_password("TAKEDA", "TAKEDA", "TAKEDA"));
        assert!(can_change_password("alice", "alice", "TAKEDA"));
        assert!(!can_change_password("TAKEDA", "alice", "TAKEDA"));
        assert!(can_change_password("bob", "TAKEDA", "TAKEDA"));
    }
}
