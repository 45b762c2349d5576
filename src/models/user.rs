use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserRecord {
    pub password: String,  // Whatever the configured verifier sealed; plaintext by default
}

/// Username to credential mapping, persisted as one document. Keys iterate in
/// byte order, so the admin list and the stored document are sorted by name
/// with uppercase names ahead of lowercase ones.
pub type UserMap = BTreeMap<String, UserRecord>;

/// One row of the admin user list.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub username: String,
    pub is_principal: bool,
    pub is_current_user: bool,
    pub can_edit: bool,
}
