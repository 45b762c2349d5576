use serde::{Deserialize, Serialize};
use super::{TaskRecord, UserMap};

/// A whole collection at a point in time, handed to the persistence provider
/// as a single overwrite.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Snapshot<T>(T);

pub type TaskSnapshot = Snapshot<Vec<TaskRecord>>;
pub type UserSnapshot = Snapshot<UserMap>;

impl<T> Snapshot<T> {
    pub fn new(records: T) -> Self {
        Self(records)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}
