mod user;
mod forms;
mod task;
mod snapshot;
mod view;

pub use user::{UserEntry, UserMap, UserRecord};
pub use forms::{
    BoardResponse, BoardView, EditTaskForm, LoginForm, NewTaskForm, PasswordForm, RegisterForm,
    SearchQuery, SearchResponse, SessionInfo,
};
pub use task::{timestamp_now, Priority, TaskRecord};
pub use snapshot::{Snapshot, TaskSnapshot, UserSnapshot};
pub use view::PendingGroups;
