use std::sync::Arc;
use tokio::sync::Mutex;
use crate::config::BoardConfig;
use crate::errors::{AppError, AppResult, PersistenceResult};
use crate::models::{BoardView, Priority, TaskRecord, TaskSnapshot, UserEntry};
use crate::services::credentials::{BootstrapSource, CredentialStore, CredentialVerifier};
use crate::services::policy;
use crate::services::session::Session;
use crate::services::sync::{trace_phase, Mutation, SyncCoordinator, SyncOutcome, SyncPhase};
use crate::services::tasks::{TaskFilter, TaskStore};

struct BoardState {
    tasks: TaskStore,
    credentials: CredentialStore,
}

/// The shared board: task and credential state plus the coordinator that persists them.
///
/// Mutations apply to memory under the lock, in call order. The lock is released
/// before the remote write, so pushes from overlapping calls are not ordered.
pub struct Board {
    state: Mutex<BoardState>,
    sync: SyncCoordinator,
    principal: String,
}

impl Board {
    /// Loads users (bootstrapping the principal when none are stored) and the task collection.
    pub async fn bootstrap(
        settings: &BoardConfig,
        sync: SyncCoordinator,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> AppResult<Self> {
        let loaded = sync.pull_users().await;
        let (credentials, source) = CredentialStore::bootstrap_or_load(
            loaded,
            &settings.principal,
            &settings.default_password,
            verifier,
        )?;

        if source == BootstrapSource::Created {
            if let SyncOutcome::Failed(reason) = sync.push_users(credentials.snapshot()).await {
                tracing::warn!("Bootstrap users were not persisted: {}", reason);
            }
        }

        let mut tasks = TaskStore::new();
        tasks.load(sync.pull_tasks().await);
        tracing::info!("Board ready with {} tasks", tasks.len());

        Ok(Self {
            state: Mutex::new(BoardState { tasks, credentials }),
            sync,
            principal: settings.principal.clone(),
        })
    }

    pub fn new_session(&self) -> Session {
        Session::new(self.principal.clone())
    }

    /// Signs in and refreshes the task collection from the store. An unreadable
    /// store does not block the login.
    pub async fn login(&self, session: &mut Session, username: &str, password: &str) -> AppResult<()> {
        {
            let state = self.state.lock().await;
            session.login(&state.credentials, username, password)?;
        }
        if let Err(e) = self.pull().await {
            tracing::warn!("Keeping the current tasks, refresh on login failed: {}", e);
        }
        Ok(())
    }

    pub fn logoff(&self, session: &mut Session) {
        session.logoff();
    }

    /// Rebuilds the session of a user signed in earlier, if the account still exists.
    pub async fn resume(&self, username: &str) -> AppResult<Session> {
        let state = self.state.lock().await;
        if !state.credentials.contains(username) {
            return Err(AppError::Auth(format!("User {} no longer exists", username)));
        }
        Ok(Session::resume(self.principal.clone(), username))
    }

    /// Replaces local tasks with the stored collection, returning how many were loaded.
    /// The current tasks and id counter are kept when the read fails.
    pub async fn pull(&self) -> PersistenceResult<usize> {
        let records = self.sync.read_tasks().await?;
        let mut state = self.state.lock().await;
        state.tasks.load(records);
        Ok(state.tasks.len())
    }

    /// Re-issues whole-collection writes of the current users and tasks.
    /// The value is the number of tasks written.
    pub async fn push(&self) -> Mutation<usize> {
        let (tasks, users, count) = {
            let state = self.state.lock().await;
            (state.tasks.snapshot(), state.credentials.snapshot(), state.tasks.len())
        };
        let users = self.sync.push_users(users).await;
        Mutation { value: count, sync: users.and(self.sync.push_tasks(tasks).await) }
    }

    pub async fn view(&self) -> BoardView {
        let state = self.state.lock().await;
        BoardView {
            pending: state.tasks.pending_grouped_by_priority(),
            completed: state.tasks.query(&TaskFilter::default()),
        }
    }

    pub async fn search(&self, filter: &TaskFilter) -> Vec<TaskRecord> {
        self.state.lock().await.tasks.query(filter)
    }

    pub async fn add_task(
        &self,
        session: &Session,
        text: &str,
        date: Option<String>,
        priority: Priority,
    ) -> AppResult<Mutation<TaskRecord>> {
        let acting = session.require_user()?;
        let (task, snapshot) = {
            let mut state = self.state.lock().await;
            let task = state.tasks.create(text, date, priority, acting)?;
            (task, state.tasks.snapshot())
        };
        tracing::info!("User {} created task {}", acting, task.id);
        Ok(self.commit_tasks(task, snapshot).await)
    }

    pub async fn edit_task(
        &self,
        session: &Session,
        id: u64,
        additional_info: &str,
        priority: Priority,
    ) -> AppResult<Mutation<TaskRecord>> {
        let acting = session.require_user()?;
        let (task, snapshot) = {
            let mut state = self.state.lock().await;
            let task = state.tasks.edit(id, additional_info, priority, acting)?;
            (task, state.tasks.snapshot())
        };
        tracing::info!("User {} edited task {}", acting, id);
        Ok(self.commit_tasks(task, snapshot).await)
    }

    pub async fn complete_task(&self, session: &Session, id: u64) -> AppResult<Mutation<TaskRecord>> {
        let acting = session.require_user()?;
        let (task, snapshot) = {
            let mut state = self.state.lock().await;
            let task = state.tasks.complete(id, acting)?;
            (task, state.tasks.snapshot())
        };
        tracing::info!("User {} completed task {}", acting, id);
        Ok(self.commit_tasks(task, snapshot).await)
    }

    pub async fn revert_task(&self, session: &Session, id: u64) -> AppResult<Mutation<TaskRecord>> {
        let acting = session.require_user()?;
        let (task, snapshot) = {
            let mut state = self.state.lock().await;
            let task = state.tasks.revert(id, acting)?;
            (task, state.tasks.snapshot())
        };
        tracing::info!("User {} reverted task {}", acting, id);
        Ok(self.commit_tasks(task, snapshot).await)
    }

    pub async fn delete_task(&self, session: &Session, id: u64) -> AppResult<Mutation<TaskRecord>> {
        let acting = session.require_user()?;
        let (task, snapshot) = {
            let mut state = self.state.lock().await;
            let task = state.tasks.delete(id, acting, session.is_principal())?;
            (task, state.tasks.snapshot())
        };
        tracing::info!("User {} deleted task {}", acting, id);
        Ok(self.commit_tasks(task, snapshot).await)
    }

    pub async fn list_users(&self, session: &Session) -> AppResult<Vec<UserEntry>> {
        let acting = self.require_admin(session)?;
        Ok(self.state.lock().await.credentials.entries(acting))
    }

    pub async fn register_user(
        &self,
        session: &Session,
        username: &str,
        password: &str,
    ) -> AppResult<Mutation<String>> {
        self.require_admin(session)?;
        let snapshot = {
            let mut state = self.state.lock().await;
            state.credentials.register(username, password)?;
            state.credentials.snapshot()
        };
        let username = username.trim().to_string();
        tracing::info!("Registered user {}", username);
        trace_phase("users", SyncPhase::LocalMutationApplied);
        let sync = self.sync.push_users(snapshot).await;
        Ok(Mutation { value: username, sync })
    }

    pub async fn change_password(
        &self,
        session: &Session,
        username: &str,
        new_password: &str,
    ) -> AppResult<Mutation<()>> {
        let acting = session.require_user()?;
        if username != acting {
            self.require_admin(session)?;
        }
        if !policy::can_change_password(username, acting, &self.principal) {
            return Err(AppError::Forbidden(format!("The password of {} cannot be changed", username)));
        }

        let snapshot = {
            let mut state = self.state.lock().await;
            state.credentials.change_password(username, new_password)?;
            state.credentials.snapshot()
        };
        tracing::info!("User {} changed the password of {}", acting, username);
        trace_phase("users", SyncPhase::LocalMutationApplied);
        let sync = self.sync.push_users(snapshot).await;
        Ok(Mutation { value: (), sync })
    }

    /// Deletes a user and every task last attributed to them. Returns the number of tasks removed.
    pub async fn remove_user(&self, session: &Session, username: &str) -> AppResult<Mutation<usize>> {
        let acting = self.require_admin(session)?;
        let (users, tasks, removed) = {
            let mut state = self.state.lock().await;
            state.credentials.remove(username, Some(acting))?;
            let removed = state.tasks.cascade_delete_by_user(username);
            (state.credentials.snapshot(), state.tasks.snapshot(), removed)
        };
        tracing::info!("User {} removed {} and {} of their tasks", acting, username, removed);

        trace_phase("users", SyncPhase::LocalMutationApplied);
        let users = self.sync.push_users(users).await;
        let tasks = self.commit_tasks(removed, tasks).await;
        Ok(Mutation { value: tasks.value, sync: users.and(tasks.sync) })
    }

    async fn commit_tasks<T>(&self, value: T, snapshot: TaskSnapshot) -> Mutation<T> {
        trace_phase("tasks", SyncPhase::LocalMutationApplied);
        let sync = self.sync.push_tasks(snapshot).await;
        Mutation { value, sync }
    }

    fn require_admin<'s>(&self, session: &'s Session) -> AppResult<&'s str> {
        let acting = session.require_user()?;
        if !policy::can_manage_users(session.is_principal()) {
            return Err(AppError::Forbidden("User administration is reserved for the principal account".into()));
        }
        Ok(acting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Snapshot;
    use crate::services::credentials::PlaintextVerifier;
    use crate::services::provider::PersistenceProvider;
    use crate::services::sync::tests::FlakyProvider;

    async fn board_with(provider: Arc<FlakyProvider>) -> Board {
        let sync = SyncCoordinator::new(provider, None);
        Board::bootstrap(&BoardConfig::default(), sync, Arc::new(PlaintextVerifier))
            .await
            .unwrap()
    }

    async fn signed_in(board: &Board, username: &str, password: &str) -> Session {
        let mut session = board.new_session();
        board.login(&mut session, username, password).await.unwrap();
        session
    }

    #[tokio::test]
    async fn bootstrap_persists_the_principal() {
        let provider = Arc::new(FlakyProvider::default());
        let board = board_with(provider.clone()).await;

        let users = provider.inner.read_users().await.unwrap().unwrap();
        assert_eq!(users.len(), 1);
        assert!(users.contains_key("TAKEDA"));
        signed_in(&board, "TAKEDA", "147369").await;
    }

    #[tokio::test]
    async fn bootstrap_survives_an_unreachable_store() {
        let provider = Arc::new(FlakyProvider::default());
        provider.set_offline(true);
        let board = board_with(provider.clone()).await;

        let session = signed_in(&board, "TAKEDA", "147369").await;
        assert!(session.is_principal());
        assert!(board.view().await.pending.is_empty());

        // Fallback defaults are not written over the store
        provider.set_offline(false);
        assert!(provider.inner.read_users().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mutations_are_attributed_and_persisted() {
        let provider = Arc::new(FlakyProvider::default());
        let board = board_with(provider.clone()).await;
        let admin = signed_in(&board, "TAKEDA", "147369").await;
        board.register_user(&admin, "alice", "pw").await.unwrap().into_result().unwrap();
        let alice = signed_in(&board, "alice", "pw").await;

        let task = board
            .add_task(&alice, "Restock paper", None, Priority::High)
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(task.last_modified_by, "alice");

        let done = board.complete_task(&admin, task.id).await.unwrap();
        assert!(done.is_synced());
        assert_eq!(done.value.last_modified_by, "TAKEDA");

        let stored = provider.inner.read_tasks().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].is_completed);

        assert!(matches!(board.delete_task(&alice, task.id).await, Err(AppError::Forbidden(_))));
        board.revert_task(&alice, task.id).await.unwrap();
        board.delete_task(&alice, task.id).await.unwrap();
        assert!(provider.inner.read_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_push_keeps_the_local_change() {
        let provider = Arc::new(FlakyProvider::default());
        let board = board_with(provider.clone()).await;
        let admin = signed_in(&board, "TAKEDA", "147369").await;

        provider.set_offline(true);
        let mutation = board.add_task(&admin, "Offline task", None, Priority::Low).await.unwrap();
        assert!(!mutation.is_synced());
        assert_eq!(board.view().await.pending.ids(Priority::Low), vec![mutation.value.id]);
        assert!(matches!(board.push().await.into_result(), Err(AppError::Persistence(_))));

        provider.set_offline(false);
        assert_eq!(board.push().await.into_result().unwrap(), 1);
        assert_eq!(provider.inner.read_tasks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_reloads_tasks_and_reseeds_ids() {
        let provider = Arc::new(FlakyProvider::default());
        let board = board_with(provider.clone()).await;

        let stored: Vec<TaskRecord> = serde_json::from_str(
            r#"[{"id": 41, "text": "From another client", "priority": "low"}]"#,
        )
        .unwrap();
        provider.inner.write_tasks(&Snapshot::new(stored)).await.unwrap();

        let admin = signed_in(&board, "TAKEDA", "147369").await;
        assert_eq!(board.view().await.pending.ids(Priority::Low), vec![41]);

        let task = board.add_task(&admin, "Next", None, Priority::Low).await.unwrap();
        assert_eq!(task.value.id, 42);
    }

    #[tokio::test]
    async fn login_during_an_outage_keeps_the_shared_tasks() {
        let provider = Arc::new(FlakyProvider::default());
        let board = board_with(provider.clone()).await;
        let admin = signed_in(&board, "TAKEDA", "147369").await;
        for text in ["One", "Two", "Three"] {
            board.add_task(&admin, text, None, Priority::Medium).await.unwrap().into_result().unwrap();
        }

        provider.set_offline(true);
        signed_in(&board, "TAKEDA", "147369").await;
        assert!(board.pull().await.is_err());
        assert_eq!(board.view().await.pending.ids(Priority::Medium), vec![1, 2, 3]);

        provider.set_offline(false);
        let task = board
            .add_task(&admin, "Four", None, Priority::Medium)
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(task.id, 4);

        let stored: Vec<u64> = provider.inner.read_tasks().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(stored, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn removing_a_user_cascades_to_their_tasks() {
        let provider = Arc::new(FlakyProvider::default());
        let board = board_with(provider.clone()).await;
        let admin = signed_in(&board, "TAKEDA", "147369").await;
        board.register_user(&admin, "alice", "pw").await.unwrap();
        let alice = signed_in(&board, "alice", "pw").await;

        board.add_task(&alice, "Alice's", None, Priority::Low).await.unwrap();
        board.add_task(&admin, "Takeda's", None, Priority::Low).await.unwrap();

        assert!(matches!(board.remove_user(&alice, "TAKEDA").await, Err(AppError::Forbidden(_))));
        assert!(matches!(board.remove_user(&admin, "TAKEDA").await, Err(AppError::Forbidden(_))));

        let removed = board.remove_user(&admin, "alice").await.unwrap();
        assert_eq!(removed.value, 1);
        assert!(removed.is_synced());
        assert_eq!(provider.inner.read_tasks().await.unwrap().len(), 1);
        assert!(!provider.inner.read_users().await.unwrap().unwrap().contains_key("alice"));
        assert!(matches!(board.resume("alice").await, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn user_administration_is_principal_only() {
        let provider = Arc::new(FlakyProvider::default());
        let board = board_with(provider).await;
        let admin = signed_in(&board, "TAKEDA", "147369").await;
        board.register_user(&admin, "alice", "pw").await.unwrap();
        board.register_user(&admin, "bob", "pw").await.unwrap();
        let alice = signed_in(&board, "alice", "pw").await;

        assert!(matches!(board.list_users(&alice).await, Err(AppError::Forbidden(_))));
        assert!(matches!(board.register_user(&alice, "eve", "x").await, Err(AppError::Forbidden(_))));
        assert!(matches!(
            board.change_password(&alice, "bob", "new").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            board.change_password(&admin, "TAKEDA", "").await,
            Err(AppError::InvalidInput(_))
        ));

        board.change_password(&alice, "alice", "fresh").await.unwrap();
        board.change_password(&admin, "bob", "reset").await.unwrap();
        signed_in(&board, "alice", "fresh").await;
        signed_in(&board, "bob", "reset").await;

        let users = board.list_users(&admin).await.unwrap();
        assert_eq!(users.len(), 3);
    }

    #[tokio::test]
    async fn anonymous_sessions_cannot_mutate() {
        let provider = Arc::new(FlakyProvider::default());
        let board = board_with(provider).await;
        let anonymous = board.new_session();

        let result = board.add_task(&anonymous, "Sneaky", None, Priority::Low).await;
        assert!(matches!(result, Err(AppError::Auth(_))));
        assert!(board.view().await.pending.is_empty());
    }
}
