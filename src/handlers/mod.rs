mod auth;
mod tasks;
mod users;
mod sync;

use axum::Json;
use serde::Serialize;
use tower_sessions::Session as CookieSession;
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::BoardResponse;
use crate::services::{Mutation, Session};

pub use auth::{handle_login, handle_logout, health, session_info};
pub use tasks::{add_task, complete_task, delete_task, edit_task, revert_task, search_completed, serve_board};
pub use users::{change_password, list_users, register_user, remove_user};
pub use sync::{pull_tasks, push_all};

/// Cookie session key holding the signed-in username.
pub const SESSION_KEY: &str = "user_session";

// Rebuild the board session for the cookie's user
async fn board_session(state: &AppState, session: &CookieSession) -> AppResult<Session> {
    let username = session
        .get::<String>(SESSION_KEY)
        .await
        .map_err(|e| AppError::Session(e.to_string()))?
        .ok_or_else(|| AppError::Auth("Not authenticated".into()))?;

    state.board.resume(&username).await
}

// Every mutation answers with the redrawn board and how the push went
async fn board_response<T: Serialize>(state: &AppState, mutation: Mutation<T>) -> Json<BoardResponse<T>> {
    let synced = mutation.is_synced();
    let warning = mutation.warning();
    if let Some(warning) = &warning {
        tracing::warn!("{}", warning);
    }

    Json(BoardResponse {
        data: mutation.value,
        board: state.board.view().await,
        synced,
        warning,
    })
}
