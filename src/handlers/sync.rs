use axum::{extract::State, Json};
use serde_json::{json, Value};
use tower_sessions::Session as CookieSession;
use crate::app::AppState;
use crate::errors::AppResult;
use super::board_session;

/// Reloads tasks from the store. An unreachable store answers 502 and leaves the board as it was.
pub async fn pull_tasks(
    State(state): State<AppState>,
    session: CookieSession,
) -> AppResult<Json<Value>> {
    board_session(&state, &session).await?;
    let loaded = state.board.pull().await?;
    Ok(Json(json!({ "loaded": loaded, "board": state.board.view().await })))
}

/// Manual retry after a failed push. Unlike ordinary mutations, a failed write is an error here.
pub async fn push_all(
    State(state): State<AppState>,
    session: CookieSession,
) -> AppResult<Json<Value>> {
    board_session(&state, &session).await?;
    let pushed = state.board.push().await.into_result()?;
    Ok(Json(json!({ "synced": true, "pushed": pushed })))
}
