use axum::{
    extract::{Path, Query, State},
    Json,
};
use tower_sessions::Session as CookieSession;
use crate::app::AppState;
use crate::errors::AppResult;
use crate::models::{
    BoardResponse, BoardView, EditTaskForm, NewTaskForm, SearchQuery, SearchResponse, TaskRecord,
};
use crate::services::TaskFilter;
use super::{board_response, board_session};

pub async fn serve_board(
    State(state): State<AppState>,
    session: CookieSession,
) -> AppResult<Json<BoardView>> {
    board_session(&state, &session).await?;
    Ok(Json(state.board.view().await))
}

pub async fn add_task(
    State(state): State<AppState>,
    session: CookieSession,
    Json(form): Json<NewTaskForm>,
) -> AppResult<Json<BoardResponse<TaskRecord>>> {
    let board_session = board_session(&state, &session).await?;
    let mutation = state
        .board
        .add_task(&board_session, &form.text, form.date, form.priority)
        .await?;
    Ok(board_response(&state, mutation).await)
}

pub async fn edit_task(
    State(state): State<AppState>,
    session: CookieSession,
    Path(task_id): Path<u64>,
    Json(form): Json<EditTaskForm>,
) -> AppResult<Json<BoardResponse<TaskRecord>>> {
    let board_session = board_session(&state, &session).await?;
    let mutation = state
        .board
        .edit_task(&board_session, task_id, &form.additional_info, form.priority)
        .await?;
    Ok(board_response(&state, mutation).await)
}

pub async fn complete_task(
    State(state): State<AppState>,
    session: CookieSession,
    Path(task_id): Path<u64>,
) -> AppResult<Json<BoardResponse<TaskRecord>>> {
    let board_session = board_session(&state, &session).await?;
    let mutation = state.board.complete_task(&board_session, task_id).await?;
    Ok(board_response(&state, mutation).await)
}

pub async fn revert_task(
    State(state): State<AppState>,
    session: CookieSession,
    Path(task_id): Path<u64>,
) -> AppResult<Json<BoardResponse<TaskRecord>>> {
    let board_session = board_session(&state, &session).await?;
    let mutation = state.board.revert_task(&board_session, task_id).await?;
    Ok(board_response(&state, mutation).await)
}

pub async fn delete_task(
    State(state): State<AppState>,
    session: CookieSession,
    Path(task_id): Path<u64>,
) -> AppResult<Json<BoardResponse<TaskRecord>>> {
    let board_session = board_session(&state, &session).await?;
    tracing::info!(
        "Attempting to delete task {} for user {:?}",
        task_id,
        board_session.current_user()
    );
    let mutation = state.board.delete_task(&board_session, task_id).await?;
    Ok(board_response(&state, mutation).await)
}

pub async fn search_completed(
    State(state): State<AppState>,
    session: CookieSession,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    board_session(&state, &session).await?;
    let filter = TaskFilter::from_search(&query)?;
    let tasks = state.board.search(&filter).await;

    let message = (tasks.is_empty() && filter.is_active())
        .then(|| "No completed task matches the search criteria.".to_string());
    Ok(Json(SearchResponse { tasks, message }))
}
