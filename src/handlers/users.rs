use axum::{
    extract::{Path, State},
    Json,
};
use tower_sessions::Session as CookieSession;
use crate::app::AppState;
use crate::errors::AppResult;
use crate::models::{BoardResponse, PasswordForm, RegisterForm, UserEntry};
use super::{board_response, board_session};

pub async fn list_users(
    State(state): State<AppState>,
    session: CookieSession,
) -> AppResult<Json<Vec<UserEntry>>> {
    let board_session = board_session(&state, &session).await?;
    Ok(Json(state.board.list_users(&board_session).await?))
}

pub async fn register_user(
    State(state): State<AppState>,
    session: CookieSession,
    Json(form): Json<RegisterForm>,
) -> AppResult<Json<BoardResponse<String>>> {
    let board_session = board_session(&state, &session).await?;
    let mutation = state
        .board
        .register_user(&board_session, &form.username, &form.password)
        .await?;
    Ok(board_response(&state, mutation).await)
}

pub async fn change_password(
    State(state): State<AppState>,
    session: CookieSession,
    Path(username): Path<String>,
    Json(form): Json<PasswordForm>,
) -> AppResult<Json<BoardResponse<()>>> {
    let board_session = board_session(&state, &session).await?;
    let mutation = state
        .board
        .change_password(&board_session, &username, &form.password)
        .await?;
    Ok(board_response(&state, mutation).await)
}

pub async fn remove_user(
    State(state): State<AppState>,
    session: CookieSession,
    Path(username): Path<String>,
) -> AppResult<Json<BoardResponse<usize>>> {
    let board_session = board_session(&state, &session).await?;
    let mutation = state.board.remove_user(&board_session, &username).await?;
    Ok(board_response(&state, mutation).await)
}
