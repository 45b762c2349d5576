use axum::{
    extract::State,
    Json,
};
use tower_sessions::Session as CookieSession;
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::{LoginForm, SessionInfo};
use crate::services::{policy, Session};
use super::{board_session, SESSION_KEY};

pub async fn health() -> &'static str {
    "ok"
}

#[axum::debug_handler]
pub async fn handle_login(
    State(state): State<AppState>,
    session: CookieSession,
    Json(login_form): Json<LoginForm>,
) -> AppResult<Json<SessionInfo>> {
    tracing::info!("Login attempt for user: {}", login_form.username.trim());

    let mut board_session = state.board.new_session();
    state
        .board
        .login(&mut board_session, &login_form.username, &login_form.password)
        .await?;

    let username = board_session.require_user()?.to_string();
    session
        .insert(SESSION_KEY, username)
        .await
        .map_err(|e| AppError::Session(e.to_string()))?;

    Ok(Json(session_view(&board_session)))
}

#[axum::debug_handler]
pub async fn handle_logout(
    State(state): State<AppState>,
    session: CookieSession,
) -> AppResult<Json<SessionInfo>> {
    if let Ok(mut board_session) = board_session(&state, &session).await {
        state.board.logoff(&mut board_session);
    }
    if let Err(e) = session.remove::<String>(SESSION_KEY).await {
        tracing::warn!("Session removal error: {}", e);
    }

    Ok(Json(session_view(&state.board.new_session())))
}

pub async fn session_info(
    State(state): State<AppState>,
    session: CookieSession,
) -> AppResult<Json<SessionInfo>> {
    let board_session = board_session(&state, &session).await?;
    Ok(Json(session_view(&board_session)))
}

fn session_view(board_session: &Session) -> SessionInfo {
    SessionInfo {
        current_user: board_session.current_user().map(str::to_string),
        is_principal: board_session.is_principal(),
        can_delete_completed: policy::can_show_delete_on_completed(board_session.is_principal()),
    }
}
