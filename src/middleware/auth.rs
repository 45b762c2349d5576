use axum::{
    middleware::Next,
    response::{IntoResponse, Response},
    extract::Request,
    body::Body,
};
use tower_sessions::Session;
use crate::errors::AppError;
use crate::handlers::SESSION_KEY;

pub async fn require_auth(
    session: Session,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if path == "/login" || path == "/health" {
        return next.run(req).await;
    }

    match session.get::<String>(SESSION_KEY).await {
        Ok(Some(_)) => next.run(req).await,
        _ => AppError::Auth("Not authenticated".into()).into_response(),
    }
}
