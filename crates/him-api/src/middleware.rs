//! Middleware: bearer authentication and response headers.

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use him_common::error::HimError;
use std::sync::Arc;

use crate::{auth, AppState};

/// Authentication context extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub member_id: uuid::Uuid,
}

/// Extract and validate the JWT from the `Authorization: Bearer <token>` header.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, HimError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(HimError::Unauthorized)?;

    let claims = auth::validate_token(token, &state.settings.secret_key)
        .map_err(|_| HimError::InvalidToken)?;

    let member_id = claims
        .sub
        .parse::<uuid::Uuid>()
        .map_err(|_| HimError::InvalidToken)?;

    request.extensions_mut().insert(AuthContext { member_id });

    Ok(next.run(request).await)
}

/// Headers applied to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let h = response.headers_mut();

    h.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    h.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    h.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}
