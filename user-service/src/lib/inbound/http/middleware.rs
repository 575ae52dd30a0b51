use std::collections::HashMap;

use axum::extract::Path;
use axum::extract::Request;
use axum::extract::State;
use axum::http;
use axum::middleware::Next;
use axum::response::Response;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type to store the authenticated caller in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Middleware that verifies the bearer token and checks route ownership.
///
/// Rejections:
/// * 401 - Header missing or without a token part, token expired
/// * 403 - Wrong signature, revoked token, `id` path parameter not the caller's
/// * 500 - Any other verification failure
pub async fn authenticate(
    State(state): State<AppState>,
    path: Option<Path<HashMap<String, String>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(&req)?.to_string();

    let verified = state.authenticator.verify_token(&token).map_err(|e| {
        tracing::warn!(error = %e, "Access token rejected");
        ApiError::from(e)
    })?;

    if state.session_service.check_token(&token).await {
        tracing::warn!(user_id = verified.subject_id, "Revoked access token used");
        return Err(ApiError::Forbidden("token revoked".to_string()));
    }

    if let Some(Path(params)) = path {
        if let Some(id) = params.get("id") {
            if *id != verified.subject_id.to_string() {
                tracing::warn!(
                    user_id = verified.subject_id,
                    requested_id = %id,
                    "Access to another user's resource denied"
                );
                return Err(ApiError::Forbidden("access denied".to_string()));
            }
        }
    }

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: UserId(verified.subject_id),
        access_token: token,
        expires_at: verified.expires_at,
    });

    Ok(next.run(req).await)
}

/// Second space-separated part of the `Authorization` header.
fn extract_token_from_header(req: &Request) -> Result<&str, ApiError> {
    let missing = || ApiError::Unauthorized("access token required".to_string());

    let auth_str = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(missing)?
        .to_str()
        .map_err(|_| missing())?;

    auth_str.split(' ').nth(1).ok_or_else(missing)
}
