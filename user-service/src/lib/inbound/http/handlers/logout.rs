use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::Extension;
use chrono::DateTime;
use chrono::Utc;

use super::ApiError;
use crate::inbound::http::cookies::cleared_refresh_cookie;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> Result<([(HeaderName, HeaderValue); 1], StatusCode), ApiError> {
    let ttl = remaining_lifetime(caller.expires_at, Utc::now());

    state
        .session_service
        .logout(&caller.user_id, &caller.access_token, ttl)
        .await
        .map_err(ApiError::from)?;

    Ok((cleared_refresh_cookie()?, StatusCode::OK))
}

/// Time left until `expires_at`, never below one second.
fn remaining_lifetime(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (expires_at - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
        .max(Duration::from_secs(1))
}
