use axum::extract::State;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum_extra::headers::Cookie;
use axum_extra::TypedHeader;

use super::AccessTokenResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::cookies::refresh_cookie;
use crate::inbound::http::cookies::refresh_token;
use crate::inbound::http::router::AppState;

/// Exchange the refresh cookie for a new token pair and rotate the cookie.
pub async fn refresh(
    State(state): State<AppState>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<([(HeaderName, HeaderValue); 1], ApiSuccess<AccessTokenResponseData>), ApiError> {
    let token = refresh_token(cookies)
        .ok_or_else(|| ApiError::Forbidden("bad refresh token".to_string()))?;

    let pair = state
        .session_service
        .refresh(&token)
        .await
        .map_err(ApiError::from)?;

    let cookie = refresh_cookie(&pair.refresh_token, state.authenticator.tokens().refresh_ttl())?;

    Ok((
        cookie,
        ApiSuccess::new(
            StatusCode::OK,
            AccessTokenResponseData {
                access_token: pair.access_token,
            },
        ),
    ))
}
