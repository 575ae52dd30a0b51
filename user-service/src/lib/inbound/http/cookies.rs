use axum_extra::headers::Cookie;
use axum_extra::TypedHeader;
use http::header::SET_COOKIE;
use http::HeaderName;
use http::HeaderValue;

use super::handlers::ApiError;

pub const REFRESH_COOKIE: &str = "refresh_token";
pub const REFRESH_COOKIE_PATH: &str = "/users/auth";

/// `Set-Cookie` header carrying a refresh token, scoped to the auth routes.
pub fn refresh_cookie(
    token: &str,
    max_age: chrono::Duration,
) -> Result<[(HeaderName, HeaderValue); 1], ApiError> {
    set_cookie(token, max_age.num_seconds())
}

/// `Set-Cookie` header removing the refresh token from the client.
pub fn cleared_refresh_cookie() -> Result<[(HeaderName, HeaderValue); 1], ApiError> {
    set_cookie("", 0)
}

fn set_cookie(token: &str, max_age: i64) -> Result<[(HeaderName, HeaderValue); 1], ApiError> {
    let value = format!(
        "{REFRESH_COOKIE}={token}; Path={REFRESH_COOKIE_PATH}; Max-Age={max_age}; HttpOnly"
    );

    HeaderValue::from_str(&value)
        .map(|value| [(SET_COOKIE, value)])
        .map_err(|e| ApiError::InternalServerError(format!("invalid cookie value: {e}")))
}

/// Refresh token sent by the client, if any.
pub fn refresh_token(cookies: Option<TypedHeader<Cookie>>) -> Option<String> {
    cookies
        .and_then(|TypedHeader(cookies)| cookies.get(REFRESH_COOKIE).map(str::to_string))
        .filter(|token| !token.is_empty())
}
