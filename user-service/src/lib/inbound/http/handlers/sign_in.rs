use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::AccessTokenResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::SignInCommand;
use crate::inbound::http::cookies::refresh_cookie;
use crate::inbound::http::router::AppState;
use crate::user::errors::FieldError;
use crate::user::errors::UserError;

pub async fn sign_in(
    State(state): State<AppState>,
    body: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<([(HeaderName, HeaderValue); 1], ApiSuccess<AccessTokenResponseData>), ApiError> {
    let Json(body) = body?;
    let command = body.try_into_command()?;

    let pair = state
        .session_service
        .authenticate(command)
        .await
        .map_err(|e| match e {
            UserError::DoesNotExist | UserError::IncorrectPassword => {
                ApiError::Forbidden(e.to_string())
            }
            _ => ApiError::from(e),
        })?;

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

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignInRequest {
    phone_number: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
enum ParseSignInRequestError {
    #[error("Invalid field: {0}")]
    Field(FieldError),

    #[error("password must not be empty")]
    EmptyPassword,

    /// Longer than any stored phone number, so no account can match.
    #[error("user does not exist")]
    UnknownPhoneNumber,
}

impl From<FieldError> for ParseSignInRequestError {
    fn from(err: FieldError) -> Self {
        match err {
            FieldError::TooLong { .. } => ParseSignInRequestError::UnknownPhoneNumber,
            other => ParseSignInRequestError::Field(other),
        }
    }
}

impl SignInRequest {
    fn try_into_command(self) -> Result<SignInCommand, ParseSignInRequestError> {
        if self.password.is_empty() {
            return Err(ParseSignInRequestError::EmptyPassword);
        }

        Ok(SignInCommand {
            phone_number: PhoneNumber::new(self.phone_number)?,
            password: self.password,
        })
    }
}

impl From<ParseSignInRequestError> for ApiError {
    fn from(err: ParseSignInRequestError) -> Self {
        match err {
            ParseSignInRequestError::UnknownPhoneNumber => ApiError::Forbidden(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}
