use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use uuid::Uuid;

use super::handlers::delete_user::delete_user;
use super::handlers::get_profile::get_profile;
use super::handlers::logout::logout;
use super::handlers::refresh::refresh;
use super::handlers::sign_in::sign_in;
use super::handlers::sign_up::sign_up;
use super::handlers::update_profile::update_profile;
use super::middleware::authenticate as auth_middleware;
use crate::domain::user::ports::ProfileServicePort;
use crate::domain::user::ports::SessionServicePort;

#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<dyn SessionServicePort>,
    pub profile_service: Arc<dyn ProfileServicePort>,
    pub authenticator: Arc<Authenticator>,
}

pub fn create_router(
    session_service: Arc<dyn SessionServicePort>,
    profile_service: Arc<dyn ProfileServicePort>,
    authenticator: Arc<Authenticator>,
) -> Router {
    let state = AppState {
        session_service,
        profile_service,
        authenticator,
    };

    let public_routes = Router::new()
        .route("/users/auth/sing-up", post(sign_up))
        .route("/users/auth/sing-in", post(sign_in))
        .route("/users/auth/refresh", get(refresh));

    let protected_routes = Router::new()
        .route("/users/auth/logout", get(logout))
        .route("/users/profile/:id", get(get_profile).put(update_profile))
        .route("/users/:id", delete(delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                request_id = %Uuid::new_v4(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use auth::CredentialHasher;
    use auth::DigestAlgorithm;
    use auth::Role;
    use auth::TokenCodec;
    use auth::TokenPair;
    use axum::http::header;
    use axum::http::StatusCode;
    use mockall::mock;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::PhoneNumber;
    use crate::domain::user::models::SignInCommand;
    use crate::domain::user::models::SignUpCommand;
    use crate::domain::user::models::UpdateProfileCommand;
    use crate::domain::user::models::User;
    use crate::domain::user::models::UserId;
    use crate::domain::user::models::UserName;
    use crate::domain::user::models::UserStatus;
    use crate::user::errors::UserError;

    mock! {
        pub Sessions {}

        #[async_trait]
        impl SessionServicePort for Sessions {
            async fn register(&self, command: SignUpCommand) -> Result<UserId, UserError>;
            async fn authenticate(&self, command: SignInCommand) -> Result<TokenPair, UserError>;
            async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, UserError>;
            async fn logout(&self, user_id: &UserId, access_token: &str, ttl: Duration) -> Result<(), UserError>;
            async fn check_token(&self, token: &str) -> bool;
            async fn issue_tokens(&self, subject_id: u64, role: &str) -> Result<TokenPair, UserError>;
        }
    }

    mock! {
        pub Profiles {}

        #[async_trait]
        impl ProfileServicePort for Profiles {
            async fn get_profile(&self, id: &UserId) -> Result<User, UserError>;
            async fn update_profile(&self, id: &UserId, command: UpdateProfileCommand) -> Result<User, UserError>;
            async fn delete_user(&self, id: &UserId) -> Result<(), UserError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(Authenticator::new(
            CredentialHasher::new("124jkhsdaf3425", DigestAlgorithm::Sha1).unwrap(),
            TokenCodec::new(
                b"test_secret_key_at_least_32_bytes!",
                chrono::Duration::minutes(15),
                chrono::Duration::days(30),
            ),
        ))
    }

    fn router(sessions: MockSessions, profiles: MockProfiles) -> Router {
        create_router(Arc::new(sessions), Arc::new(profiles), authenticator())
    }

    fn bearer(subject_id: u64) -> String {
        let pair = authenticator().issue_tokens(subject_id, Role::User).unwrap();
        format!("Bearer {}", pair.access_token)
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_route() {
        let mut sessions = MockSessions::new();
        sessions
            .expect_register()
            .withf(|command| command.phone_number.as_str() == "+375291234567")
            .times(1)
            .returning(|_| Ok(UserId(1)));

        let response = router(sessions, MockProfiles::new())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/users/auth/sing-up")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"name":"Ivan","phone_number":"+375291234567","email":"ivan@example.com","password":"12345"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_profile_route_passes_middleware() {
        let mut sessions = MockSessions::new();
        sessions.expect_check_token().times(1).returning(|_| false);

        let mut profiles = MockProfiles::new();
        profiles
            .expect_get_profile()
            .withf(|id| id.value() == 3)
            .times(1)
            .returning(|_| {
                Ok(User {
                    id: UserId(3),
                    name: UserName::new("Ivan".to_string()).unwrap(),
                    phone_number: PhoneNumber::new("+375291234567".to_string()).unwrap(),
                    email: EmailAddress::new("ivan@example.com".to_string()).unwrap(),
                    rating: 4.5,
                    status: UserStatus::Created,
                    password_digest: Vec::new(),
                })
            });

        let response = router(sessions, profiles)
            .oneshot(
                Request::builder()
                    .uri("/users/profile/3")
                    .header(header::AUTHORIZATION, bearer(3))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "Ivan");
        assert_eq!(body["rating"], 4.5);
    }

    #[tokio::test]
    async fn test_revoked_token_never_reaches_handler() {
        let mut sessions = MockSessions::new();
        sessions.expect_check_token().times(1).returning(|_| true);

        let mut profiles = MockProfiles::new();
        profiles.expect_delete_user().never();

        let response = router(sessions, profiles)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/users/3")
                    .header(header::AUTHORIZATION, bearer(3))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "token revoked");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = router(MockSessions::new(), MockProfiles::new())
            .oneshot(
                Request::builder()
                    .uri("/users/auth/sign-up")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
