use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use auth::Authenticator;
use auth::CredentialHasher;
use auth::DigestAlgorithm;
use auth::TokenCodec;
use user_service::domain::user::errors::RevocationError;
use user_service::domain::user::errors::UserError;
use user_service::domain::user::models::EmailAddress;
use user_service::domain::user::models::NewUser;
use user_service::domain::user::models::PhoneNumber;
use user_service::domain::user::models::UpdateProfileCommand;
use user_service::domain::user::models::User;
use user_service::domain::user::models::UserId;
use user_service::domain::user::models::UserStatus;
use user_service::domain::user::ports::ProfileServicePort;
use user_service::domain::user::ports::RevocationStore;
use user_service::domain::user::ports::SessionServicePort;
use user_service::domain::user::ports::UserRepository;
use user_service::domain::user::service::ProfileService;
use user_service::domain::user::service::SessionService;
use user_service::inbound::http::router::create_router;

pub const TEST_SALT: &str = "124jkhsdaf3425";
pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server over in-memory stores
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub authenticator: Arc<Authenticator>,
    pub users: Arc<InMemoryUserRepository>,
    pub revocations: Arc<InMemoryRevocationStore>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let authenticator = Arc::new(test_authenticator());
        let users = Arc::new(InMemoryUserRepository::default());
        let revocations = Arc::new(InMemoryRevocationStore::default());

        let session_service: Arc<dyn SessionServicePort> = Arc::new(SessionService::new(
            Arc::clone(&users),
            Arc::clone(&revocations),
            Arc::clone(&authenticator),
        ));
        let profile_service: Arc<dyn ProfileServicePort> =
            Arc::new(ProfileService::new(Arc::clone(&users)));

        let router = create_router(session_service, profile_service, Arc::clone(&authenticator));

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create reqwest client"),
            authenticator,
            users,
            revocations,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register a user through the API
    pub async fn sign_up(&self, name: &str, phone_number: &str, email: &str, password: &str) {
        let response = self
            .post("/users/auth/sing-up")
            .json(&serde_json::json!({
                "name": name,
                "phone_number": phone_number,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    }

    /// Sign in and return the access token
    pub async fn sign_in(&self, phone_number: &str, password: &str) -> String {
        let response = self
            .post("/users/auth/sing-in")
            .json(&serde_json::json!({
                "phone_number": phone_number,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["access_token"]
            .as_str()
            .expect("Missing access token")
            .to_string()
    }

    /// Register and sign in a fresh user, returning its id and access token
    pub async fn signed_in_user(&self) -> (u64, String) {
        self.sign_up("petr", "+79990001122", "petr@example.com", "qwerty")
            .await;
        let token = self.sign_in("+79990001122", "qwerty").await;
        let subject_id = self
            .authenticator
            .verify_token(&token)
            .expect("Issued token must verify")
            .subject_id;

        (subject_id, token)
    }
}

pub fn test_authenticator() -> Authenticator {
    Authenticator::new(
        CredentialHasher::new(TEST_SALT.as_bytes(), DigestAlgorithm::Sha1)
            .expect("Failed to build hasher"),
        TokenCodec::new(
            TEST_SECRET.as_bytes(),
            chrono::Duration::minutes(15),
            chrono::Duration::days(30),
        ),
    )
}

/// User store backed by a map, with the same active/deleted rules as Postgres
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<u64, User>>,
}

impl InMemoryUserRepository {
    pub fn status_of(&self, id: u64) -> Option<UserStatus> {
        self.users.lock().unwrap().get(&id).map(|u| u.status)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        let id = users.len() as u64 + 1;
        let user = User {
            id: UserId(id),
            name: user.name,
            phone_number: user.phone_number,
            email: user.email,
            rating: 0.0,
            status: UserStatus::Created,
            password_digest: user.password_digest,
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn exists_active(
        &self,
        phone_number: &PhoneNumber,
        email: &EmailAddress,
    ) -> Result<bool, UserError> {
        Ok(self.users.lock().unwrap().values().any(|u| {
            u.status == UserStatus::Created
                && (&u.phone_number == phone_number || &u.email == email)
        }))
    }

    async fn find_active_by_phone_number(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.status == UserStatus::Created && &u.phone_number == phone_number)
            .cloned())
    }

    async fn find_active_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(&id.value())
            .filter(|u| u.status == UserStatus::Created)
            .cloned())
    }

    async fn update(&self, id: &UserId, changes: UpdateProfileCommand) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id.value())
            .filter(|u| u.status == UserStatus::Created)
            .ok_or(UserError::DoesNotExist)?;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(phone_number) = changes.phone_number {
            user.phone_number = phone_number;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }

        Ok(user.clone())
    }

    async fn soft_delete(&self, id: &UserId) -> Result<(), UserError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id.value())
            .filter(|u| u.status == UserStatus::Created)
            .ok_or(UserError::DoesNotExist)?;
        user.status = UserStatus::Deleted;
        Ok(())
    }
}

/// Revocation store without expiry
#[derive(Default)]
pub struct InMemoryRevocationStore {
    tokens: Mutex<HashSet<String>>,
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn record(&self, token: &str, _ttl: Duration) -> Result<(), RevocationError> {
        self.tokens.lock().unwrap().insert(token.to_string());
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> bool {
        self.tokens.lock().unwrap().contains(token)
    }
}
