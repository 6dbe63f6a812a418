use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::AuthSettings;
use auth::IssuedToken;
use auth::MailerError;
use auth::ManualClock;
use auth::PasswordHasher;
use auth::ResetTokenMailer;
use chrono::Utc;
use fitness_service::account::service::AccountService;
use fitness_service::domain::user::service::UserService;
use fitness_service::inbound::http::router::create_router;
use fitness_service::outbound::repositories::InMemoryResetLedger;
use fitness_service::outbound::repositories::InMemoryUserRepository;
use serde_json::json;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Mailer that keeps every reset token it is asked to deliver
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingMailer {
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ResetTokenMailer for CapturingMailer {
    async fn send_reset_token(&self, email: &str, token: &IssuedToken) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), token.token.clone()));
        Ok(())
    }
}

/// Test application that spawns a real server over in-memory adapters
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub mailer: Arc<CapturingMailer>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let settings = AuthSettings::with_defaults(TEST_SECRET).expect("valid settings");
        let hasher = PasswordHasher::with_work_factor(8, 1, 1).expect("valid parameters");
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let mailer = Arc::new(CapturingMailer::default());
        let user_repository = Arc::new(InMemoryUserRepository::new());

        let user_service = Arc::new(
            UserService::new(Arc::clone(&user_repository)).with_hasher(hasher.clone()),
        );
        let account_service = Arc::new(
            AccountService::with_clock(
                &settings,
                clock.clone(),
                user_repository,
                Arc::clone(&mailer),
                Arc::new(InMemoryResetLedger::new()),
            )
            .with_hasher(hasher),
        );

        let router = create_router(user_service, account_service);

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            mailer,
            clock,
        }
    }

    /// Register a user and return the response body
    pub async fn register(&self, username: &str, email: &str, password: &str) -> serde_json::Value {
        let response = self
            .post("/api/users")
            .json(&json!({
                "username": username,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in and return the access token
    pub async fn login(&self, login: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/login")
            .json(&json!({ "login": login, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["access_token"]
            .as_str()
            .expect("access token in response")
            .to_string()
    }

    /// Request a password reset and wait for the mailed token
    pub async fn reset_token_for(&self, email: &str) -> String {
        let response = self
            .post("/api/auth/forgot-password")
            .json(&json!({ "email": email }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        self.wait_for_token(email).await
    }

    /// Delivery runs off the request path, so poll the mailer for a while
    pub async fn wait_for_token(&self, email: &str) -> String {
        for _ in 0..100 {
            if let Some(token) = self.mailer.last_token_for(email) {
                return token;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("no reset token delivered to {}", email);
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

    /// Helper to make PATCH request with Bearer token
    pub fn patch_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .patch(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }
}
