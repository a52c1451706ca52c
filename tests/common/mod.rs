//! Common test utilities for E2E tests

#![allow(dead_code)]

use opinai::{AppState, config};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TEST_TOKEN_SECRET: &str = "test-secret-key-that-is-32-bytes!";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// A registered user with a valid bearer token
pub struct TestUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub token: String,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        opinai::metrics::init_metrics();

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database: config::DatabaseConfig { path: db_path },
            auth: config::AuthConfig {
                token_secret: TEST_TOKEN_SECRET.to_string(),
                token_max_age: 3600,
                // Minimum cost keeps hashing fast in tests
                bcrypt_cost: 4,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = opinai::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register a user through the API and return the created JSON
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Value {
        let response = self
            .client
            .post(self.url("/users/add"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }

    /// Log in through the API and return the token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/users/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Register and log in a user
    pub async fn create_user(&self, name: &str, email: &str) -> TestUser {
        let password = "123456789";
        let created = self.register(name, email, password).await;
        let token = self.login(email, password).await;

        TestUser {
            id: created["id"].as_str().unwrap().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            token,
        }
    }

    /// Add a movie through the API and return its ID
    pub async fn create_movie(&self, name: &str) -> String {
        let response = self
            .client
            .post(self.url("/movies/add"))
            .json(&json!({
                "name": name,
                "genre": "Ficção Científica",
                "rating": "PG-13",
                "cover": { "imageURL": "https://example.com/cover.jpg", "title": name },
                "year": "2014",
                "avg": 4.5
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    /// Create a review as `user` and return the created JSON
    pub async fn create_review(&self, user: &TestUser, movie_id: &str) -> Value {
        let response = self
            .client
            .post(self.url("/reviews/add"))
            .bearer_auth(&user.token)
            .json(&json!({
                "title": "Minha Avaliação",
                "body": "Esta é uma avaliação incrível!",
                "classification": 5,
                "content": movie_id
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }
}
