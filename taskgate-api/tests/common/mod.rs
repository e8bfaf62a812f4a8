/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (skipped when `DATABASE_URL` is unset)
/// - Test users: one admin, two members
/// - JWT token generation
/// - Request helpers

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use taskgate_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig, MailConfig, MailDriver},
};
use taskgate_shared::{
    auth::jwt::{create_token, Claims, TokenType},
    db::{migrations::run_migrations, seed::ensure_admin_role},
    events::RecordingNotifier,
    models::user::{CreateUser, User},
};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// A user plus a valid access token
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub notifier: RecordingNotifier,
    pub admin: TestUser,
    pub member: TestUser,
    pub other: TestUser,
}

fn test_config(database_url: String) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            app_url: "http://localhost:8080".to_string(),
        },
        database: DatabaseConfig {
            url: database_url,
            max_connections: 5,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        mail: MailConfig {
            driver: MailDriver::Log,
            api_url: None,
            api_key: None,
            from_address: "noreply@taskgate.local".to_string(),
            from_name: "TaskGate".to_string(),
        },
        admin: None,
    }
}

/// Creates a user with a unique email and returns it with an access token
pub async fn create_user(db: &PgPool, label: &str) -> anyhow::Result<TestUser> {
    let user = User::create(
        db,
        CreateUser {
            name: format!("Test {}", label),
            email: format!("{}-{}@example.com", label, Uuid::new_v4()),
            password_hash: "not-used-in-tests".to_string(),
        },
    )
    .await?;

    let token = create_token(&Claims::new(user.id, TokenType::Access), JWT_SECRET)?;

    Ok(TestUser { user, token })
}

/// Unique name for rows that must not collide across tests
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

impl TestContext {
    /// Creates a test context, or None when no database is configured
    pub async fn new() -> Option<Self> {
        let _ = dotenvy::dotenv();
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping database test");
            return None;
        };

        Some(
            Self::connect(database_url)
                .await
                .expect("failed to set up test context"),
        )
    }

    async fn connect(database_url: String) -> anyhow::Result<Self> {
        let db = PgPool::connect(&database_url).await?;
        run_migrations(&db).await?;

        let admin_role = ensure_admin_role(&db).await?;

        let admin = create_user(&db, "admin").await?;
        User::assign_roles(&db, admin.id(), &[admin_role.id]).await?;

        let member = create_user(&db, "member").await?;
        let other = create_user(&db, "other").await?;

        let notifier = RecordingNotifier::default();
        let state = AppState::new(db.clone(), test_config(database_url))
            .with_notifier(Arc::new(notifier.clone()));
        let app = build_router(state);

        Ok(Self {
            db,
            app,
            notifier,
            admin,
            member,
            other,
        })
    }

    /// Sends a request as `as_user` (None = anonymous) and decodes the JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        as_user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);

        if let Some(user) = as_user {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", user.token));
        }

        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, as_user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(as_user), None).await
    }

    pub async fn post(&self, uri: &str, as_user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(as_user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, as_user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(as_user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, as_user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(as_user), None).await
    }

    /// Cleans up test users (cascades to their tasks and role grants)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        for user in [&self.admin, &self.member, &self.other] {
            User::force_delete(&self.db, user.id()).await?;
        }
        Ok(())
    }
}
