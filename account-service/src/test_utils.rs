//! Test utilities for integration testing (available with `test-utils` feature).

use crate::api::models::accounts::{AccountInfo, Role};
use crate::auth::password::{Argon2Params, HashService};
use crate::config::{Config, DatabaseConfig, PoolSettings};
use crate::db::{Database, models::accounts::AccountCreateDBRequest};
use crate::service::AccountService;
use axum_test::TestServer;
use sqlx::SqlitePool;

/// Cheapest parameters Argon2 accepts, so tests don't spend their time hashing.
pub fn fast_argon2_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                ..Default::default()
            },
        },
        hash: fast_argon2_params(),
        ..Default::default()
    }
}

pub fn create_test_service(pool: SqlitePool) -> AccountService {
    AccountService::new(Database::from_pool(pool), HashService::new(fast_argon2_params()))
}

pub async fn create_test_app(pool: SqlitePool) -> TestServer {
    let app = crate::Application::new_with_pool(create_test_config(), pool)
        .await
        .expect("Failed to create application");
    app.into_test_server()
}

/// A member account with sample contact details.
pub fn account_info(username: &str) -> AccountInfo {
    AccountInfo {
        username: username.to_string(),
        fullname: format!("{username} Example"),
        email: format!("{username}@example.com"),
        phone_number: "+1 555 0100".to_string(),
        role: Role::Member,
    }
}

/// Row-level create request for the seeded `member` role.
pub fn account_create_request(username: &str) -> AccountCreateDBRequest {
    AccountCreateDBRequest {
        username: username.to_string(),
        fullname: format!("{username} Example"),
        email: format!("{username}@example.com"),
        phone_number: "+1 555 0100".to_string(),
        role_id: 2,
    }
}
