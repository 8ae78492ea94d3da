//! # account-service: account and credential lifecycle
//!
//! `account-service` owns user accounts and the password credential that belongs to each one. An
//! account and its credential are always created and deleted together in a single database
//! transaction, so no caller can ever observe an account without a credential or the reverse.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum) and persistence uses SQLite
//! through sqlx.
//!
//! - The **database layer** ([`db`]) exposes one repository per table (`Accounts`, `Credentials`,
//!   `Roles`). A repository borrows a connection, so the same code runs on a pooled connection or
//!   inside an open transaction.
//! - The **service layer** ([`service`]) composes the repositories and the password hasher into
//!   account operations, opening a transaction for every operation that writes more than one row
//!   and reclassifying storage failures into [`errors::Error`].
//! - The **API layer** ([`api`]) maps HTTP routes onto service calls.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use account_service::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = account_service::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     account_service::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations are embedded and run on startup; they can also be applied directly:
//!
//! ```no_run
//! # use sqlx::SqlitePool;
//! # async fn example(pool: SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
//! account_service::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod service;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    api::{
        handlers::{accounts, health},
        models::accounts::{AccountInfo, Role},
    },
    auth::password::HashService,
    config::InitialAdminConfig,
    db::Database,
    errors::Error,
    openapi::ApiDoc,
    service::AccountService,
    types::AccountId,
};
use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post, put},
};
use bon::Builder;
pub use config::Config;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .service(service)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub service: AccountService,
    pub config: Config,
}

/// Get the account-service database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the configured initial admin account unless its username is already taken.
///
/// Returns the new account id, or `None` when an account with that username exists. An existing
/// account is left untouched, including its password.
#[instrument(skip_all, err)]
pub async fn create_initial_admin_account(service: &AccountService, admin: &InitialAdminConfig) -> Result<Option<AccountId>, Error> {
    if service.is_username_taken(&admin.username).await? {
        debug!("Initial admin account already exists");
        return Ok(None);
    }

    let info = AccountInfo {
        username: admin.username.clone(),
        fullname: String::new(),
        email: admin.email.clone(),
        phone_number: String::new(),
        role: Role::Admin,
    };

    match service.create_account(info, admin.password.clone()).await {
        Ok(account_id) => {
            info!(account_id, "Created initial admin account");
            Ok(Some(account_id))
        }
        // Another instance created it between the check and the insert
        Err(Error::AlreadyExists { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Build the HTTP router: account routes under `/v1`, plus health and OpenAPI at the root.
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;

    let api_routes = Router::new()
        .route("/accounts", post(accounts::create_account).get(accounts::get_account_all))
        .route("/accounts/check", post(accounts::check_account_valid))
        .route("/accounts/batch", post(accounts::get_account_list))
        .route(
            "/accounts/usernames/{username}",
            get(accounts::is_username_taken).delete(accounts::delete_account_by_username),
        )
        .route(
            "/accounts/{id}",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/accounts/{id}/password", put(accounts::update_account_password));

    let router = Router::new()
        .nest("/v1", api_routes)
        .route("/healthz", get(health::healthz))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state);

    apply_request_layers(router, request_timeout)
}

/// Wrap a router in the per-request timeout and HTTP tracing layers.
fn apply_request_layers(router: Router, request_timeout: Duration) -> Router {
    router
        // Dropping a timed-out handler drops its open transaction, which rolls it back
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources.
///
/// 1. **Create**: [`Application::new`] opens the database, runs migrations and seeds the initial
///    admin account
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves, then closes the pool
pub struct Application {
    router: Router,
    config: Config,
    db: Database,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting account service with configuration: {:#?}", config);

        let db = Database::connect(&config.database).await?;
        Self::setup(config, db).await
    }

    /// Create an application over an existing pool. Migrations are still applied.
    pub async fn new_with_pool(config: Config, pool: sqlx::SqlitePool) -> anyhow::Result<Self> {
        Self::setup(config, Database::from_pool(pool)).await
    }

    async fn setup(config: Config, db: Database) -> anyhow::Result<Self> {
        db.migrate().await?;

        let service = AccountService::new(db.clone(), HashService::new(config.hash));

        if let Some(admin) = &config.initial_admin {
            create_initial_admin_account(&service, admin).await?;
        }

        let state = AppState::builder().service(service).config(config.clone()).build();
        let router = build_router(state);

        Ok(Self { router, config, db })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Account service listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        let result = axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await;
        if let Err(e) = &result {
            warn!("Server exited with error: {}", e);
        }

        info!("Closing database connections...");
        self.db.close().await;

        result.map_err(Into::into)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::*;
    use sqlx::SqlitePool;

    fn admin_config(password: &str) -> InitialAdminConfig {
        InitialAdminConfig {
            username: "admin".to_string(),
            password: password.to_string(),
            email: "admin@example.com".to_string(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_initial_admin_created_once(pool: SqlitePool) {
        let service = create_test_service(pool);

        let first = create_initial_admin_account(&service, &admin_config("hunter2")).await.unwrap();
        let account_id = first.expect("admin should be created");

        let account = service.get_account(account_id).await.unwrap();
        assert_eq!(account.account_info.role, Role::Admin);
        assert_eq!(account.account_info.email, "admin@example.com");

        // A second run leaves the existing account and password alone
        let second = create_initial_admin_account(&service, &admin_config("other")).await.unwrap();
        assert_eq!(second, None);
        assert_eq!(
            service.check_account_valid("admin", "hunter2".to_string()).await.unwrap(),
            Some(account_id)
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_application_seeds_admin(pool: SqlitePool) {
        let mut config = create_test_config();
        config.initial_admin = Some(admin_config("hunter2"));

        let server = Application::new_with_pool(config, pool).await.unwrap().into_test_server();

        let response = server.get("/v1/accounts/usernames/admin").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["is_taken"], true);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_openapi_document_served(pool: SqlitePool) {
        let server = create_test_app(pool).await;

        let response = server.get("/openapi.json").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert!(body["paths"]["/accounts"].is_object());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_timed_out_request_rolls_back(pool: SqlitePool) {
        use crate::db::handlers::{Accounts, Repository};

        let db = Database::from_pool(pool.clone());
        let slow = Router::new().route(
            "/slow",
            post(move || {
                let db = db.clone();
                async move {
                    let mut tx = db.begin().await.unwrap();
                    Accounts::new(&mut tx).create(&account_create_request("slow")).await.unwrap();
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    tx.commit().await.unwrap();
                    StatusCode::CREATED
                }
            }),
        );

        let server = axum_test::TestServer::new(apply_request_layers(slow, Duration::from_millis(200)).into_make_service())
            .expect("Failed to create test server");
        server.post("/slow").await.assert_status(StatusCode::REQUEST_TIMEOUT);

        // The insert was never committed
        let service = create_test_service(pool);
        assert!(!service.is_username_taken("slow").await.unwrap());
        service.create_account(account_info("slow"), "pw".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn test_application_new_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = create_test_config();
        config.database.url = format!("sqlite://{}", dir.path().join("accounts.db").display());

        let app = Application::new(config).await.unwrap();
        assert!(dir.path().join("accounts.db").exists());

        let server = app.into_test_server();
        server.get("/healthz").await.assert_status_ok();
    }
}
