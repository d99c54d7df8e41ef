#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for worm watch.
//!
//! Serves the REST API for submitting and listing worm sightings, the
//! stats snapshot, and the admin bulk delete. Reports are stored in
//! Postgres through `switchy_database`, or in process memory for local
//! development.

pub mod config;
mod error;
pub mod handlers;
pub mod interactive;

use std::fmt;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use worm_watch_database::{
    DatabaseReportStore, DbError, MemoryReportStore, ReportStore, db, run_migrations,
};
use worm_watch_rate_limit::RateLimiter;
use worm_watch_service::{AdminService, ReportService, StatsService};
use worm_watch_time::{Clock, SystemClock};

pub use config::ServerConfig;
pub use error::ApiFailure;

/// Errors that stop the server from starting or keep it from running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The database connection could not be opened.
    #[error("Failed to connect to database: {0}")]
    Connect(String),

    /// Migrations or another startup query failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Binding or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Where reports are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Postgres at `DATABASE_URL`.
    #[default]
    Database,
    /// Process memory; everything is lost on shutdown.
    InMemory,
}

impl StoreBackend {
    /// Every backend, in the order offered by the interactive prompt.
    pub const ALL: &[Self] = &[Self::Database, Self::InMemory];
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Database => "Postgres (DATABASE_URL)",
            Self::InMemory => "In-memory",
        })
    }
}

/// Shared application state.
pub struct AppState {
    /// Report submission and listing.
    pub reports: ReportService,
    /// Public stats snapshot.
    pub stats: StatsService,
    /// Authenticated bulk delete.
    pub admin: AdminService,
    /// Whether `X-Forwarded-For` identifies the client.
    pub trust_proxy: bool,
}

impl AppState {
    /// Wires the services over `store` using the limits in `config`.
    #[must_use]
    pub fn new(store: Arc<dyn ReportStore>, clock: Arc<dyn Clock>, config: &ServerConfig) -> Self {
        let limiter = Arc::new(RateLimiter::in_memory(
            config.rate_limit,
            config.rate_limit_max_keys,
            clock.clone(),
        ));

        Self {
            reports: ReportService::new(store.clone(), limiter, clock.clone()),
            stats: StatsService::new(store.clone(), clock),
            admin: AdminService::new(store, config.admin_secret.clone()),
            trust_proxy: config.trust_proxy,
        }
    }
}

/// Registers the `/api` routes and request parsing settings.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/reports", web::get().to(handlers::list_reports))
            .route("/reports", web::post().to(handlers::submit_report))
            .route("/stats", web::get().to(handlers::stats))
            .route("/admin/reports", web::delete().to(handlers::delete_reports)),
    );
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let response = error::bad_request(format!("Invalid JSON body: {err}"));
            actix_web::error::InternalError::from_response(err, response).into()
        })
}

/// Opens the report store for `backend`, running migrations for Postgres.
///
/// # Errors
///
/// Returns [`ServerError`] if the connection or migrations fail.
pub async fn open_store(backend: StoreBackend) -> Result<Arc<dyn ReportStore>, ServerError> {
    let store: Arc<dyn ReportStore> = match backend {
        StoreBackend::InMemory => {
            log::warn!("Using the in-memory report store; reports will not survive a restart");
            Arc::new(MemoryReportStore::new())
        }
        StoreBackend::Database => {
            log::info!("Connecting to database...");
            let db_conn = db::connect_from_env()
                .await
                .map_err(|e| ServerError::Connect(e.to_string()))?;

            log::info!("Running migrations...");
            run_migrations(db_conn.as_ref()).await?;

            Arc::new(DatabaseReportStore::new(Arc::from(db_conn)))
        }
    };

    report_inventory(store.as_ref()).await?;

    Ok(store)
}

/// Reads the stored report count so an unreadable `reports` table fails
/// startup instead of the first request.
async fn report_inventory(store: &dyn ReportStore) -> Result<u64, ServerError> {
    let stored = store.count().await?;
    log::info!("{stored} report(s) on file");
    Ok(stored)
}

/// Starts the worm watch API server.
///
/// This is a regular async function; the caller provides the actix
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the store cannot be opened or the HTTP
/// server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig, backend: StoreBackend) -> Result<(), ServerError> {
    let store = open_store(backend).await?;
    let state = web::Data::new(AppState::new(store, Arc::new(SystemClock), &config));

    if config.trust_proxy {
        log::info!("Trusting X-Forwarded-For for client addresses");
    }

    let ServerConfig {
        bind_addr, port, ..
    } = config;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(app_config)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
