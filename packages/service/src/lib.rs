#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report, stats, and admin services for worm watch.
//!
//! The services sit between the HTTP handlers and the [`ReportStore`]:
//! they own validation, rate limiting, the clock, and the admin secret,
//! and surface every failure as a [`ServiceError`] the API layer maps to a
//! status code.
//!
//! [`ReportStore`]: worm_watch_database::ReportStore

pub mod admin;
pub mod reports;
pub mod stats;

pub use admin::{AdminService, DeleteOutcome};
pub use reports::ReportService;
pub use stats::StatsService;

use worm_watch_database::DbError;
use worm_watch_rate_limit::RateLimitError;
use worm_watch_report_models::ReportValidationError;

/// Errors returned by the services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The submission failed validation.
    #[error(transparent)]
    Validation(#[from] ReportValidationError),

    /// The client has used up its submissions for the current window.
    #[error("Too many reports. Please wait before submitting again.")]
    RateLimited,

    /// The admin credential was missing or wrong.
    #[error("Unauthorized")]
    Unauthorized,

    /// The report store failed.
    #[error(transparent)]
    Store(#[from] DbError),

    /// The rate limit backend failed.
    #[error(transparent)]
    RateLimiter(#[from] RateLimitError),
}
