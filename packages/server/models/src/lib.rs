#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the worm watch server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the database row types so the wire contract can evolve on its own.
//! Report and stats bodies use `snake_case` field names; the admin query
//! string uses `camelCase`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use worm_watch_database_models::{ActiveReportRow, DeleteFilter, InsertedReport, StatsRow};
use worm_watch_report_models::{Intensity, ReportSubmission};

/// An active report as returned by `GET /api/reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiReport {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Intensity 1-5, serialized as a number.
    pub intensity: Intensity,
    /// Free-text notes, `null` when none were given.
    pub notes: Option<String>,
    /// When the report was stored.
    pub created_at: DateTime<Utc>,
}

impl From<ActiveReportRow> for ApiReport {
    fn from(row: ActiveReportRow) -> Self {
        Self {
            lat: row.lat,
            lng: row.lng,
            intensity: row.intensity,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

/// Body of `POST /api/reports`.
///
/// Every field is optional at the parse stage so that missing fields are
/// reported by validation rather than as a JSON error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiNewReport {
    /// Latitude; must be within the service area.
    pub lat: Option<f64>,
    /// Longitude; must be within the service area.
    pub lng: Option<f64>,
    /// Whole number 1-5. Accepted as any JSON number so fractions fail
    /// validation instead of parsing.
    pub intensity: Option<f64>,
    /// Optional free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<ApiNewReport> for ReportSubmission {
    fn from(body: ApiNewReport) -> Self {
        Self {
            lat: body.lat,
            lng: body.lng,
            intensity: body.intensity,
            notes: body.notes,
        }
    }
}

/// Response of a successful `POST /api/reports`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCreatedReport {
    /// Server-assigned identifier.
    pub id: i64,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

impl From<InsertedReport> for ApiCreatedReport {
    fn from(inserted: InsertedReport) -> Self {
        Self {
            id: inserted.id,
            created_at: inserted.created_at,
        }
    }
}

/// Response of `GET /api/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStats {
    /// Reports created in the trailing seven days.
    pub total_reports_this_week: i64,
    /// Sum of intensity over the trailing seven days.
    pub total_intensity_this_week: i64,
    /// Reports that have not yet expired.
    pub total_active_reports: i64,
    /// Every stored report.
    pub total_reports_all_time: i64,
    /// Reports created during last calendar year's season.
    pub last_season_total_reports: i64,
    /// `null` when last season had no reports.
    pub last_season_peak_intensity: Option<Intensity>,
    /// `null` when last season had no reports.
    pub last_season_last_report_date: Option<DateTime<Utc>>,
}

impl From<StatsRow> for ApiStats {
    fn from(row: StatsRow) -> Self {
        Self {
            total_reports_this_week: row.total_reports_this_week,
            total_intensity_this_week: row.total_intensity_this_week,
            total_active_reports: row.total_active_reports,
            total_reports_all_time: row.total_reports_all_time,
            last_season_total_reports: row.last_season_total_reports,
            last_season_peak_intensity: row.last_season_peak_intensity,
            last_season_last_report_date: row.last_season_last_report_date,
        }
    }
}

/// Query parameters for `DELETE /api/admin/reports`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDeleteParams {
    /// Inclusive lower bound on `created_at` (RFC 3339).
    pub since: Option<DateTime<Utc>>,
    /// Inclusive southern edge of the bounding box.
    pub lat_min: Option<f64>,
    /// Inclusive northern edge of the bounding box.
    pub lat_max: Option<f64>,
    /// Inclusive western edge of the bounding box.
    pub lng_min: Option<f64>,
    /// Inclusive eastern edge of the bounding box.
    pub lng_max: Option<f64>,
}

impl From<ApiDeleteParams> for DeleteFilter {
    fn from(params: ApiDeleteParams) -> Self {
        Self {
            since: params.since,
            lat_min: params.lat_min,
            lat_max: params.lat_max,
            lng_min: params.lng_min,
            lng_max: params.lng_max,
        }
    }
}

/// Response of a successful admin delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDeleteResult {
    /// Number of reports removed.
    pub deleted: u64,
    /// Human-readable summary, e.g. `Deleted 2 reports.`
    pub message: String,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Message describing the failure.
    pub error: String,
}

impl ApiError {
    /// Wraps `error` as a response body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}
