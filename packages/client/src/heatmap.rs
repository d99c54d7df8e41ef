//! Heatmap projection of active reports.

use serde::{Deserialize, Serialize};
use worm_watch_server_models::ApiReport;

/// One weighted heatmap sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Intensity normalized to `(0, 1]`.
    pub weight: f64,
}

impl From<&ApiReport> for HeatmapPoint {
    fn from(report: &ApiReport) -> Self {
        Self {
            lat: report.lat,
            lng: report.lng,
            weight: report.intensity.weight(),
        }
    }
}

/// Projects reports to heatmap points, preserving order.
#[must_use]
pub fn to_heatmap_points(reports: &[ApiReport]) -> Vec<HeatmapPoint> {
    reports.iter().map(HeatmapPoint::from).collect()
}
