#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database row types, the stats snapshot, and deletion filter predicates.
//!
//! These types represent the shapes of data as stored in and retrieved from
//! the reports table. They are distinct from the API response types in
//! `worm_watch_server_models` and the submission types in
//! `worm_watch_report_models`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use worm_watch_report_models::{Intensity, SeasonWindow};

/// A report row as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Primary key.
    pub id: i64,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Intensity level.
    pub intensity: Intensity,
    /// Free-text notes.
    pub notes: Option<String>,
    /// When the report was submitted.
    pub created_at: DateTime<Utc>,
    /// When the report stops being shown.
    pub expires_at: DateTime<Utc>,
}

impl ReportRow {
    /// Whether the report has not yet expired at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// The projection of a report returned by the active-reports listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveReportRow {
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Intensity level.
    pub intensity: Intensity,
    /// Free-text notes.
    pub notes: Option<String>,
    /// When the report was submitted.
    pub created_at: DateTime<Utc>,
}

impl From<&ReportRow> for ActiveReportRow {
    fn from(row: &ReportRow) -> Self {
        Self {
            lat: row.lat,
            lng: row.lng,
            intensity: row.intensity,
            notes: row.notes.clone(),
            created_at: row.created_at,
        }
    }
}

/// Identity of a freshly inserted report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedReport {
    /// Server-assigned primary key.
    pub id: i64,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

/// Time bounds for one stats snapshot, fixed at a single instant so every
/// aggregate in the snapshot agrees on "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    /// The instant the snapshot is taken.
    pub now: DateTime<Utc>,
    /// Start of the trailing seven-day window (inclusive).
    pub week_start: DateTime<Utc>,
    /// Last year's season.
    pub season: SeasonWindow,
}

impl StatsWindow {
    /// Length of the "this week" window.
    pub const WEEK_DAYS: i64 = 7;

    /// Builds the window for a snapshot taken at `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            week_start: now - TimeDelta::days(Self::WEEK_DAYS),
            season: SeasonWindow::previous(now),
        }
    }
}

/// Aggregate report statistics. Derived on every read, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRow {
    /// Reports created in the last seven days.
    pub total_reports_this_week: i64,
    /// Sum of intensities over the last seven days.
    pub total_intensity_this_week: i64,
    /// Reports that have not yet expired.
    pub total_active_reports: i64,
    /// Every report ever kept.
    pub total_reports_all_time: i64,
    /// Reports created during last year's season.
    pub last_season_total_reports: i64,
    /// Highest intensity seen during last year's season.
    pub last_season_peak_intensity: Option<Intensity>,
    /// Newest report created during last year's season.
    pub last_season_last_report_date: Option<DateTime<Utc>>,
}

impl StatsRow {
    /// Computes the snapshot from an in-memory set of rows.
    #[must_use]
    pub fn compute<'a>(rows: impl IntoIterator<Item = &'a ReportRow>, window: &StatsWindow) -> Self {
        let mut stats = Self::default();

        for row in rows {
            stats.total_reports_all_time += 1;

            if row.created_at >= window.week_start {
                stats.total_reports_this_week += 1;
                stats.total_intensity_this_week += i64::from(row.intensity.value());
            }

            if row.is_active(window.now) {
                stats.total_active_reports += 1;
            }

            if window.season.contains(row.created_at) {
                stats.last_season_total_reports += 1;
                stats.last_season_peak_intensity = stats
                    .last_season_peak_intensity
                    .max(Some(row.intensity));
                stats.last_season_last_report_date = stats
                    .last_season_last_report_date
                    .max(Some(row.created_at));
            }
        }

        stats
    }
}

/// Report columns that deletion predicates may constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportColumn {
    /// `created_at`
    CreatedAt,
    /// `lat`
    Lat,
    /// `lng`
    Lng,
}

impl ReportColumn {
    /// Column name in the reports table.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Lat => "lat",
            Self::Lng => "lng",
        }
    }
}

/// Inclusive comparisons used by deletion predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `column >= value`
    AtLeast,
    /// `column <= value`
    AtMost,
}

impl Comparison {
    /// SQL operator for this comparison.
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::AtLeast => ">=",
            Self::AtMost => "<=",
        }
    }

    fn holds<T: PartialOrd>(self, left: &T, right: &T) -> bool {
        match self {
            Self::AtLeast => left >= right,
            Self::AtMost => left <= right,
        }
    }
}

/// A typed predicate operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PredicateValue {
    /// A UTC timestamp.
    Timestamp(DateTime<Utc>),
    /// A coordinate in degrees.
    Real(f64),
}

impl From<DateTime<Utc>> for PredicateValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<f64> for PredicateValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

/// One `column <op> value` condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predicate {
    /// Constrained column.
    pub column: ReportColumn,
    /// Comparison applied.
    pub comparison: Comparison,
    /// Right-hand operand.
    pub value: PredicateValue,
}

impl Predicate {
    /// Evaluates the predicate against a stored row.
    ///
    /// A predicate whose operand type does not fit the column never matches.
    #[must_use]
    pub fn matches(&self, row: &ReportRow) -> bool {
        match (self.column, self.value) {
            (ReportColumn::CreatedAt, PredicateValue::Timestamp(at)) => {
                self.comparison.holds(&row.created_at, &at)
            }
            (ReportColumn::Lat, PredicateValue::Real(v)) => self.comparison.holds(&row.lat, &v),
            (ReportColumn::Lng, PredicateValue::Real(v)) => self.comparison.holds(&row.lng, &v),
            _ => false,
        }
    }
}

/// An ordered conjunction of [`Predicate`]s.
///
/// Built up one optional condition at a time; an empty set matches every
/// row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Adds a condition.
    #[must_use]
    pub fn with(
        mut self,
        column: ReportColumn,
        comparison: Comparison,
        value: impl Into<PredicateValue>,
    ) -> Self {
        self.predicates.push(Predicate {
            column,
            comparison,
            value: value.into(),
        });
        self
    }

    /// Adds a condition only when `value` is present.
    #[must_use]
    pub fn with_optional<V: Into<PredicateValue>>(
        self,
        column: ReportColumn,
        comparison: Comparison,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(value) => self.with(column, comparison, value),
            None => self,
        }
    }

    /// Whether no conditions were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// The conditions in insertion order.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Whether every condition holds for `row`.
    #[must_use]
    pub fn matches(&self, row: &ReportRow) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }
}

/// Optional filters for bulk deletion. Supplied filters are ANDed together;
/// an empty filter selects every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteFilter {
    /// Only rows created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only rows with `lat >= lat_min`.
    pub lat_min: Option<f64>,
    /// Only rows with `lat <= lat_max`.
    pub lat_max: Option<f64>,
    /// Only rows with `lng >= lng_min`.
    pub lng_min: Option<f64>,
    /// Only rows with `lng <= lng_max`.
    pub lng_max: Option<f64>,
}

impl DeleteFilter {
    /// Converts the supplied filters into a predicate set.
    #[must_use]
    pub fn predicates(&self) -> PredicateSet {
        PredicateSet::new()
            .with_optional(ReportColumn::CreatedAt, Comparison::AtLeast, self.since)
            .with_optional(ReportColumn::Lat, Comparison::AtLeast, self.lat_min)
            .with_optional(ReportColumn::Lat, Comparison::AtMost, self.lat_max)
            .with_optional(ReportColumn::Lng, Comparison::AtLeast, self.lng_min)
            .with_optional(ReportColumn::Lng, Comparison::AtMost, self.lng_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn row(id: i64, lat: f64, lng: f64, intensity: u8, created_at: &str) -> ReportRow {
        let created_at = ts(created_at);
        ReportRow {
            id,
            lat,
            lng,
            intensity: Intensity::from_value(intensity).unwrap(),
            notes: None,
            created_at,
            expires_at: created_at + TimeDelta::hours(48),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = DeleteFilter::default();
        assert!(filter.predicates().is_empty());
        assert!(filter.predicates().matches(&row(1, 0.0, 0.0, 1, "2020-01-01T00:00:00Z")));
    }

    #[test]
    fn filter_predicates_follow_field_order() {
        let filter = DeleteFilter {
            since: Some(ts("2026-05-15T20:00:00Z")),
            lat_min: Some(49.88),
            lng_max: Some(-97.10),
            ..DeleteFilter::default()
        };

        let set = filter.predicates();
        let columns: Vec<_> = set
            .predicates()
            .iter()
            .map(|p| (p.column.name(), p.comparison.operator()))
            .collect();

        assert_eq!(
            columns,
            vec![("created_at", ">="), ("lat", ">="), ("lng", "<=")]
        );
    }

    #[test]
    fn since_and_box_are_anded_and_inclusive() {
        let filter = DeleteFilter {
            since: Some(ts("2026-05-15T20:00:00Z")),
            lat_min: Some(49.87),
            lat_max: Some(49.90),
            lng_min: Some(-97.17),
            lng_max: Some(-97.14),
        };
        let set = filter.predicates();

        // On the edges, at the boundary instant.
        assert!(set.matches(&row(1, 49.87, -97.17, 2, "2026-05-15T20:00:00Z")));
        assert!(set.matches(&row(2, 49.90, -97.14, 2, "2026-05-16T08:00:00Z")));
        // Inside the box but too old.
        assert!(!set.matches(&row(3, 49.88, -97.15, 2, "2026-05-15T19:59:59Z")));
        // Recent but outside the box.
        assert!(!set.matches(&row(4, 49.95, -97.15, 2, "2026-05-16T08:00:00Z")));
    }

    #[test]
    fn mismatched_operand_never_matches() {
        let set = PredicateSet::new().with(ReportColumn::Lat, Comparison::AtLeast, ts("2020-01-01T00:00:00Z"));
        assert!(!set.matches(&row(1, 49.9, -97.1, 1, "2026-01-01T00:00:00Z")));
    }

    #[test]
    fn stats_compute_matches_hand_count() {
        let window = StatsWindow::at(ts("2026-06-10T12:00:00Z"));
        let rows = [
            row(1, 49.9, -97.1, 3, "2026-06-10T00:00:00Z"),
            row(2, 49.9, -97.1, 5, "2026-06-04T12:00:00Z"),
            row(3, 49.9, -97.1, 4, "2026-06-01T00:00:00Z"),
            row(4, 49.9, -97.1, 2, "2025-05-01T00:00:00Z"),
            row(5, 49.9, -97.1, 4, "2025-07-20T15:30:00Z"),
            row(6, 49.9, -97.1, 5, "2025-08-01T00:00:00Z"),
        ];

        let stats = StatsRow::compute(&rows, &window);

        assert_eq!(stats.total_reports_this_week, 2);
        assert_eq!(stats.total_intensity_this_week, 8);
        assert_eq!(stats.total_active_reports, 1);
        assert_eq!(stats.total_reports_all_time, 6);
        assert_eq!(stats.last_season_total_reports, 2);
        assert_eq!(
            stats.last_season_peak_intensity,
            Some(Intensity::FullInfestation)
        );
        assert_eq!(
            stats.last_season_last_report_date,
            Some(ts("2025-07-20T15:30:00Z"))
        );
    }

    #[test]
    fn stats_of_empty_store_has_null_season() {
        let stats = StatsRow::compute(&[], &StatsWindow::at(ts("2026-06-10T12:00:00Z")));
        assert_eq!(stats, StatsRow::default());
        assert!(stats.last_season_peak_intensity.is_none());
    }
}
