//! Season banner state.

use chrono::{DateTime, Datelike as _, Utc};
use strum_macros::{AsRefStr, Display};
use worm_watch_report_models::is_season_month;
use worm_watch_server_models::ApiStats;

/// What the season banner should say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonStatus {
    /// In season and worms have been reported.
    Active,
    /// In season with no active reports yet.
    Watch,
    /// Outside May through July.
    Dormant,
}

impl SeasonStatus {
    /// Status for a 1-indexed calendar `month` given the number of active
    /// reports.
    #[must_use]
    pub const fn for_month(month: u32, active_reports: usize) -> Self {
        if !is_season_month(month) {
            Self::Dormant
        } else if active_reports > 0 {
            Self::Active
        } else {
            Self::Watch
        }
    }

    /// Status at `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>, active_reports: usize) -> Self {
        Self::for_month(now.month(), active_reports)
    }
}

/// Whether there is no prior season to compare against: the snapshot is
/// missing or last season had no reports.
#[must_use]
pub fn is_first_year(stats: Option<&ApiStats>) -> bool {
    stats.is_none_or(|s| s.last_season_total_reports == 0)
}
