//! Database query functions for worm reports.
//!
//! All queries are raw parameterized SQL via `query_raw_params()` /
//! `exec_raw_params()`. Timestamps are stored as UTC `TIMESTAMP` columns
//! and bound as naive UTC values.

use chrono::{DateTime, NaiveDateTime, Utc};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};
use worm_watch_database_models::{
    ActiveReportRow, DeleteFilter, InsertedReport, StatsRow, StatsWindow,
};
use worm_watch_report_models::{Intensity, NewReport};

use crate::DbError;
use crate::filter::where_clause;

/// Inserts a validated report and returns its server-assigned identity.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails or the returned row cannot be
/// parsed.
pub async fn insert_report(
    db: &dyn Database,
    report: &NewReport,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<InsertedReport, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO reports (lat, lng, intensity, notes, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, created_at",
            &[
                DatabaseValue::Real64(report.lat),
                DatabaseValue::Real64(report.lng),
                DatabaseValue::Int32(i32::from(report.intensity.value())),
                report
                    .notes
                    .as_ref()
                    .map_or(DatabaseValue::Null, |n| DatabaseValue::String(n.clone())),
                DatabaseValue::DateTime(created_at.naive_utc()),
                DatabaseValue::DateTime(expires_at.naive_utc()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Insert returned no row".to_string(),
    })?;

    let id: i64 = row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse report id: {e}"),
    })?;
    let created_at: NaiveDateTime = row.to_value("created_at").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse created_at: {e}"),
    })?;

    Ok(InsertedReport {
        id,
        created_at: created_at.and_utc(),
    })
}

/// Returns every report that has not expired at `now`, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be parsed.
pub async fn list_active_reports(
    db: &dyn Database,
    now: DateTime<Utc>,
) -> Result<Vec<ActiveReportRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT lat, lng, intensity, notes, created_at
             FROM reports
             WHERE expires_at > $1
             ORDER BY created_at DESC, id DESC",
            &[DatabaseValue::DateTime(now.naive_utc())],
        )
        .await?;

    let mut reports = Vec::with_capacity(rows.len());

    for row in &rows {
        let created_at: NaiveDateTime = row.to_value("created_at").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse created_at: {e}"),
        })?;

        let lat: f64 = row.to_value("lat").map_err(|e| conversion("lat", &e))?;
        let lng: f64 = row.to_value("lng").map_err(|e| conversion("lng", &e))?;
        let notes: Option<String> = row.to_value("notes").map_err(|e| conversion("notes", &e))?;

        reports.push(ActiveReportRow {
            lat,
            lng,
            intensity: intensity_column(row, "intensity")?,
            notes,
            created_at: created_at.and_utc(),
        });
    }

    Ok(reports)
}

/// Computes the stats snapshot in a single read-only query.
///
/// Bound parameters: `$1` start of the trailing week, `$2` now, `$3`/`$4`
/// last season's half-open range.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a column cannot be parsed.
pub async fn report_stats(db: &dyn Database, window: &StatsWindow) -> Result<StatsRow, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT
                (SELECT COUNT(*) FROM reports WHERE created_at >= $1)
                    AS total_reports_this_week,
                (SELECT COALESCE(SUM(intensity), 0) FROM reports WHERE created_at >= $1)::BIGINT
                    AS total_intensity_this_week,
                (SELECT COUNT(*) FROM reports WHERE expires_at > $2)
                    AS total_active_reports,
                (SELECT COUNT(*) FROM reports)
                    AS total_reports_all_time,
                (SELECT COUNT(*) FROM reports WHERE created_at >= $3 AND created_at < $4)
                    AS last_season_total_reports,
                (SELECT MAX(intensity) FROM reports WHERE created_at >= $3 AND created_at < $4)
                    AS last_season_peak_intensity,
                (SELECT MAX(created_at) FROM reports WHERE created_at >= $3 AND created_at < $4)
                    AS last_season_last_report_date",
            &[
                DatabaseValue::DateTime(window.week_start.naive_utc()),
                DatabaseValue::DateTime(window.now.naive_utc()),
                DatabaseValue::DateTime(window.season.start.naive_utc()),
                DatabaseValue::DateTime(window.season.end.naive_utc()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Stats query returned no row".to_string(),
    })?;

    let count = |column: &str| -> Result<i64, DbError> {
        row.to_value(column).map_err(|e| conversion(column, &e))
    };

    let peak: Option<i32> = row
        .to_value("last_season_peak_intensity")
        .map_err(|e| conversion("last_season_peak_intensity", &e))?;
    let last: Option<NaiveDateTime> = row
        .to_value("last_season_last_report_date")
        .map_err(|e| conversion("last_season_last_report_date", &e))?;

    Ok(StatsRow {
        total_reports_this_week: count("total_reports_this_week")?,
        total_intensity_this_week: count("total_intensity_this_week")?,
        total_active_reports: count("total_active_reports")?,
        total_reports_all_time: count("total_reports_all_time")?,
        last_season_total_reports: count("last_season_total_reports")?,
        last_season_peak_intensity: peak.map(parse_intensity).transpose()?,
        last_season_last_report_date: last.map(|n| n.and_utc()),
    })
}

/// Deletes every report matching `filter` and returns how many rows were
/// removed. An empty filter deletes the whole table.
///
/// # Errors
///
/// Returns [`DbError`] if the delete fails.
pub async fn delete_reports(db: &dyn Database, filter: &DeleteFilter) -> Result<u64, DbError> {
    let clause = where_clause(&filter.predicates(), 1);
    let sql = format!("DELETE FROM reports{}", clause.sql);

    let deleted = db.exec_raw_params(&sql, &clause.params).await?;

    log::info!("Deleted {deleted} report(s) with filter {filter:?}");

    Ok(deleted)
}

/// Counts every stored report, expired or not.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_reports(db: &dyn Database) -> Result<u64, DbError> {
    let rows = db
        .query_raw_params("SELECT COUNT(*) AS total FROM reports", &[])
        .await?;

    let total: i64 = rows
        .first()
        .map(|row| row.to_value("total"))
        .transpose()
        .map_err(|e| DbError::Conversion {
            message: format!("Failed to parse report count: {e}"),
        })?
        .unwrap_or(0);

    u64::try_from(total).map_err(|e| conversion("report count", &e))
}

fn conversion(column: &str, error: &impl std::fmt::Display) -> DbError {
    DbError::Conversion {
        message: format!("Failed to parse {column}: {error}"),
    }
}

fn intensity_column(row: &Row, column: &str) -> Result<Intensity, DbError> {
    let raw: i32 = row.to_value(column).map_err(|e| conversion(column, &e))?;
    parse_intensity(raw)
}

fn parse_intensity(raw: i32) -> Result<Intensity, DbError> {
    u8::try_from(raw)
        .ok()
        .and_then(|v| Intensity::from_value(v).ok())
        .ok_or_else(|| DbError::Conversion {
            message: format!("Stored intensity {raw} is outside 1-5"),
        })
}
