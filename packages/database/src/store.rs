//! The report store seam used by the services.
//!
//! [`DatabaseReportStore`] delegates to [`crate::queries`];
//! [`MemoryReportStore`] keeps rows in a `Vec` and evaluates the same
//! predicates in process. The in-memory store backs local development
//! (`serve --in-memory`) and the service and HTTP tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use switchy_database::Database;
use worm_watch_database_models::{
    ActiveReportRow, DeleteFilter, InsertedReport, ReportRow, StatsRow, StatsWindow,
};
use worm_watch_report_models::NewReport;

use crate::{DbError, queries};

/// Persistence operations for reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persists a validated report.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the write fails.
    async fn insert(
        &self,
        report: &NewReport,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<InsertedReport, DbError>;

    /// Lists reports that have not expired at `now`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<ActiveReportRow>, DbError>;

    /// Computes aggregate statistics for `window`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    async fn stats(&self, window: &StatsWindow) -> Result<StatsRow, DbError>;

    /// Deletes matching reports and returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the delete fails.
    async fn delete(&self, filter: &DeleteFilter) -> Result<u64, DbError>;

    /// Counts every stored report, expired or not.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the read fails.
    async fn count(&self) -> Result<u64, DbError>;
}

/// [`ReportStore`] backed by a `switchy_database` connection.
#[derive(Clone)]
pub struct DatabaseReportStore {
    db: Arc<dyn Database>,
}

impl std::fmt::Debug for DatabaseReportStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseReportStore").finish_non_exhaustive()
    }
}

impl DatabaseReportStore {
    /// Wraps an open connection.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReportStore for DatabaseReportStore {
    async fn insert(
        &self,
        report: &NewReport,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<InsertedReport, DbError> {
        queries::insert_report(self.db.as_ref(), report, created_at, expires_at).await
    }

    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<ActiveReportRow>, DbError> {
        queries::list_active_reports(self.db.as_ref(), now).await
    }

    async fn stats(&self, window: &StatsWindow) -> Result<StatsRow, DbError> {
        queries::report_stats(self.db.as_ref(), window).await
    }

    async fn delete(&self, filter: &DeleteFilter) -> Result<u64, DbError> {
        queries::delete_reports(self.db.as_ref(), filter).await
    }

    async fn count(&self) -> Result<u64, DbError> {
        queries::count_reports(self.db.as_ref()).await
    }
}

/// [`ReportStore`] that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    rows: Mutex<Vec<ReportRow>>,
    last_id: AtomicI64,
}

impl MemoryReportStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully specified row, bypassing validation. Used to seed
    /// historical data; the row's `id` is replaced with the next one.
    pub fn seed(&self, mut row: ReportRow) -> i64 {
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        row.id = id;
        self.lock().push(row);
        id
    }

    /// Returns a copy of every stored row, in insertion order.
    #[must_use]
    pub fn rows(&self) -> Vec<ReportRow> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReportRow>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn insert(
        &self,
        report: &NewReport,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<InsertedReport, DbError> {
        let id = self.seed(ReportRow {
            id: 0,
            lat: report.lat,
            lng: report.lng,
            intensity: report.intensity,
            notes: report.notes.clone(),
            created_at,
            expires_at,
        });

        Ok(InsertedReport { id, created_at })
    }

    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<ActiveReportRow>, DbError> {
        let rows = self.lock();
        let mut active: Vec<&ReportRow> = rows.iter().filter(|r| r.is_active(now)).collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(active.into_iter().map(ActiveReportRow::from).collect())
    }

    async fn stats(&self, window: &StatsWindow) -> Result<StatsRow, DbError> {
        Ok(StatsRow::compute(self.lock().iter(), window))
    }

    async fn delete(&self, filter: &DeleteFilter) -> Result<u64, DbError> {
        let predicates = filter.predicates();
        let mut rows = self.lock();
        let before = rows.len();
        rows.retain(|r| !predicates.matches(r));
        Ok((before - rows.len()) as u64)
    }

    async fn count(&self) -> Result<u64, DbError> {
        Ok(self.lock().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use worm_watch_report_models::{Intensity, report_retention};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn report(lat: f64, lng: f64, intensity: Intensity) -> NewReport {
        NewReport {
            lat,
            lng,
            intensity,
            notes: None,
        }
    }

    async fn insert_at(store: &MemoryReportStore, r: &NewReport, at: DateTime<Utc>) {
        store.insert(r, at, at + report_retention()).await.unwrap();
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let store = MemoryReportStore::new();
        let now = ts("2026-06-01T12:00:00Z");
        let r = report(49.9, -97.1, Intensity::Noticeable);

        let a = store.insert(&r, now, now + report_retention()).await.unwrap();
        let b = store.insert(&r, now, now + report_retention()).await.unwrap();

        assert!(b.id > a.id);
        assert_eq!(a.created_at, now);
    }

    #[tokio::test]
    async fn list_active_excludes_expired_and_orders_newest_first() {
        let store = MemoryReportStore::new();
        let now = ts("2026-06-10T12:00:00Z");

        insert_at(&store, &report(49.9, -97.1, Intensity::Stragglers), now - TimeDelta::hours(47)).await;
        insert_at(&store, &report(49.9, -97.1, Intensity::Plague), now - TimeDelta::hours(48)).await;
        insert_at(&store, &report(49.9, -97.1, Intensity::GettingGross), now - TimeDelta::hours(1)).await;

        let active = store.list_active(now).await.unwrap();

        assert_eq!(active.len(), 2);
        assert_eq!(active[0].intensity, Intensity::GettingGross);
        assert_eq!(active[1].intensity, Intensity::Stragglers);

        for row in store.rows() {
            if active.iter().any(|a| a.created_at == row.created_at) {
                assert!(row.expires_at > now);
            }
        }
    }

    #[tokio::test]
    async fn delete_without_filters_removes_everything() {
        let store = MemoryReportStore::new();
        let now = ts("2026-06-10T12:00:00Z");
        for i in 0..7 {
            insert_at(&store, &report(49.9, -97.1, Intensity::Noticeable), now - TimeDelta::days(i)).await;
        }

        let total = store.count().await.unwrap();
        let deleted = store.delete(&DeleteFilter::default()).await.unwrap();

        assert_eq!(deleted, total);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_with_since_and_box_removes_exact_matches() {
        let store = MemoryReportStore::new();
        let since = ts("2026-05-15T20:00:00Z");

        let points = [
            (49.88, -97.15, since),
            (49.88, -97.15, since - TimeDelta::minutes(1)),
            (49.95, -97.15, since + TimeDelta::hours(1)),
            (49.89, -97.16, since + TimeDelta::hours(2)),
            (49.90, -97.14, since + TimeDelta::hours(3)),
        ];
        for (lat, lng, at) in points {
            insert_at(&store, &report(lat, lng, Intensity::FullInfestation), at).await;
        }

        let filter = DeleteFilter {
            since: Some(since),
            lat_min: Some(49.87),
            lat_max: Some(49.90),
            lng_min: Some(-97.17),
            lng_max: Some(-97.14),
        };

        let expected = store
            .rows()
            .iter()
            .filter(|r| {
                r.created_at >= since
                    && (49.87..=49.90).contains(&r.lat)
                    && (-97.17..=-97.14).contains(&r.lng)
            })
            .count() as u64;

        let deleted = store.delete(&filter).await.unwrap();

        assert_eq!(deleted, expected);
        assert_eq!(deleted, 3);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn stats_intensity_sum_matches_independent_sum() {
        let store = MemoryReportStore::new();
        let now = ts("2026-06-10T12:00:00Z");
        let intensities = [
            Intensity::Plague,
            Intensity::Stragglers,
            Intensity::GettingGross,
            Intensity::Noticeable,
        ];
        for (i, intensity) in intensities.iter().enumerate() {
            let days = i64::try_from(i).unwrap() * 3;
            insert_at(&store, &report(49.9, -97.1, *intensity), now - TimeDelta::days(days)).await;
        }

        let window = StatsWindow::at(now);
        let stats = store.stats(&window).await.unwrap();

        let expected: i64 = store
            .rows()
            .iter()
            .filter(|r| r.created_at >= now - TimeDelta::days(7))
            .map(|r| i64::from(r.intensity.value()))
            .sum();

        assert_eq!(stats.total_intensity_this_week, expected);
        assert_eq!(stats.total_reports_this_week, 3);
        assert_eq!(stats.total_reports_all_time, 4);
    }
}
