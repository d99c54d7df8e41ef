//! Report submission and listing.

use std::sync::Arc;

use worm_watch_database::ReportStore;
use worm_watch_database_models::{ActiveReportRow, InsertedReport};
use worm_watch_rate_limit::RateLimiter;
use worm_watch_report_models::{ReportSubmission, report_retention};
use worm_watch_time::Clock;

use crate::ServiceError;

/// Accepts new sightings and lists the active ones.
pub struct ReportService {
    store: Arc<dyn ReportStore>,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        store: Arc<dyn ReportStore>,
        limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            limiter,
            clock,
        }
    }

    /// Validates and stores a submission from `client_key`.
    ///
    /// Validation runs first and never touches the limiter, so malformed
    /// requests do not use up a client's quota. A rate-limited submission
    /// is never written.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Validation`] if the submission is invalid
    /// * [`ServiceError::RateLimited`] if the client is over its limit
    /// * [`ServiceError::Store`] / [`ServiceError::RateLimiter`] on backend
    ///   failure
    pub async fn submit(
        &self,
        client_key: &str,
        submission: ReportSubmission,
    ) -> Result<InsertedReport, ServiceError> {
        let report = submission.validate()?;

        if !self.limiter.check_and_record(client_key).await? {
            log::warn!("Rate limited report submission from {client_key}");
            return Err(ServiceError::RateLimited);
        }

        let now = self.clock.now();
        let inserted = self
            .store
            .insert(&report, now, now + report_retention())
            .await?;

        log::info!(
            "Stored report {} (intensity {}) from {client_key}",
            inserted.id,
            report.intensity.value()
        );

        Ok(inserted)
    }

    /// Lists every report that has not yet expired, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store fails.
    pub async fn list_active(&self) -> Result<Vec<ActiveReportRow>, ServiceError> {
        Ok(self.store.list_active(self.clock.now()).await?)
    }
}
