//! Aggregate statistics snapshot.

use std::sync::Arc;

use worm_watch_database::ReportStore;
use worm_watch_database_models::{StatsRow, StatsWindow};
use worm_watch_time::Clock;

use crate::ServiceError;

/// Computes the public stats snapshot.
pub struct StatsService {
    store: Arc<dyn ReportStore>,
    clock: Arc<dyn Clock>,
}

impl StatsService {
    /// Creates a stats service reading from `store` as of `clock`.
    #[must_use]
    pub fn new(store: Arc<dyn ReportStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Computes the snapshot as of the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the store fails.
    pub async fn snapshot(&self) -> Result<StatsRow, ServiceError> {
        let window = StatsWindow::at(self.clock.now());
        log::debug!(
            "Computing stats for week starting {} and season {} to {}",
            window.week_start,
            window.season.start,
            window.season.end
        );
        Ok(self.store.stats(&window).await?)
    }
}
