//! Authenticated bulk deletion.

use std::sync::Arc;

use worm_watch_database::ReportStore;
use worm_watch_database_models::DeleteFilter;

use crate::ServiceError;

/// Result of an admin delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Number of rows removed.
    pub deleted: u64,
    /// Human-readable summary for the operator.
    pub message: String,
}

impl DeleteOutcome {
    /// Builds the outcome and its message for `deleted` rows.
    #[must_use]
    pub fn new(deleted: u64) -> Self {
        let message = if deleted == 0 {
            "No reports matched those filters.".to_string()
        } else {
            let plural = if deleted == 1 { "" } else { "s" };
            format!("Deleted {deleted} report{plural}.")
        };
        Self { deleted, message }
    }
}

/// Deletes reports on behalf of an operator holding the shared secret.
pub struct AdminService {
    store: Arc<dyn ReportStore>,
    secret: Option<String>,
}

impl AdminService {
    /// Creates the service. With no `secret` configured every request is
    /// refused.
    #[must_use]
    pub fn new(store: Arc<dyn ReportStore>, secret: Option<String>) -> Self {
        let secret = secret.filter(|s| !s.is_empty());
        if secret.is_none() {
            log::warn!("No admin secret configured; admin endpoints will reject all requests");
        }
        Self { store, secret }
    }

    /// Returns whether `credential` exactly matches the configured secret.
    #[must_use]
    pub fn is_authorized(&self, credential: Option<&str>) -> bool {
        match (self.secret.as_deref(), credential) {
            (Some(secret), Some(given)) => constant_time_eq(secret.as_bytes(), given.as_bytes()),
            _ => false,
        }
    }

    /// Deletes every report matching `filter` once `credential` checks out.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] if the credential is missing or
    ///   wrong, in which case nothing is queried
    /// * [`ServiceError::Store`] if the delete fails
    pub async fn delete_reports(
        &self,
        credential: Option<&str>,
        filter: &DeleteFilter,
    ) -> Result<DeleteOutcome, ServiceError> {
        if !self.is_authorized(credential) {
            log::warn!("Rejected admin delete with invalid credential");
            return Err(ServiceError::Unauthorized);
        }

        let deleted = self.store.delete(filter).await?;
        log::info!("Admin deleted {deleted} report(s)");

        Ok(DeleteOutcome::new(deleted))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
