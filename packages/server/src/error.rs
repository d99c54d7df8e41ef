//! Maps service failures onto HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use worm_watch_server_models::ApiError;
use worm_watch_service::ServiceError;

/// A [`ServiceError`] on its way out as an HTTP response.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiFailure(#[from] pub ServiceError);

impl ResponseError for ApiFailure {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Store(_) | ServiceError::RateLimiter(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        HttpResponse::build(status).json(ApiError::new(message))
    }
}

/// Builds a `400 {error}` response for a request that could not be parsed.
pub fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::new(message))
}
