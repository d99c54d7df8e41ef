//! HTTP handler functions for the worm watch API.

use std::net::SocketAddr;

use actix_web::{HttpRequest, HttpResponse, web};
use worm_watch_database_models::DeleteFilter;
use worm_watch_server_models::{
    ApiCreatedReport, ApiDeleteParams, ApiDeleteResult, ApiHealth, ApiNewReport, ApiReport,
    ApiStats,
};
use worm_watch_service::ServiceError;

use crate::AppState;
use crate::error::{ApiFailure, bad_request};

/// Header carrying the admin credential.
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/reports`
///
/// Lists every active report, newest first.
pub async fn list_reports(state: web::Data<AppState>) -> Result<HttpResponse, ApiFailure> {
    let reports: Vec<ApiReport> = state
        .reports
        .list_active()
        .await?
        .into_iter()
        .map(ApiReport::from)
        .collect();

    Ok(HttpResponse::Ok().json(reports))
}

/// `POST /api/reports`
///
/// Validates, rate limits, and stores a new sighting.
pub async fn submit_report(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ApiNewReport>,
) -> Result<HttpResponse, ApiFailure> {
    let client = client_key(&req, state.trust_proxy);
    let inserted = state
        .reports
        .submit(&client, body.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(ApiCreatedReport::from(inserted)))
}

/// `GET /api/stats`
pub async fn stats(state: web::Data<AppState>) -> Result<HttpResponse, ApiFailure> {
    let snapshot = state.stats.snapshot().await?;
    Ok(HttpResponse::Ok().json(ApiStats::from(snapshot)))
}

/// `DELETE /api/admin/reports`
///
/// The credential is checked before the filters are parsed, so an
/// unauthenticated caller always gets 401.
pub async fn delete_reports(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiFailure> {
    let credential = req
        .headers()
        .get(ADMIN_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    if !state.admin.is_authorized(credential) {
        log::warn!(
            "Rejected admin request from {}",
            client_key(&req, state.trust_proxy)
        );
        return Err(ServiceError::Unauthorized.into());
    }

    let params = match web::Query::<ApiDeleteParams>::from_query(req.query_string()) {
        Ok(params) => params.into_inner(),
        Err(e) => return Ok(bad_request(format!("Invalid filter: {e}"))),
    };

    let outcome = state
        .admin
        .delete_reports(credential, &DeleteFilter::from(params))
        .await?;

    Ok(HttpResponse::Ok().json(ApiDeleteResult {
        deleted: outcome.deleted,
        message: outcome.message,
    }))
}

/// Resolves the rate-limit key for a request.
///
/// `X-Forwarded-For` is only honored when the server is configured to sit
/// behind a trusted proxy; otherwise the socket peer address is used.
pub fn client_key(req: &HttpRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        let info = req.connection_info();
        if let Some(addr) = info.realip_remote_addr() {
            return host_of(addr);
        }
    }

    req.peer_addr()
        .map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string())
}

fn host_of(addr: &str) -> String {
    addr.parse::<SocketAddr>()
        .map_or_else(|_| addr.trim().to_string(), |socket| socket.ip().to_string())
}
