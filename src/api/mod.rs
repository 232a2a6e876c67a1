pub mod attendance;
pub mod hooks;
pub mod leave_request;
pub mod members;
pub mod profile;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;
use crate::store::mysql::MySqlStore;
use crate::utils::attendance_cache::CachedAttendanceStore;

/// Attendance store shared by every worker.
pub type AppAttendanceStore = CachedAttendanceStore<MySqlStore>;

/// Upstream failure reported to the client as `500 {"message": ...}`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    message: &'static str,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::InternalServerError().json(json!({ "message": self.message }))
    }
}

/// Logs an upstream failure and turns it into a JSON 500.
pub(crate) fn internal_error(e: StoreError, what: &'static str) -> ApiError {
    tracing::error!(error = %e, "{}", what);
    ApiError { message: what }
}
