use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::internal_error;
use crate::auth::auth::Session;
use crate::model::leave_request::{RequestDetails, RequestKind, RequestStatus, TimeOffRequest};
use crate::policy::access_control::AccessControlPolicy;
use crate::store::{RequestFilter, RequestStore};
use crate::utils::change_feed::{ChangeEvent, ChangeFeed, ChangeKind};

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
            "id": "3a6b1f0e-9c2d-4e7a-8b15-2d3c4e5f6a7b",
            "subject_id": "0b8e7f5c-1d2a-4c3b-8e9f-0a1b2c3d4e5f",
            "reason": "Family event",
            "message": "Travelling out of town",
            "requested_days": ["2024-04-22", "2024-04-23"],
            "status": "pending",
            "created_at": "2024-04-15T05:52:00Z",
            "updated_at": "2024-04-15T05:52:00Z"
        }
    ],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct RequestListResponse {
    pub data: Vec<TimeOffRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams)]
pub struct RequestListQuery {
    /// Filter by requester (admin only; others always see their own)
    pub subject_id: Option<String>,
    /// Filter by status
    pub status: Option<RequestStatus>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Items per page, at most 100
    pub per_page: Option<u64>,
}

fn pagination(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    (page.unwrap_or(1).max(1), per_page.unwrap_or(10).clamp(1, 100))
}

/// Submit a leave or NOC request
#[utoipa::path(
    post,
    path = "/api/v1/{kind}",
    params(
        ("kind" = RequestKind, Path, description = "leave or noc")
    ),
    request_body(
        content = RequestDetails,
        description = "Request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request submitted", body = TimeOffRequest),
        (status = 400, description = "Bad request", body = Object, example = json!({
            "message": "at least one day must be requested"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn create_request<R: RequestStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    store: web::Data<R>,
    feed: web::Data<ChangeFeed>,
    path: web::Path<RequestKind>,
    payload: web::Json<RequestDetails>,
) -> actix_web::Result<impl Responder> {
    let kind = path.into_inner();
    session.require(&access, kind.feature())?;

    let details = match payload.into_inner().normalized() {
        Ok(details) => details,
        Err(message) => return Ok(HttpResponse::BadRequest().json(json!({ "message": message }))),
    };

    let request = store
        .create(kind, &session.subject_id, details)
        .await
        .map_err(|e| internal_error(e, "Failed to create request"))?;

    tracing::info!(%kind, id = %request.id, subject_id = %request.subject_id, "Request submitted");
    feed.publish(ChangeEvent::request(ChangeKind::Insert, kind, &request));

    Ok(HttpResponse::Ok().json(request))
}

/// List leave or NOC requests
#[utoipa::path(
    get,
    path = "/api/v1/{kind}",
    params(
        ("kind" = RequestKind, Path, description = "leave or noc"),
        RequestListQuery
    ),
    responses(
        (status = 200, description = "Paginated request list", body = RequestListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_requests<R: RequestStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    store: web::Data<R>,
    path: web::Path<RequestKind>,
    query: web::Query<RequestListQuery>,
) -> actix_web::Result<impl Responder> {
    let kind = path.into_inner();
    session.require(&access, kind.feature())?;

    let query = query.into_inner();
    let (page, per_page) = pagination(query.page, query.per_page);

    let filter = RequestFilter {
        subject_id: if session.is_admin() {
            query.subject_id
        } else {
            Some(session.subject_id.clone())
        },
        status: query.status,
    };

    let (data, total) = store
        .list(kind, &filter, page, per_page)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch request list"))?;

    Ok(HttpResponse::Ok().json(RequestListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Details of one request (owner or admin)
#[utoipa::path(
    get,
    path = "/api/v1/{kind}/{id}",
    params(
        ("kind" = RequestKind, Path, description = "leave or noc"),
        ("id" = String, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request found", body = TimeOffRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found", body = Object, example = json!({
            "message": "Request not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn get_request<R: RequestStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    store: web::Data<R>,
    path: web::Path<(RequestKind, String)>,
) -> actix_web::Result<impl Responder> {
    let (kind, id) = path.into_inner();
    session.require(&access, kind.feature())?;

    let request = store
        .find(kind, &id)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch request"))?;

    match request {
        Some(request) if session.is_admin() || request.subject_id == session.subject_id => {
            Ok(HttpResponse::Ok().json(request))
        }
        Some(_) => Err(actix_web::error::ErrorForbidden("Not your request")),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Request not found"
        }))),
    }
}

/// Edit a pending request (owner)
#[utoipa::path(
    put,
    path = "/api/v1/{kind}/{id}",
    params(
        ("kind" = RequestKind, Path, description = "leave or noc"),
        ("id" = String, Path, description = "Request id")
    ),
    request_body = RequestDetails,
    responses(
        (status = 200, description = "Request updated", body = TimeOffRequest),
        (status = 400, description = "Request not found or already processed", body = Object, example = json!({
            "message": "Request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn edit_request<R: RequestStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    store: web::Data<R>,
    feed: web::Data<ChangeFeed>,
    path: web::Path<(RequestKind, String)>,
    payload: web::Json<RequestDetails>,
) -> actix_web::Result<impl Responder> {
    let (kind, id) = path.into_inner();
    session.require(&access, kind.feature())?;

    let details = match payload.into_inner().normalized() {
        Ok(details) => details,
        Err(message) => return Ok(HttpResponse::BadRequest().json(json!({ "message": message }))),
    };

    let updated = store
        .update_details(kind, &id, &session.subject_id, details)
        .await
        .map_err(|e| internal_error(e, "Failed to update request"))?;

    match updated {
        Some(request) => {
            feed.publish(ChangeEvent::request(ChangeKind::Update, kind, &request));
            Ok(HttpResponse::Ok().json(request))
        }
        None => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Request not found or already processed"
        }))),
    }
}

/// Approve a pending request (Admin)
#[utoipa::path(
    put,
    path = "/api/v1/{kind}/{id}/approve",
    params(
        ("kind" = RequestKind, Path, description = "leave or noc"),
        ("id" = String, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request approved", body = Object, example = json!({
            "message": "Request approved"
        })),
        (status = 400, description = "Request not found or already processed", body = Object, example = json!({
            "message": "Request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn approve_request<R: RequestStore + 'static>(
    session: Session,
    store: web::Data<R>,
    feed: web::Data<ChangeFeed>,
    path: web::Path<(RequestKind, String)>,
) -> actix_web::Result<impl Responder> {
    decide(session, store, feed, path.into_inner(), RequestStatus::Approved).await
}

/// Reject a pending request (Admin)
#[utoipa::path(
    put,
    path = "/api/v1/{kind}/{id}/reject",
    params(
        ("kind" = RequestKind, Path, description = "leave or noc"),
        ("id" = String, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request rejected", body = Object, example = json!({
            "message": "Request rejected"
        })),
        (status = 400, description = "Request not found or already processed", body = Object, example = json!({
            "message": "Request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn reject_request<R: RequestStore + 'static>(
    session: Session,
    store: web::Data<R>,
    feed: web::Data<ChangeFeed>,
    path: web::Path<(RequestKind, String)>,
) -> actix_web::Result<impl Responder> {
    decide(session, store, feed, path.into_inner(), RequestStatus::Rejected).await
}

async fn decide<R: RequestStore>(
    session: Session,
    store: web::Data<R>,
    feed: web::Data<ChangeFeed>,
    (kind, id): (RequestKind, String),
    status: RequestStatus,
) -> actix_web::Result<HttpResponse> {
    session.require_admin()?;

    let decided = store
        .set_status(kind, &id, status)
        .await
        .map_err(|e| internal_error(e, "Failed to change request status"))?;

    match decided {
        Some(request) => {
            tracing::info!(%kind, id = %request.id, %status, admin = %session.subject_id, "Request decided");
            feed.publish(ChangeEvent::request(ChangeKind::Update, kind, &request));
            Ok(HttpResponse::Ok().json(json!({
                "message": format!("Request {status}"),
                "request": request
            })))
        }
        None => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Request not found or already processed"
        }))),
    }
}
