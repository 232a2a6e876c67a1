use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::internal_error;
use crate::auth::auth::Session;
use crate::model::member::{Member, MemberUpdate};
use crate::model::role::Role;
use crate::policy::access_control::AccessControlPolicy;
use crate::store::{MemberFilter, MemberStore};
use crate::utils::change_feed::{ChangeEvent, ChangeFeed, ChangeKind};

const FEATURE: &str = "members";
const EDIT_FEATURE: &str = "members.edit";

#[derive(Serialize, ToSchema)]
pub struct MemberListResponse {
    pub data: Vec<Member>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams)]
pub struct MemberListQuery {
    /// Matches username or full name
    pub search: Option<String>,
    pub role: Option<Role>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Items per page, at most 100
    pub per_page: Option<u64>,
}

/// Team roster
#[utoipa::path(
    get,
    path = "/api/v1/members",
    params(MemberListQuery),
    responses(
        (status = 200, description = "Paginated member list", body = MemberListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn list_members<M: MemberStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    store: web::Data<M>,
    query: web::Query<MemberListQuery>,
) -> actix_web::Result<impl Responder> {
    session.require(&access, FEATURE)?;

    let query = query.into_inner();
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

    let filter = MemberFilter {
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        role: query.role,
    };

    let (data, total) = store
        .list_members(&filter, page, per_page)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch member list"))?;

    Ok(HttpResponse::Ok().json(MemberListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// One member of the roster
#[utoipa::path(
    get,
    path = "/api/v1/members/{id}",
    params(
        ("id" = String, Path, description = "Member id")
    ),
    responses(
        (status = 200, description = "Member found", body = Member),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Member not found", body = Object, example = json!({
            "message": "Member not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn get_member<M: MemberStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    store: web::Data<M>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    if id != session.subject_id {
        session.require(&access, FEATURE)?;
    }

    let member = store
        .find_member(&id)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch member"))?;

    match member {
        Some(member) => Ok(HttpResponse::Ok().json(member)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Member not found"
        }))),
    }
}

/// Edit a member's profile (self, or `members.edit`)
#[utoipa::path(
    put,
    path = "/api/v1/members/{id}",
    params(
        ("id" = String, Path, description = "Member id")
    ),
    request_body = MemberUpdate,
    responses(
        (status = 200, description = "Profile updated", body = Member),
        (status = 400, description = "Bad request", body = Object, example = json!({
            "message": "full_name must be at least 3 characters"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Member not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn update_member<M: MemberStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    store: web::Data<M>,
    feed: web::Data<ChangeFeed>,
    path: web::Path<String>,
    payload: web::Json<MemberUpdate>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    if id != session.subject_id {
        session.require(&access, EDIT_FEATURE)?;
    }

    let update = match payload.into_inner().normalized() {
        Ok(update) => update,
        Err(message) => return Ok(HttpResponse::BadRequest().json(json!({ "message": message }))),
    };

    let updated = store
        .update_member(&id, update)
        .await
        .map_err(|e| internal_error(e, "Failed to update member"))?;

    match updated {
        Some(member) => {
            tracing::info!(id = %member.id, editor = %session.subject_id, "Member profile updated");
            feed.publish(ChangeEvent::member(ChangeKind::Update, &member));
            Ok(HttpResponse::Ok().json(member))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Member not found"
        }))),
    }
}
