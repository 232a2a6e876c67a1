use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::auth::Session;
use crate::model::role::Role;
use crate::policy::access_control::AccessControlPolicy;

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "subject_id": "0b8e7f5c-1d2a-4c3b-8e9f-0a1b2c3d4e5f",
    "email": "member@example.com",
    "role": "member",
    "role_name": "KR Member",
    "permissions": ["announcement.view", "attendance", "dashboard", "leave_request", "noc", "update_logs"],
    "features": ["View announcements", "Mark attendance"]
}))]
pub struct ProfileResponse {
    pub subject_id: String,
    pub email: Option<String>,
    pub role: Role,
    #[schema(value_type = String)]
    pub role_name: &'static str,
    #[schema(value_type = Vec<String>)]
    pub permissions: Vec<&'static str>,
    #[schema(value_type = Vec<String>)]
    pub features: Vec<&'static str>,
}

/// Role and permissions of the signed-in subject
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current session profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn me(session: Session, access: web::Data<AccessControlPolicy>) -> impl Responder {
    let role = Some(session.role);

    HttpResponse::Ok().json(ProfileResponse {
        role_name: access.role_display_name(role),
        permissions: access.effective_permissions(role).into_iter().collect(),
        features: access.role_features(role).to_vec(),
        subject_id: session.subject_id,
        email: session.email,
        role: session.role,
    })
}
