use crate::api::attendance::{
    DayStatusResponse, OverrideAttendance, SessionOutcome, SessionStartResponse, SubmitAttendance,
};
use crate::api::leave_request::RequestListResponse;
use crate::api::members::MemberListResponse;
use crate::api::profile::ProfileResponse;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::leave_request::{RequestDetails, RequestKind, RequestStatus, TimeOffRequest};
use crate::model::member::{Member, MemberUpdate};
use crate::model::role::Role;
use crate::policy::attendance_window::LateReason;
use crate::service::summary::{AttendanceOverview, DailyCounts, StatusCounts};
use crate::utils::change_feed::{ChangeEvent, ChangeKind, WatchedTable};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Team Dashboard API",
        version = "1.0.0",
        description = r#"
## Team Dashboard

Backend for a small organisation's team dashboard.

### 🔹 Key Features
- **Attendance**
  - Daily self-marking, classified as present, late or absent in the organisation's timezone
  - Automatic late marking when a session starts inside the late window
  - History and 7/14/30 day overviews
- **Leave & NOC requests**
  - Submit, edit while pending, approve or reject (Admin)
- **Members**
  - Team roster with search, profile edits by the member or by `members.edit` holders
- **Roles**
  - Admin, Manager and Member with dot-scoped feature permissions

### 🔐 Security
Endpoints under `/api/v1` expect a **Bearer** access token from the identity provider.
`/hooks/changes` is authenticated with a shared secret header.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::profile::me,

        crate::api::attendance::get_day,
        crate::api::attendance::submit,
        crate::api::attendance::session_start,
        crate::api::attendance::history,
        crate::api::attendance::overview,
        crate::api::attendance::override_record,

        crate::api::leave_request::create_request,
        crate::api::leave_request::list_requests,
        crate::api::leave_request::get_request,
        crate::api::leave_request::edit_request,
        crate::api::leave_request::approve_request,
        crate::api::leave_request::reject_request,

        crate::api::members::list_members,
        crate::api::members::get_member,
        crate::api::members::update_member,

        crate::api::hooks::receive_change
    ),
    components(
        schemas(
            Role,
            ProfileResponse,
            AttendanceStatus,
            AttendanceRecord,
            LateReason,
            DayStatusResponse,
            SubmitAttendance,
            OverrideAttendance,
            SessionOutcome,
            SessionStartResponse,
            StatusCounts,
            DailyCounts,
            AttendanceOverview,
            RequestKind,
            RequestStatus,
            RequestDetails,
            TimeOffRequest,
            RequestListResponse,
            Member,
            MemberUpdate,
            MemberListResponse,
            WatchedTable,
            ChangeKind,
            ChangeEvent
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Profile", description = "Current session"),
        (name = "Attendance", description = "Attendance marking and reporting APIs"),
        (name = "Requests", description = "Leave and NOC request APIs"),
        (name = "Members", description = "Team roster and profile edits"),
        (name = "Hooks", description = "Change notifications from the hosted database"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
