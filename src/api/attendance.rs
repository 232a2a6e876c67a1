use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::api::internal_error;
use crate::auth::auth::Session;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::policy::access_control::AccessControlPolicy;
use crate::policy::attendance_window::{AttendanceWindowPolicy, LateReason};
use crate::service::attendance::{
    AutoMarkOutcome, SubmitError, SubmitOutcome, auto_mark_on_session_start, submit_attendance,
};
use crate::service::summary::{TIMEFRAMES, attendance_overview};
use crate::store::AttendanceStore;
use crate::utils::change_feed::{ChangeEvent, ChangeFeed, ChangeKind};

const FEATURE: &str = "attendance";

#[derive(Deserialize, IntoParams)]
pub struct DayQuery {
    /// Day to inspect; defaults to today in the reference timezone
    #[param(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct DayStatusResponse {
    #[schema(example = "2024-04-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// Existing record for the day, if any
    pub record: Option<AttendanceRecord>,
    /// Status a submission made right now would receive
    pub computed_status: AttendanceStatus,
    /// Recorded status when present, otherwise the computed one
    pub display_status: AttendanceStatus,
    pub late_reason: Option<LateReason>,
    pub can_mark: bool,
    pub is_past: bool,
    pub is_future: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitAttendance {
    #[schema(example = "2024-04-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Working from the office")]
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct OverrideAttendance {
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Defaults to the first day of the current month
    #[param(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    /// Defaults to today
    #[param(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    /// Another subject's history; needs the `members` feature
    pub subject_id: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct OverviewQuery {
    /// 7, 14 or 30
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    AlreadyRecorded,
    MarkedLate,
    OutsideLateWindow,
}

#[derive(Serialize, ToSchema)]
pub struct SessionStartResponse {
    pub outcome: SessionOutcome,
    pub record: Option<AttendanceRecord>,
}

impl From<AutoMarkOutcome> for SessionStartResponse {
    fn from(outcome: AutoMarkOutcome) -> Self {
        let (outcome, record) = match outcome {
            AutoMarkOutcome::AlreadyRecorded(r) => (SessionOutcome::AlreadyRecorded, Some(r)),
            AutoMarkOutcome::MarkedLate(r) => (SessionOutcome::MarkedLate, Some(r)),
            AutoMarkOutcome::OutsideLateWindow => (SessionOutcome::OutsideLateWindow, None),
        };
        SessionStartResponse { outcome, record }
    }
}

/// Status of the caller's attendance for a day
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(DayQuery),
    responses(
        (status = 200, description = "Attendance status for the day", body = DayStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_day<S: AttendanceStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    policy: web::Data<AttendanceWindowPolicy>,
    store: web::Data<S>,
    query: web::Query<DayQuery>,
) -> actix_web::Result<impl Responder> {
    session.require(&access, FEATURE)?;

    let now = policy.current_reference_time();
    let date = query.date.unwrap_or_else(|| now.date_naive());

    let record = store
        .find_by_subject_and_date(&session.subject_id, date)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch attendance"))?;

    let is_past = policy.is_past_date(date);
    let is_future = policy.is_future_date(date);
    let computed_status = policy.classify(date, now);
    let late_reason = if is_past || is_future {
        None
    } else {
        policy.late_reason(date, now)
    };

    Ok(HttpResponse::Ok().json(DayStatusResponse {
        date,
        display_status: record.as_ref().map_or(computed_status, |r| r.status),
        record,
        computed_status,
        late_reason,
        can_mark: policy.can_mark_attendance(date),
        is_past,
        is_future,
    }))
}

/// Submit or update the caller's attendance
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body = SubmitAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = Object, example = json!({
            "message": "Attendance submitted successfully",
            "record": {"date": "2024-04-15", "status": "present"}
        })),
        (status = 400, description = "Past dates cannot be marked", body = Object, example = json!({
            "message": "You cannot mark attendance for past dates"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn submit<S: AttendanceStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    policy: web::Data<AttendanceWindowPolicy>,
    store: web::Data<S>,
    feed: web::Data<ChangeFeed>,
    payload: web::Json<SubmitAttendance>,
) -> actix_web::Result<impl Responder> {
    session.require(&access, FEATURE)?;

    let payload = payload.into_inner();
    let notes = payload.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

    let outcome = match submit_attendance(
        store.get_ref(),
        &policy,
        &session.subject_id,
        payload.date,
        notes,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(SubmitError::PastDate(_)) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "You cannot mark attendance for past dates"
            })));
        }
        Err(SubmitError::Store(e)) => {
            return Err(internal_error(e, "Attendance submission failed").into());
        }
    };

    let (kind, message) = match &outcome {
        SubmitOutcome::Created(_) => (ChangeKind::Insert, "Attendance submitted successfully"),
        SubmitOutcome::Updated(_) => (ChangeKind::Update, "Attendance updated"),
    };
    feed.publish(ChangeEvent::attendance(kind, outcome.record()));

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "record": outcome.record()
    })))
}

/// One-time check when a dashboard session starts; marks the caller late
/// when nothing is recorded yet and the late window is open.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/session",
    responses(
        (status = 200, description = "Check completed", body = SessionStartResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn session_start<S: AttendanceStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    policy: web::Data<AttendanceWindowPolicy>,
    store: web::Data<S>,
    feed: web::Data<ChangeFeed>,
) -> actix_web::Result<impl Responder> {
    session.require(&access, FEATURE)?;

    let outcome = auto_mark_on_session_start(store.get_ref(), &policy, &session.subject_id)
        .await
        .map_err(|e| internal_error(e, "Automatic attendance check failed"))?;

    if let AutoMarkOutcome::MarkedLate(record) = &outcome {
        feed.publish(ChangeEvent::attendance(ChangeKind::Insert, record));
    }

    Ok(HttpResponse::Ok().json(SessionStartResponse::from(outcome)))
}

/// Attendance records in a date range
#[utoipa::path(
    get,
    path = "/api/v1/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Records, newest first", body = Vec<AttendanceRecord>),
        (status = 400, description = "Invalid range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history<S: AttendanceStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    policy: web::Data<AttendanceWindowPolicy>,
    store: web::Data<S>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    session.require(&access, FEATURE)?;

    let subject_id = match query.subject_id.as_deref() {
        Some(other) if other != session.subject_id => {
            session.require(&access, "members")?;
            other
        }
        _ => session.subject_id.as_str(),
    };

    let today = policy.today();
    let from = query.from.unwrap_or_else(|| first_of_month(today));
    let to = query.to.unwrap_or(today);
    if from > to {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "from cannot be after to"
        })));
    }

    let records = store
        .list_by_subject_in_range(subject_id, from, to)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch attendance history"))?;

    Ok(HttpResponse::Ok().json(records))
}

/// Daily present/late/absent counts for the caller
#[utoipa::path(
    get,
    path = "/api/v1/attendance/overview",
    params(OverviewQuery),
    responses(
        (status = 200, description = "Per-day counts, oldest first", body = crate::service::summary::AttendanceOverview),
        (status = 400, description = "Unsupported timeframe"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn overview<S: AttendanceStore + 'static>(
    session: Session,
    access: web::Data<AccessControlPolicy>,
    policy: web::Data<AttendanceWindowPolicy>,
    store: web::Data<S>,
    query: web::Query<OverviewQuery>,
) -> actix_web::Result<impl Responder> {
    session.require(&access, "dashboard")?;

    let days = query.days.unwrap_or(TIMEFRAMES[0]);
    if !TIMEFRAMES.contains(&days) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "days must be one of 7, 14 or 30"
        })));
    }

    let today = policy.today();
    let from = today - chrono::Duration::days(i64::from(days) - 1);
    let records = store
        .list_by_subject_in_range(&session.subject_id, from, today)
        .await
        .map_err(|e| internal_error(e, "Failed to fetch attendance overview"))?;

    Ok(HttpResponse::Ok().json(attendance_overview(&records, today, days)))
}

/// Correct any attendance record (Admin)
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{id}",
    params(
        ("id" = String, Path, description = "Attendance record id")
    ),
    request_body = OverrideAttendance,
    responses(
        (status = 200, description = "Record updated", body = AttendanceRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance record not found", body = Object, example = json!({
            "message": "Attendance record not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn override_record<S: AttendanceStore + 'static>(
    session: Session,
    store: web::Data<S>,
    feed: web::Data<ChangeFeed>,
    path: web::Path<String>,
    payload: web::Json<OverrideAttendance>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    let id = path.into_inner();
    let payload = payload.into_inner();

    let updated = store
        .update(&id, payload.status, payload.notes)
        .await
        .map_err(|e| internal_error(e, "Attendance override failed"))?;

    match updated {
        Some(record) => {
            tracing::info!(id = %record.id, status = %record.status, admin = %session.subject_id, "Attendance overridden");
            feed.publish(ChangeEvent::attendance(ChangeKind::Update, &record));
            Ok(HttpResponse::Ok().json(record))
        }
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        }))),
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
