//! Persistence seams for attendance, leave/NOC requests and the member roster.
//!
//! Handlers and workflows only talk to these traits; `mysql` is the
//! production adapter, `memory` backs the tests.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::leave_request::{RequestDetails, RequestKind, RequestStatus, TimeOffRequest};
use crate::model::member::{Member, MemberUpdate};
use crate::model::role::Role;

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of an insert that must not create a second record for the same
/// `(subject_id, date)`.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(AttendanceRecord),
    Existing(AttendanceRecord),
}

#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    async fn find_by_subject_and_date(
        &self,
        subject_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Inclusive on both ends, newest first.
    async fn list_by_subject_in_range(
        &self,
        subject_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn insert_if_absent(&self, new: NewAttendance) -> Result<InsertOutcome, StoreError>;

    async fn update(
        &self,
        id: &str,
        status: AttendanceStatus,
        notes: Option<String>,
    ) -> Result<Option<AttendanceRecord>, StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct RequestFilter {
    pub subject_id: Option<String>,
    pub status: Option<RequestStatus>,
}

#[allow(async_fn_in_trait)]
pub trait RequestStore {
    async fn create(
        &self,
        kind: RequestKind,
        subject_id: &str,
        details: RequestDetails,
    ) -> Result<TimeOffRequest, StoreError>;

    async fn find(&self, kind: RequestKind, id: &str) -> Result<Option<TimeOffRequest>, StoreError>;

    /// Newest first; returns the page and the total matching count.
    async fn list(
        &self,
        kind: RequestKind,
        filter: &RequestFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<TimeOffRequest>, i64), StoreError>;

    /// Edits a pending request owned by `subject_id`. `None` when nothing matched.
    async fn update_details(
        &self,
        kind: RequestKind,
        id: &str,
        subject_id: &str,
        details: RequestDetails,
    ) -> Result<Option<TimeOffRequest>, StoreError>;

    /// Moves a pending request to `status`. `None` when it was not pending.
    async fn set_status(
        &self,
        kind: RequestKind,
        id: &str,
        status: RequestStatus,
    ) -> Result<Option<TimeOffRequest>, StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemberFilter {
    /// Substring of the username or full name.
    pub search: Option<String>,
    pub role: Option<Role>,
}

#[allow(async_fn_in_trait)]
pub trait MemberStore {
    /// Ordered by full name; returns the page and the total matching count.
    async fn list_members(
        &self,
        filter: &MemberFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Member>, i64), StoreError>;

    async fn find_member(&self, id: &str) -> Result<Option<Member>, StoreError>;

    /// `None` when no such member exists.
    async fn update_member(
        &self,
        id: &str,
        update: MemberUpdate,
    ) -> Result<Option<Member>, StoreError>;
}
