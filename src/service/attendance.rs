use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::policy::attendance_window::AttendanceWindowPolicy;
use crate::store::{AttendanceStore, InsertOutcome, StoreError};

pub const AUTO_LATE_NOTE: &str = "Automatically marked as late due to check-in time";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("attendance for {0} can no longer be marked")]
    PastDate(NaiveDate),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(AttendanceRecord),
    Updated(AttendanceRecord),
}

impl SubmitOutcome {
    pub fn record(&self) -> &AttendanceRecord {
        match self {
            SubmitOutcome::Created(r) | SubmitOutcome::Updated(r) => r,
        }
    }
}

/// Records the caller's attendance for `date` with the status the window
/// policy assigns right now. An existing record for the day is updated.
pub async fn submit_attendance<S: AttendanceStore>(
    store: &S,
    policy: &AttendanceWindowPolicy,
    subject_id: &str,
    date: NaiveDate,
    notes: Option<String>,
) -> Result<SubmitOutcome, SubmitError> {
    if !policy.can_mark_attendance(date) {
        return Err(SubmitError::PastDate(date));
    }

    let now = policy.current_reference_time();
    let status = policy.classify(date, now);
    debug!(subject_id, %date, %status, "Submitting attendance");

    let existing = match store.find_by_subject_and_date(subject_id, date).await? {
        Some(existing) => existing,
        None => {
            let new = NewAttendance {
                subject_id: subject_id.to_string(),
                date,
                status,
                notes: notes.clone(),
            };
            match store.insert_if_absent(new).await? {
                InsertOutcome::Inserted(record) => return Ok(SubmitOutcome::Created(record)),
                // lost a race with another submission for the same day
                InsertOutcome::Existing(record) => record,
            }
        }
    };

    let updated = store
        .update(&existing.id, status, notes)
        .await?
        .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
    Ok(SubmitOutcome::Updated(updated))
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutoMarkOutcome {
    AlreadyRecorded(AttendanceRecord),
    MarkedLate(AttendanceRecord),
    OutsideLateWindow,
}

/// One-time check run when a session starts.
///
/// If the subject has nothing recorded for today and the late window is
/// open, a `late` record is inserted. Insert-if-absent keeps this to one
/// automatic record per subject per day however often it is triggered.
pub async fn auto_mark_on_session_start<S: AttendanceStore>(
    store: &S,
    policy: &AttendanceWindowPolicy,
    subject_id: &str,
) -> Result<AutoMarkOutcome, StoreError> {
    let now = policy.current_reference_time();
    let today = now.date_naive();

    if let Some(existing) = store.find_by_subject_and_date(subject_id, today).await? {
        return Ok(AutoMarkOutcome::AlreadyRecorded(existing));
    }

    if !policy.is_in_late_window(now) {
        return Ok(AutoMarkOutcome::OutsideLateWindow);
    }

    let new = NewAttendance {
        subject_id: subject_id.to_string(),
        date: today,
        status: AttendanceStatus::Late,
        notes: Some(AUTO_LATE_NOTE.to_string()),
    };

    match store.insert_if_absent(new).await? {
        InsertOutcome::Inserted(record) => {
            info!(subject_id, date = %today, "Attendance automatically marked late");
            Ok(AutoMarkOutcome::MarkedLate(record))
        }
        InsertOutcome::Existing(record) => Ok(AutoMarkOutcome::AlreadyRecorded(record)),
    }
}
