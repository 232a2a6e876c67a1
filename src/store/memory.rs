use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::model::leave_request::{RequestDetails, RequestKind, RequestStatus, TimeOffRequest};
use crate::model::member::{Member, MemberUpdate};
use crate::model::role::Role;
use crate::store::{
    AttendanceStore, InsertOutcome, MemberFilter, MemberStore, RequestFilter, RequestStore,
    StoreError,
};

/// In-process attendance table with the same uniqueness rule as the database.
#[derive(Default)]
pub struct MemoryAttendanceStore {
    records: Mutex<Vec<AttendanceRecord>>,
    lookups: AtomicUsize,
}

impl MemoryAttendanceStore {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Number of `find_by_subject_and_date` calls that reached this store.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn seed(&self, new: NewAttendance) -> AttendanceRecord {
        let record = to_record(new);
        self.records.lock().unwrap().push(record.clone());
        record
    }
}

fn to_record(new: NewAttendance) -> AttendanceRecord {
    let now = Utc::now();
    AttendanceRecord {
        id: Uuid::new_v4().to_string(),
        subject_id: new.subject_id,
        date: new.date,
        status: new.status,
        notes: new.notes,
        created_at: now,
        updated_at: now,
    }
}

impl AttendanceStore for MemoryAttendanceStore {
    async fn find_by_subject_and_date(
        &self,
        subject_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .find(|r| r.subject_id == subject_id && r.date == date)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AttendanceRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list_by_subject_in_range(
        &self,
        subject_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        let mut matching: Vec<_> = records
            .iter()
            .filter(|r| r.subject_id == subject_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(matching)
    }

    async fn insert_if_absent(&self, new: NewAttendance) -> Result<InsertOutcome, StoreError> {
        let mut records = self.records.lock().unwrap();
        if let Some(existing) = records
            .iter()
            .find(|r| r.subject_id == new.subject_id && r.date == new.date)
        {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }

        let record = to_record(new);
        records.push(record.clone());
        Ok(InsertOutcome::Inserted(record))
    }

    async fn update(
        &self,
        id: &str,
        status: AttendanceStatus,
        notes: Option<String>,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let mut records = self.records.lock().unwrap();
        Ok(records.iter_mut().find(|r| r.id == id).map(|r| {
            r.status = status;
            r.notes = notes;
            r.updated_at = Utc::now();
            r.clone()
        }))
    }
}

fn page_of<T>(items: Vec<T>, page: u64, per_page: u64) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let skip = (page.saturating_sub(1) * per_page) as usize;
    let data = items.into_iter().skip(skip).take(per_page as usize).collect();
    (data, total)
}

/// Leave and NOC tables, kept apart by kind.
#[derive(Default)]
pub struct MemoryRequestStore {
    rows: Mutex<Vec<(RequestKind, TimeOffRequest)>>,
}

impl MemoryRequestStore {
    pub fn seed(&self, kind: RequestKind, subject_id: &str, status: RequestStatus) -> TimeOffRequest {
        let now = Utc::now();
        let request = TimeOffRequest {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.to_string(),
            reason: "Family event".into(),
            message: String::new(),
            requested_days: vec![NaiveDate::from_ymd_opt(2024, 4, 22).unwrap()],
            status,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push((kind, request.clone()));
        request
    }
}

impl RequestStore for MemoryRequestStore {
    async fn create(
        &self,
        kind: RequestKind,
        subject_id: &str,
        details: RequestDetails,
    ) -> Result<TimeOffRequest, StoreError> {
        let now = Utc::now();
        let request = TimeOffRequest {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.to_string(),
            reason: details.reason,
            message: details.message,
            requested_days: details.requested_days,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push((kind, request.clone()));
        Ok(request)
    }

    async fn find(&self, kind: RequestKind, id: &str) -> Result<Option<TimeOffRequest>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|(k, r)| *k == kind && r.id == id)
            .map(|(_, r)| r.clone()))
    }

    async fn list(
        &self,
        kind: RequestKind,
        filter: &RequestFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<TimeOffRequest>, i64), StoreError> {
        let rows = self.rows.lock().unwrap();
        let matching: Vec<_> = rows
            .iter()
            .rev()
            .filter(|(k, _)| *k == kind)
            .map(|(_, r)| r)
            .filter(|r| filter.subject_id.as_deref().is_none_or(|s| r.subject_id == s))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        Ok(page_of(matching, page, per_page))
    }

    async fn update_details(
        &self,
        kind: RequestKind,
        id: &str,
        subject_id: &str,
        details: RequestDetails,
    ) -> Result<Option<TimeOffRequest>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|(k, r)| {
                *k == kind
                    && r.id == id
                    && r.subject_id == subject_id
                    && r.status == RequestStatus::Pending
            })
            .map(|(_, r)| {
                r.reason = details.reason;
                r.message = details.message;
                r.requested_days = details.requested_days;
                r.updated_at = Utc::now();
                r.clone()
            }))
    }

    async fn set_status(
        &self,
        kind: RequestKind,
        id: &str,
        status: RequestStatus,
    ) -> Result<Option<TimeOffRequest>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|(k, r)| *k == kind && r.id == id && r.status == RequestStatus::Pending)
            .map(|(_, r)| {
                r.status = status;
                r.updated_at = Utc::now();
                r.clone()
            }))
    }
}

#[derive(Default)]
pub struct MemoryMemberStore {
    members: Mutex<Vec<Member>>,
}

impl MemoryMemberStore {
    pub fn seed(&self, id: &str, full_name: &str, role: Role) -> Member {
        let now = Utc::now();
        let member = Member {
            id: id.to_string(),
            username: id.to_string(),
            full_name: full_name.to_string(),
            avatar_url: None,
            role,
            last_sign_in_at: None,
            created_at: now,
            updated_at: now,
        };
        self.members.lock().unwrap().push(member.clone());
        member
    }
}

impl MemberStore for MemoryMemberStore {
    async fn list_members(
        &self,
        filter: &MemberFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Member>, i64), StoreError> {
        let members = self.members.lock().unwrap();
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut matching: Vec<_> = members
            .iter()
            .filter(|m| filter.role.is_none_or(|role| m.role == role))
            .filter(|m| {
                search.as_deref().is_none_or(|s| {
                    m.username.to_lowercase().contains(s) || m.full_name.to_lowercase().contains(s)
                })
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(page_of(matching, page, per_page))
    }

    async fn find_member(&self, id: &str) -> Result<Option<Member>, StoreError> {
        let members = self.members.lock().unwrap();
        Ok(members.iter().find(|m| m.id == id).cloned())
    }

    async fn update_member(
        &self,
        id: &str,
        update: MemberUpdate,
    ) -> Result<Option<Member>, StoreError> {
        let mut members = self.members.lock().unwrap();
        Ok(members.iter_mut().find(|m| m.id == id).map(|m| {
            m.username = update.username;
            m.full_name = update.full_name;
            m.avatar_url = update.avatar_url;
            m.updated_at = Utc::now();
            m.clone()
        }))
    }
}
