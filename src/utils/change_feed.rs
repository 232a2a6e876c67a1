use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, Receiver, Sender, error::RecvError};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;
use crate::model::leave_request::{RequestKind, TimeOffRequest};
use crate::model::member::Member;
use crate::store::AttendanceStore;
use crate::utils::attendance_cache::CachedAttendanceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WatchedTable {
    Attendance,
    LeaveRequests,
    NocRequests,
    Profiles,
}

impl From<RequestKind> for WatchedTable {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Leave => WatchedTable::LeaveRequests,
            RequestKind::Noc => WatchedTable::NocRequests,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row changed somewhere. Payload fields are hints for invalidation only;
/// consumers re-read the store for the actual state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "table": "attendance",
    "kind": "insert",
    "record_id": "6f1c2a8e-4f0b-4a0e-9a57-3f4b7a1c9d10",
    "subject_id": "0b8e7f5c-1d2a-4c3b-8e9f-0a1b2c3d4e5f",
    "date": "2024-04-15"
}))]
pub struct ChangeEvent {
    pub table: WatchedTable,
    pub kind: ChangeKind,
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

impl ChangeEvent {
    pub fn attendance(kind: ChangeKind, record: &AttendanceRecord) -> Self {
        Self {
            table: WatchedTable::Attendance,
            kind,
            record_id: Some(record.id.clone()),
            subject_id: Some(record.subject_id.clone()),
            date: Some(record.date),
        }
    }

    pub fn request(kind: ChangeKind, request_kind: RequestKind, request: &TimeOffRequest) -> Self {
        Self {
            table: request_kind.into(),
            kind,
            record_id: Some(request.id.clone()),
            subject_id: Some(request.subject_id.clone()),
            date: None,
        }
    }

    pub fn member(kind: ChangeKind, member: &Member) -> Self {
        Self {
            table: WatchedTable::Profiles,
            kind,
            record_id: Some(member.id.clone()),
            subject_id: Some(member.id.clone()),
            date: None,
        }
    }
}

#[derive(Clone)]
pub struct ChangeFeed {
    sender: Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many listeners received the event; zero is not an error.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        debug!(table = ?event.table, kind = ?event.kind, record_id = ?event.record_id, "Publishing change");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

/// Drops cached attendance lookups touched by each event until the feed closes.
///
/// A lagging receiver has lost events it cannot replay, so it drops the whole
/// cache instead.
pub async fn run_invalidation_listener<S: AttendanceStore>(
    mut events: Receiver<ChangeEvent>,
    store: Arc<CachedAttendanceStore<S>>,
) {
    info!("Change feed listener started");

    loop {
        match events.recv().await {
            Ok(event) => apply(&store, &event).await,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Change feed lagged, dropping attendance cache");
                store.invalidate_all();
            }
            Err(RecvError::Closed) => break,
        }
    }

    info!("Change feed listener stopped");
}

async fn apply<S: AttendanceStore>(store: &CachedAttendanceStore<S>, event: &ChangeEvent) {
    if event.table != WatchedTable::Attendance {
        return;
    }

    match (event.subject_id.as_deref(), event.date) {
        (Some(subject_id), Some(date)) => store.invalidate(subject_id, date).await,
        _ => store.invalidate_all(),
    }
}
