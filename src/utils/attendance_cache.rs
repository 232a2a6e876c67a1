use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::store::{AttendanceStore, InsertOutcome, StoreError};

/// Tune based on active headcount.
const CACHE_CAPACITY: u64 = 50_000;

type DayKey = (String, NaiveDate);

/// Read-through cache of the per-day attendance lookup.
///
/// Absent records are cached too, so every write path and every change-feed
/// event must invalidate the affected `(subject_id, date)` key.
///
/// `epoch` is bumped before every invalidation. A load that overlaps an
/// invalidation drops its own write-back, so a value read before a write is
/// never served after it.
pub struct CachedAttendanceStore<S> {
    inner: S,
    by_day: Cache<DayKey, Option<AttendanceRecord>>,
    epoch: AtomicU64,
}

impl<S> CachedAttendanceStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            by_day: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build(),
            epoch: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub async fn invalidate(&self, subject_id: &str, date: NaiveDate) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.by_day.invalidate(&(subject_id.to_string(), date)).await;
    }

    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.by_day.invalidate_all();
        log::info!("Attendance cache invalidated");
    }
}

impl<S: AttendanceStore> AttendanceStore for CachedAttendanceStore<S> {
    async fn find_by_subject_and_date(
        &self,
        subject_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let key = (subject_id.to_string(), date);
        if let Some(hit) = self.by_day.get(&key).await {
            return Ok(hit);
        }

        let started = self.epoch.load(Ordering::SeqCst);
        let fresh = self.inner.find_by_subject_and_date(subject_id, date).await?;
        self.by_day.insert(key.clone(), fresh.clone()).await;

        if self.epoch.load(Ordering::SeqCst) != started {
            self.by_day.invalidate(&key).await;
        }
        Ok(fresh)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AttendanceRecord>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn list_by_subject_in_range(
        &self,
        subject_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.inner.list_by_subject_in_range(subject_id, from, to).await
    }

    async fn insert_if_absent(&self, new: NewAttendance) -> Result<InsertOutcome, StoreError> {
        let (subject_id, date) = (new.subject_id.clone(), new.date);
        let outcome = self.inner.insert_if_absent(new).await?;
        self.invalidate(&subject_id, date).await;
        Ok(outcome)
    }

    async fn update(
        &self,
        id: &str,
        status: AttendanceStatus,
        notes: Option<String>,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let updated = self.inner.update(id, status, notes).await?;
        if let Some(record) = &updated {
            self.invalidate(&record.subject_id, record.date).await;
        }
        Ok(updated)
    }
}
