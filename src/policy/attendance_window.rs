use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceStatus;
use crate::policy::clock::Clock;

/// Offset and daily cutoffs every attendance decision is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSettings {
    pub reference_offset: FixedOffset,
    /// Inclusive start of the morning late window.
    pub late_window_start: NaiveTime,
    /// Exclusive end of the morning late window.
    pub late_window_end: NaiveTime,
    pub evening_cutoff: NaiveTime,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            reference_offset: FixedOffset::east_opt(6 * 3600).expect("UTC+6 is a valid offset"),
            late_window_start: NaiveTime::from_hms_opt(11, 50, 0).expect("valid time"),
            late_window_end: NaiveTime::from_hms_opt(11, 55, 0).expect("valid time"),
            evening_cutoff: NaiveTime::from_hms_opt(23, 50, 0).expect("valid time"),
        }
    }
}

/// Why a same-day check-in counts as late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LateReason {
    LateWindow,
    EveningCutoff,
}

#[derive(Clone)]
pub struct AttendanceWindowPolicy {
    settings: WindowSettings,
    clock: Arc<dyn Clock>,
}

impl AttendanceWindowPolicy {
    pub fn new(settings: WindowSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    /// "Now" expressed in the reference offset.
    pub fn current_reference_time(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.settings.reference_offset)
    }

    pub fn today(&self) -> NaiveDate {
        self.current_reference_time().date_naive()
    }

    fn local(&self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.settings.reference_offset)
    }

    pub fn is_past_date(&self, date: NaiveDate) -> bool {
        date < self.today()
    }

    pub fn is_future_date(&self, date: NaiveDate) -> bool {
        date > self.today()
    }

    pub fn is_in_late_window(&self, now: DateTime<FixedOffset>) -> bool {
        let time = self.local(now).time();
        time >= self.settings.late_window_start && time < self.settings.late_window_end
    }

    pub fn is_after_evening_cutoff(&self, date: NaiveDate, now: DateTime<FixedOffset>) -> bool {
        self.local(now).naive_local() >= date.and_time(self.settings.evening_cutoff)
    }

    /// Today and any later day may be marked; past days never.
    pub fn can_mark_attendance(&self, date: NaiveDate) -> bool {
        !self.is_past_date(date)
    }

    /// Late-window check takes precedence over the evening cutoff.
    pub fn late_reason(&self, date: NaiveDate, now: DateTime<FixedOffset>) -> Option<LateReason> {
        if self.is_in_late_window(now) {
            Some(LateReason::LateWindow)
        } else if self.is_after_evening_cutoff(date, now) {
            Some(LateReason::EveningCutoff)
        } else {
            None
        }
    }

    pub fn classify(&self, date: NaiveDate, now: DateTime<FixedOffset>) -> AttendanceStatus {
        let today = self.local(now).date_naive();
        if date != today && date < today {
            return AttendanceStatus::Absent;
        }

        match self.late_reason(date, now) {
            Some(_) => AttendanceStatus::Late,
            None => AttendanceStatus::Present,
        }
    }
}

/// Coerces a stored status string into a known status.
///
/// Anything unrecognised becomes `absent` and is logged as a data-integrity
/// problem instead of being propagated.
pub fn validate_status(raw: &str) -> AttendanceStatus {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(status = raw, "Invalid attendance status, defaulting to absent");
        AttendanceStatus::Absent
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn dhaka() -> FixedOffset {
        FixedOffset::east_opt(6 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> DateTime<FixedOffset> {
        dhaka().with_ymd_and_hms(y, m, d, hh, mm, ss).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn policy_at(now: DateTime<FixedOffset>) -> AttendanceWindowPolicy {
        AttendanceWindowPolicy::new(
            WindowSettings::default(),
            Arc::new(FixedClock(now.with_timezone(&Utc))),
        )
    }

    #[test]
    fn reference_time_uses_configured_offset() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 4, 15, 18, 30, 0).unwrap());
        let policy = AttendanceWindowPolicy::new(WindowSettings::default(), Arc::new(clock));

        let now = policy.current_reference_time();
        assert_eq!(now.offset(), &dhaka());
        // 18:30 UTC is already the next calendar day at UTC+6
        assert_eq!(policy.today(), day(2024, 4, 16));
    }

    #[test]
    fn past_dates_are_absent_at_any_time_of_day() {
        let policy = policy_at(at(2024, 4, 20, 10, 0, 0));
        for (hh, mm) in [(0, 0), (11, 52), (23, 55)] {
            let now = at(2024, 4, 20, hh, mm, 0);
            assert_eq!(policy.classify(day(2024, 4, 15), now), AttendanceStatus::Absent);
            assert_eq!(policy.classify(day(2024, 4, 19), now), AttendanceStatus::Absent);
        }
    }

    #[test]
    fn concrete_scenarios() {
        let policy = policy_at(at(2024, 4, 20, 10, 0, 0));
        assert_eq!(
            policy.classify(day(2024, 4, 15), at(2024, 4, 20, 10, 0, 0)),
            AttendanceStatus::Absent
        );

        let policy = policy_at(at(2024, 4, 15, 11, 52, 0));
        assert_eq!(
            policy.classify(day(2024, 4, 15), at(2024, 4, 15, 11, 52, 0)),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn late_window_is_half_open() {
        let policy = policy_at(at(2024, 4, 15, 9, 0, 0));
        assert!(!policy.is_in_late_window(at(2024, 4, 15, 11, 49, 59)));
        assert!(policy.is_in_late_window(at(2024, 4, 15, 11, 50, 0)));
        assert!(policy.is_in_late_window(at(2024, 4, 15, 11, 54, 59)));
        assert!(!policy.is_in_late_window(at(2024, 4, 15, 11, 55, 0)));
        // evening time with the same minutes is not the late window
        assert!(!policy.is_in_late_window(at(2024, 4, 15, 23, 52, 0)));
    }

    #[test]
    fn late_window_normalizes_foreign_offsets() {
        let policy = policy_at(at(2024, 4, 15, 9, 0, 0));
        // 05:52 UTC == 11:52 at UTC+6
        let utc_now = Utc
            .with_ymd_and_hms(2024, 4, 15, 5, 52, 0)
            .unwrap()
            .with_timezone(&FixedOffset::east_opt(0).unwrap());
        assert!(policy.is_in_late_window(utc_now));
    }

    #[test]
    fn today_classification() {
        let today = day(2024, 4, 15);
        let policy = policy_at(at(2024, 4, 15, 9, 0, 0));

        assert_eq!(policy.classify(today, at(2024, 4, 15, 9, 0, 0)), AttendanceStatus::Present);
        assert_eq!(policy.classify(today, at(2024, 4, 15, 11, 49, 59)), AttendanceStatus::Present);
        assert_eq!(policy.classify(today, at(2024, 4, 15, 11, 50, 0)), AttendanceStatus::Late);
        assert_eq!(policy.classify(today, at(2024, 4, 15, 11, 55, 0)), AttendanceStatus::Present);
        assert_eq!(policy.classify(today, at(2024, 4, 15, 23, 49, 59)), AttendanceStatus::Present);
        assert_eq!(policy.classify(today, at(2024, 4, 15, 23, 50, 0)), AttendanceStatus::Late);
        assert_eq!(policy.classify(today, at(2024, 4, 15, 23, 59, 59)), AttendanceStatus::Late);
    }

    #[test]
    fn late_reason_distinguishes_window_and_cutoff() {
        let today = day(2024, 4, 15);
        let policy = policy_at(at(2024, 4, 15, 9, 0, 0));

        assert_eq!(
            policy.late_reason(today, at(2024, 4, 15, 11, 51, 0)),
            Some(LateReason::LateWindow)
        );
        assert_eq!(
            policy.late_reason(today, at(2024, 4, 15, 23, 51, 0)),
            Some(LateReason::EveningCutoff)
        );
        assert_eq!(policy.late_reason(today, at(2024, 4, 15, 12, 0, 0)), None);
    }

    #[test]
    fn future_dates_are_not_past_the_cutoff() {
        let policy = policy_at(at(2024, 4, 15, 23, 55, 0));
        let tomorrow = day(2024, 4, 16);
        assert!(!policy.is_after_evening_cutoff(tomorrow, at(2024, 4, 15, 23, 55, 0)));
        assert_eq!(policy.classify(tomorrow, at(2024, 4, 15, 23, 55, 0)), AttendanceStatus::Present);
    }

    #[test]
    fn can_mark_is_negation_of_past() {
        let policy = policy_at(at(2024, 4, 15, 12, 0, 0));
        for offset in -5i64..=5 {
            let date = day(2024, 4, 15) + chrono::Duration::days(offset);
            assert_eq!(policy.can_mark_attendance(date), !policy.is_past_date(date));
        }
        assert!(policy.can_mark_attendance(day(2024, 4, 15)));
        assert!(policy.can_mark_attendance(day(2024, 5, 1)));
        assert!(!policy.can_mark_attendance(day(2024, 4, 14)));
        assert!(policy.is_future_date(day(2024, 4, 16)));
        assert!(!policy.is_future_date(day(2024, 4, 15)));
    }

    #[test]
    fn validate_status_defaults_and_is_idempotent() {
        for raw in ["present", "absent", "late", "Present", "", "on_leave", "late "] {
            let once = validate_status(raw);
            let twice = validate_status(once.as_ref());
            assert_eq!(once, twice);
        }
        assert_eq!(validate_status("late"), AttendanceStatus::Late);
        assert_eq!(validate_status("excused"), AttendanceStatus::Absent);
        assert_eq!(validate_status(""), AttendanceStatus::Absent);
    }

    #[test]
    fn custom_settings_are_honoured() {
        let settings = WindowSettings {
            reference_offset: FixedOffset::east_opt(0).unwrap(),
            late_window_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            late_window_end: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            evening_cutoff: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        };
        let now = Utc.with_ymd_and_hms(2024, 4, 15, 9, 10, 0).unwrap();
        let policy = AttendanceWindowPolicy::new(settings, Arc::new(FixedClock(now)));
        let local = policy.current_reference_time();

        assert!(policy.is_in_late_window(local));
        assert_eq!(
            policy.classify(day(2024, 4, 15), local),
            AttendanceStatus::Late
        );
    }
}
