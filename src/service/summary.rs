use chrono::{Duration, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

/// Timeframes offered by the dashboard chart, in days.
pub const TIMEFRAMES: [u32; 3] = [7, 14, 30];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub present: u32,
    pub late: u32,
    pub absent: u32,
}

impl StatusCounts {
    fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyCounts {
    #[schema(example = "2024-04-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceOverview {
    pub days: Vec<DailyCounts>,
    pub totals: StatusCounts,
}

/// Per-day status counts for the `timeframe` days ending at `today`, oldest
/// first. Records outside the window are ignored.
pub fn attendance_overview(
    records: &[AttendanceRecord],
    today: NaiveDate,
    timeframe: u32,
) -> AttendanceOverview {
    let timeframe = i64::from(timeframe.max(1));
    let start = today - Duration::days(timeframe - 1);

    let mut days: Vec<DailyCounts> = (0..timeframe)
        .map(|offset| DailyCounts {
            date: start + Duration::days(offset),
            counts: StatusCounts::default(),
        })
        .collect();
    let mut totals = StatusCounts::default();

    for record in records {
        let index = (record.date - start).num_days();
        if (0..timeframe).contains(&index) {
            days[index as usize].counts.add(record.status);
            totals.add(record.status);
        }
    }

    AttendanceOverview { days, totals }
}
