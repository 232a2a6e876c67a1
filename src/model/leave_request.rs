use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Leave and NOC requests share one shape and lifecycle; only the table differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    #[strum(to_string = "leave")]
    Leave,
    #[strum(to_string = "noc")]
    Noc,
}

impl RequestKind {
    pub fn table(&self) -> &'static str {
        match self {
            RequestKind::Leave => "leave_requests",
            RequestKind::Noc => "noc_requests",
        }
    }

    /// Feature identifier that gates this kind of request.
    pub fn feature(&self) -> &'static str {
        match self {
            RequestKind::Leave => "leave_request",
            RequestKind::Noc => "noc",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "3a6b1f0e-9c2d-4e7a-8b15-2d3c4e5f6a7b",
    "subject_id": "0b8e7f5c-1d2a-4c3b-8e9f-0a1b2c3d4e5f",
    "reason": "Family event",
    "message": "Travelling out of town",
    "requested_days": ["2024-04-22", "2024-04-23"],
    "status": "pending",
    "created_at": "2024-04-15T05:52:00Z",
    "updated_at": "2024-04-15T05:52:00Z"
}))]
pub struct TimeOffRequest {
    pub id: String,
    pub subject_id: String,
    pub reason: String,
    pub message: String,
    #[schema(value_type = Vec<String>)]
    pub requested_days: Vec<NaiveDate>,
    pub status: RequestStatus,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct TimeOffRow {
    pub id: String,
    pub subject_id: String,
    pub reason: String,
    pub message: String,
    pub requested_days: Json<Vec<NaiveDate>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TimeOffRow> for TimeOffRequest {
    fn from(row: TimeOffRow) -> Self {
        let status = row.status.parse().unwrap_or_else(|_| {
            tracing::warn!(id = %row.id, status = %row.status, "Invalid request status, treating as pending");
            RequestStatus::Pending
        });

        TimeOffRequest {
            id: row.id,
            subject_id: row.subject_id,
            reason: row.reason,
            message: row.message,
            requested_days: row.requested_days.0,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Reason, message and days as submitted by the requester.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RequestDetails {
    #[schema(example = "Family event")]
    pub reason: String,
    #[serde(default)]
    #[schema(example = "Travelling out of town")]
    pub message: String,
    #[schema(example = json!(["2024-04-22", "2024-04-23"]), value_type = Vec<String>)]
    pub requested_days: Vec<NaiveDate>,
}

impl RequestDetails {
    /// Trims text, sorts and de-duplicates the days.
    pub fn normalized(mut self) -> Result<Self, &'static str> {
        self.reason = self.reason.trim().to_string();
        self.message = self.message.trim().to_string();

        if self.reason.is_empty() {
            return Err("reason must not be empty");
        }

        self.requested_days.sort_unstable();
        self.requested_days.dedup();

        if self.requested_days.is_empty() {
            return Err("at least one day must be requested");
        }

        Ok(self)
    }
}
