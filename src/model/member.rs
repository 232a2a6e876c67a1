use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// A row of the team roster. The role is shown but only changed by the
/// identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "0b8e7f5c-1d2a-4c3b-8e9f-0a1b2c3d4e5f",
    "username": "johndoe",
    "full_name": "John Doe",
    "avatar_url": "https://example.com/avatars/johndoe.png",
    "role": "member",
    "last_sign_in_at": "2024-04-15T05:52:00Z",
    "created_at": "2024-01-02T08:00:00Z",
    "updated_at": "2024-04-15T05:52:00Z"
}))]
pub struct Member {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MemberRow {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: String,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            role: Role::from_claim(Some(&row.role)),
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            last_sign_in_at: row.last_sign_in_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MemberUpdate {
    #[schema(example = "johndoe")]
    pub username: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl MemberUpdate {
    pub fn normalized(mut self) -> Result<Self, &'static str> {
        self.username = self.username.trim().to_string();
        self.full_name = self.full_name.trim().to_string();
        self.avatar_url = self
            .avatar_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        if self.username.chars().count() < 3 {
            return Err("username must be at least 3 characters");
        }
        if self.full_name.chars().count() < 3 {
            return Err("full_name must be at least 3 characters");
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(username: &str, full_name: &str, avatar_url: Option<&str>) -> MemberUpdate {
        MemberUpdate {
            username: username.into(),
            full_name: full_name.into(),
            avatar_url: avatar_url.map(Into::into),
        }
    }

    #[test]
    fn trims_and_drops_blank_avatar() {
        let normalized = update("  johndoe ", " John Doe ", Some("   ")).normalized().unwrap();
        assert_eq!(normalized.username, "johndoe");
        assert_eq!(normalized.full_name, "John Doe");
        assert!(normalized.avatar_url.is_none());
    }

    #[test]
    fn short_names_are_rejected() {
        assert!(update("jd", "John Doe", None).normalized().is_err());
        assert!(update("johndoe", " J ", None).normalized().is_err());
    }

    #[test]
    fn legacy_role_in_row_is_resolved() {
        let now = Utc::now();
        let member = Member::from(MemberRow {
            id: "m-1".into(),
            username: "janedoe".into(),
            full_name: "Jane Doe".into(),
            avatar_url: None,
            role: "kr_manager".into(),
            last_sign_in_at: None,
            created_at: now,
            updated_at: now,
        });
        assert_eq!(member.role, Role::Manager);
    }
}
