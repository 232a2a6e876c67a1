use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize, ToSchema, Display,
    EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[serde(alias = "kr_admin")]
    #[strum(to_string = "admin", serialize = "kr_admin")]
    Admin,
    #[serde(alias = "kr_manager")]
    #[strum(to_string = "manager", serialize = "kr_manager")]
    Manager,
    #[serde(alias = "kr_member")]
    #[strum(to_string = "member", serialize = "kr_member")]
    Member,
}

impl Role {
    /// Resolves the role claim of an authenticated session.
    ///
    /// A session without a role is a member; an unrecognised value is logged
    /// and also treated as a member.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            None => Role::Member,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(role = raw, "Unrecognised role claim, defaulting to member");
                Role::Member
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_identifiers_are_accepted() {
        assert_eq!("kr_admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("KR_Manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("member".parse::<Role>().unwrap(), Role::Member);
        assert_eq!(Role::Manager.to_string(), "manager");
    }

    #[test]
    fn missing_or_unknown_claim_is_member() {
        assert_eq!(Role::from_claim(None), Role::Member);
        assert_eq!(Role::from_claim(Some("superuser")), Role::Member);
        assert_eq!(Role::from_claim(Some(" admin ")), Role::Admin);
    }

    #[test]
    fn serde_accepts_aliases() {
        let role: Role = serde_json::from_str("\"kr_member\"").unwrap();
        assert_eq!(role, Role::Member);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
