use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use strum_macros::EnumString;

use crate::model::role::Role;

const WILDCARD: &str = "*";

const ADMIN_FEATURES: &[&str] = &[WILDCARD];

const MANAGER_FEATURES: &[&str] = &[
    "dashboard",
    "announcement",
    "attendance",
    "noc",
    "leave_request",
    "members",
    "tournaments",
    "schedule",
    "update_logs",
];

const MEMBER_FEATURES: &[&str] = &[
    "dashboard",
    "announcement.view",
    "attendance",
    "noc",
    "leave_request",
    "update_logs",
];

static FEATURE_PERMISSIONS: Lazy<HashMap<Role, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        (Role::Admin, ADMIN_FEATURES),
        (Role::Manager, MANAGER_FEATURES),
        (Role::Member, MEMBER_FEATURES),
    ])
});

/// What to answer while a subject's role has not been resolved yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UnresolvedRole {
    #[default]
    Deny,
    /// Legacy fail-open behaviour.
    Allow,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControlPolicy {
    unresolved: UnresolvedRole,
}

impl AccessControlPolicy {
    pub fn new(unresolved: UnresolvedRole) -> Self {
        Self { unresolved }
    }

    pub fn can_access(&self, role: Option<Role>, feature: &str) -> bool {
        match role {
            None => self.unresolved == UnresolvedRole::Allow,
            Some(Role::Admin) => true,
            Some(role) => {
                let permissions = permissions_of(role);
                let head = feature.split_once('.').map_or(feature, |(head, _)| head);

                permissions
                    .iter()
                    .any(|p| *p == WILDCARD || *p == feature || *p == head)
            }
        }
    }

    pub fn role_display_name(&self, role: Option<Role>) -> &'static str {
        match role {
            Some(Role::Admin) => "KR Admin",
            Some(Role::Manager) => "KR Manager",
            Some(Role::Member) => "KR Member",
            None => "Unknown",
        }
    }

    pub fn effective_permissions(&self, role: Option<Role>) -> BTreeSet<&'static str> {
        role.map(|r| permissions_of(r).iter().copied().collect())
            .unwrap_or_default()
    }

    /// Human-readable summary of what a role can do, for the profile menu.
    pub fn role_features(&self, role: Option<Role>) -> &'static [&'static str] {
        match role {
            Some(Role::Admin) => &[
                "All Features",
                "Full access to Dashboard",
                "Manage Attendance",
                "Manage NOCs",
                "Manage Leaves",
                "Manage Members",
                "Manage Users Reports",
                "Manage Update Logs",
            ],
            Some(Role::Manager) => &[
                "Limited Dashboard Access",
                "View Announcements",
                "Manage Attendance",
                "View NOC",
                "View Members",
                "View Tournaments",
                "Manage Schedule",
            ],
            Some(Role::Member) => &[
                "Limited Dashboard Access",
                "Manage Attendance",
                "View/Request NOC",
                "View/Request Leave",
                "View Updatelogs",
            ],
            None => &[],
        }
    }
}

fn permissions_of(role: Role) -> &'static [&'static str] {
    FEATURE_PERMISSIONS.get(&role).copied().unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Role; 3] = [Role::Admin, Role::Manager, Role::Member];

    fn policy() -> AccessControlPolicy {
        AccessControlPolicy::default()
    }

    #[test]
    fn admin_passes_every_feature() {
        for feature in ["", ".", "members.edit", "..x", "unknown.feature.deep", "*"] {
            assert!(policy().can_access(Some(Role::Admin), feature), "{feature:?}");
        }
    }

    #[test]
    fn member_and_manager_lists() {
        let p = policy();
        assert!(p.can_access(Some(Role::Member), "attendance"));
        assert!(!p.can_access(Some(Role::Member), "members.edit"));
        assert!(!p.can_access(Some(Role::Member), "members"));
        assert!(p.can_access(Some(Role::Manager), "members.edit"));
        assert!(!p.can_access(Some(Role::Manager), "settings"));
    }

    #[test]
    fn fine_grained_grant_does_not_open_siblings() {
        let p = policy();
        assert!(p.can_access(Some(Role::Member), "announcement.view"));
        assert!(!p.can_access(Some(Role::Member), "announcement.create"));
        assert!(!p.can_access(Some(Role::Member), "announcement"));
        assert!(p.can_access(Some(Role::Manager), "announcement.create"));
    }

    #[test]
    fn prefix_matching_uses_first_segment() {
        let p = policy();
        for role in ROLES {
            let listed = p.effective_permissions(Some(role));
            let expected = listed.contains("*")
                || listed.contains("update_logs.add")
                || listed.contains("update_logs");
            assert_eq!(p.can_access(Some(role), "update_logs.add"), expected);
        }
        assert!(p.can_access(Some(Role::Member), "attendance.history.export"));
    }

    #[test]
    fn unresolved_role_denies_by_default() {
        assert!(!policy().can_access(None, "dashboard"));
        assert!(!policy().can_access(None, ""));
    }

    #[test]
    fn unresolved_role_legacy_fail_open() {
        let legacy = AccessControlPolicy::new(UnresolvedRole::Allow);
        assert!(legacy.can_access(None, "members.edit"));
        assert!(legacy.can_access(None, "anything"));
    }

    #[test]
    fn display_names_and_permission_sets() {
        let p = policy();
        assert_eq!(p.role_display_name(Some(Role::Admin)), "KR Admin");
        assert_eq!(p.role_display_name(Some(Role::Manager)), "KR Manager");
        assert_eq!(p.role_display_name(Some(Role::Member)), "KR Member");
        assert_eq!(p.role_display_name(None), "Unknown");

        assert!(p.effective_permissions(None).is_empty());
        assert_eq!(p.effective_permissions(Some(Role::Admin)), BTreeSet::from(["*"]));
        for role in ROLES {
            assert!(!p.effective_permissions(Some(role)).is_empty());
            assert!(!p.role_features(Some(role)).is_empty());
        }
    }

    #[test]
    fn unresolved_role_setting_parses() {
        assert_eq!("ALLOW".parse::<UnresolvedRole>().unwrap(), UnresolvedRole::Allow);
        assert_eq!("deny".parse::<UnresolvedRole>().unwrap(), UnresolvedRole::Deny);
        assert!("maybe".parse::<UnresolvedRole>().is_err());
    }
}
