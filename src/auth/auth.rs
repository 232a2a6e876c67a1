use actix_web::error::{ErrorForbidden, ErrorUnauthorized};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

use crate::auth::jwt::Claims;
use crate::model::role::Role;
use crate::policy::access_control::AccessControlPolicy;

/// The signed-in subject, placed in request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct Session {
    pub subject_id: String,
    pub email: Option<String>,
    pub role: Role,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Session {
            role: Role::from_claim(claims.user_metadata.role.as_deref()),
            subject_id: claims.sub,
            email: claims.email,
        }
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Session>() {
            Some(session) => ready(Ok(session.clone())),
            None => ready(Err(ErrorUnauthorized("No session"))),
        }
    }
}

impl Session {
    pub fn can(&self, policy: &AccessControlPolicy, feature: &str) -> bool {
        policy.can_access(Some(self.role), feature)
    }

    pub fn require(&self, policy: &AccessControlPolicy, feature: &str) -> actix_web::Result<()> {
        if self.can(policy, feature) {
            Ok(())
        } else {
            tracing::debug!(subject_id = %self.subject_id, role = %self.role, feature, "Access denied");
            Err(ErrorForbidden(format!("No access to {feature}")))
        }
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ErrorForbidden("Admin only"))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::UserMetadata;

    fn session(role: Role) -> Session {
        Session {
            subject_id: "s-1".into(),
            email: None,
            role,
        }
    }

    #[test]
    fn claims_without_role_become_member() {
        let claims = Claims {
            sub: "s-1".into(),
            email: Some("a@b.c".into()),
            exp: 0,
            user_metadata: UserMetadata::default(),
        };
        assert_eq!(Session::from(claims).role, Role::Member);
    }

    #[test]
    fn require_maps_policy_to_forbidden() {
        let policy = AccessControlPolicy::default();
        assert!(session(Role::Member).require(&policy, "attendance").is_ok());
        assert!(session(Role::Member).require(&policy, "members.edit").is_err());
        assert!(session(Role::Manager).require(&policy, "members.edit").is_ok());
        assert!(session(Role::Manager).require_admin().is_err());
        assert!(session(Role::Admin).require_admin().is_ok());
    }

    #[actix_web::test]
    async fn extractor_requires_middleware_session() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        assert!(Session::extract(&req).await.is_err());

        req.extensions_mut().insert(session(Role::Manager));
        let extracted = Session::extract(&req).await.unwrap();
        assert_eq!(extracted.role, Role::Manager);
    }
}
