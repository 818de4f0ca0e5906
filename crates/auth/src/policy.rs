//! Policy contract and the built-in policies.

use async_trait::async_trait;

use crate::{AuthorizationContext, AuthorizationResult, FailureReason, Permission};

/// A named authorization check.
///
/// Policies are stateless functions of the context: one shared instance per
/// name serves every request.
#[async_trait]
pub trait Policy: Send + Sync {
    async fn handle(&self, ctx: &AuthorizationContext) -> AuthorizationResult;
}

/// Passes for any authenticated principal.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthenticatedPolicy;

#[async_trait]
impl Policy for AuthenticatedPolicy {
    async fn handle(&self, ctx: &AuthorizationContext) -> AuthorizationResult {
        if ctx.is_authenticated() {
            AuthorizationResult::Ok
        } else {
            AuthorizationResult::fail(FailureReason::Unauthorized)
        }
    }
}

/// Passes when the principal holds a specific permission.
#[derive(Debug, Clone)]
pub struct PermissionPolicy {
    required: Permission,
}

impl PermissionPolicy {
    pub fn new(required: Permission) -> Self {
        Self { required }
    }
}

#[async_trait]
impl Policy for PermissionPolicy {
    async fn handle(&self, ctx: &AuthorizationContext) -> AuthorizationResult {
        match ctx.principal() {
            None => AuthorizationResult::fail(FailureReason::Unauthorized),
            Some(p) if p.has_permission(&self.required) => AuthorizationResult::Ok,
            Some(_) => AuthorizationResult::fail(FailureReason::Permission(self.required.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Principal;
    use tollgate_core::{Email, UserId};

    fn principal(perms: &[&'static str]) -> Principal {
        Principal {
            user_id: UserId::new(),
            email: Email::parse("alice@example.com").unwrap(),
            name: "Alice".to_string(),
            permissions: perms.iter().map(|p| Permission::from_static(p)).collect(),
        }
    }

    #[tokio::test]
    async fn authenticated_rejects_anonymous() {
        let res = AuthenticatedPolicy.handle(&AuthorizationContext::anonymous()).await;
        assert_eq!(res, AuthorizationResult::fail(FailureReason::Unauthorized));
    }

    #[tokio::test]
    async fn authenticated_accepts_any_principal() {
        let ctx = AuthorizationContext::authenticated(principal(&[]));
        assert!(AuthenticatedPolicy.handle(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn permission_policy_reports_missing_permission() {
        let policy = PermissionPolicy::new(Permission::from_static("manageUsers"));
        let ctx = AuthorizationContext::authenticated(principal(&["manageProducts"]));

        let res = policy.handle(&ctx).await;
        assert_eq!(res.failure_reasons()[0].as_str(), "manageUsers");
    }

    #[tokio::test]
    async fn permission_policy_honors_wildcard() {
        let policy = PermissionPolicy::new(Permission::from_static("manageUsers"));
        let ctx = AuthorizationContext::authenticated(principal(&["*"]));
        assert!(policy.handle(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn permission_policy_rejects_anonymous_as_unauthorized() {
        let policy = PermissionPolicy::new(Permission::from_static("manageUsers"));
        let res = policy.handle(&AuthorizationContext::anonymous()).await;
        assert_eq!(res, AuthorizationResult::fail(FailureReason::Unauthorized));
    }
}
