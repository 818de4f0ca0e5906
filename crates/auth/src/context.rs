//! Per-request authorization context.

use tollgate_core::{Email, UserId};

use crate::Permission;

/// The identity a request acts as, resolved from its session credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub email: Email,
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Principal {
    /// `true` if the principal holds `required` directly or through `"*"`.
    pub fn has_permission(&self, required: &Permission) -> bool {
        self.permissions
            .iter()
            .any(|p| p.is_wildcard() || p == required)
    }
}

/// Authorization context for a single request.
///
/// Built once by the auth middleware and never mutated afterwards. A missing
/// or invalid credential yields the anonymous context rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationContext {
    principal: Option<Principal>,
}

impl AuthorizationContext {
    pub fn anonymous() -> Self {
        Self { principal: None }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}
