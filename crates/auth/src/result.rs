use serde::{Serialize, Serializer};

use crate::Permission;

/// Why a policy rejected a request.
///
/// Serialized as a bare string: `"Unauthorized"`, `"Forbidden"`, or the
/// missing permission code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No authenticated principal.
    Unauthorized,
    /// Authenticated, but not allowed.
    Forbidden,
    /// Authenticated, but missing a specific permission.
    Permission(Permission),
}

impl FailureReason {
    pub fn as_str(&self) -> &str {
        match self {
            FailureReason::Unauthorized => "Unauthorized",
            FailureReason::Forbidden => "Forbidden",
            FailureReason::Permission(p) => p.as_str(),
        }
    }
}

impl core::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FailureReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Outcome of a single policy check or of a whole requirement chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    Ok,
    Error(Vec<FailureReason>),
}

impl AuthorizationResult {
    pub fn fail(reason: FailureReason) -> Self {
        Self::Error(vec![reason])
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AuthorizationResult::Ok)
    }

    /// Failure reasons, empty when the result is `Ok`.
    pub fn failure_reasons(&self) -> &[FailureReason] {
        match self {
            AuthorizationResult::Ok => &[],
            AuthorizationResult::Error(reasons) => reasons,
        }
    }
}
