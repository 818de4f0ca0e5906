//! `tollgate-auth`: authorization policies and session identity.
//!
//! This crate is decoupled from HTTP and storage: it knows how to evaluate a
//! chain of named policies against an [`AuthorizationContext`] and how to
//! issue/verify session tokens, nothing more.

pub mod claims;
pub mod context;
pub mod evaluator;
pub mod permissions;
pub mod policy;
pub mod registry;
pub mod requirement;
pub mod result;

pub use claims::{Hs256SessionTokens, SessionClaims, TokenError, TokenValidator, validate_claims};
pub use context::{AuthorizationContext, Principal};
pub use evaluator::PolicyEvaluator;
pub use permissions::Permission;
pub use policy::{AuthenticatedPolicy, PermissionPolicy, Policy};
pub use registry::{PolicyError, PolicyRegistry};
pub use requirement::PolicyRequirement;
pub use result::{AuthorizationResult, FailureReason};
