//! Normalized, immutable routing descriptors produced at startup.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::response::Response;
use axum::routing::MethodFilter;
use tollgate_auth::{AuthorizationContext, PolicyRequirement};

use crate::BoundArgs;

/// What every action returns. The action writes its own success response.
pub type ActionFuture = Pin<Box<dyn Future<Output = anyhow::Result<Response>> + Send>>;

/// An action bound to its controller instance.
pub(crate) type BoundAction =
    Arc<dyn Fn(AuthorizationContext, BoundArgs) -> ActionFuture + Send + Sync>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }

    pub(crate) fn method_filter(&self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Put => MethodFilter::PUT,
            Verb::Delete => MethodFilter::DELETE,
        }
    }
}

impl core::fmt::Display for Verb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a bound parameter; drives query-value coercion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Unknown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParamSource {
    Query,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamDescriptor {
    /// Position in the action's argument list.
    pub index: usize,
    pub name: String,
    pub ty: ParamType,
    pub source: ParamSource,
    pub required: bool,
}

/// One routable action.
#[derive(Clone)]
pub struct ActionDescriptor {
    /// Controller member the action was declared on.
    pub member: &'static str,
    pub verb: Verb,
    /// Full route: controller base path joined with the action name.
    pub path: String,
    /// Ordered by `index`, contiguous from zero.
    pub params: Vec<ParamDescriptor>,
    /// Ordered, de-duplicated authorization chain.
    pub requirements: Vec<PolicyRequirement>,
    pub(crate) invoke: BoundAction,
}

impl ActionDescriptor {
    pub fn invoke(&self, ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        (self.invoke)(ctx, args)
    }

    /// The single body-sourced parameter, if any.
    pub fn body_param(&self) -> Option<&ParamDescriptor> {
        self.params.iter().find(|p| p.source == ParamSource::Body)
    }
}

impl core::fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("member", &self.member)
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}

/// A registered controller: its base path, shared instance, and actions.
#[derive(Clone)]
pub struct ControllerDescriptor {
    pub name: &'static str,
    pub base_path: String,
    pub instance: Arc<dyn Any + Send + Sync>,
    pub actions: Vec<Arc<ActionDescriptor>>,
}

impl core::fmt::Debug for ControllerDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerDescriptor")
            .field("name", &self.name)
            .field("base_path", &self.base_path)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}
