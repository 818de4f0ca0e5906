//! Controller declarations.
//!
//! A controller is a singleton type with a static route table:
//!
//! ```ignore
//! impl Controller for UsersController {
//!     const BASE_PATH: &'static str = "/api/Users";
//!
//!     fn actions() -> Vec<ActionDecl<Self>> {
//!         vec![
//!             ActionDecl::new("current_user", Self::current_user)
//!                 .get("CurrentUser")
//!                 .authorize("Authenticated"),
//!             ActionDecl::new("login", Self::login)
//!                 .post("Login")
//!                 .param(ParamSpec::body("credentials")),
//!         ]
//!     }
//! }
//! ```
//!
//! Declaring writes facts into the [`MetadataRegistry`]; the builder reads
//! them back to produce descriptors.

use std::borrow::Cow;
use std::sync::Arc;

use tollgate_auth::{AuthorizationContext, PolicyRequirement};

use crate::metadata::{FactKind, FactValue, MetadataRegistry, Subject};
use crate::{ActionFuture, BoundArgs, ParamDescriptor, ParamSource, ParamType, Verb};

/// The one calling convention for every action: shared instance, request
/// context, positional bound arguments.
pub type Handler<C> = fn(Arc<C>, AuthorizationContext, BoundArgs) -> ActionFuture;

pub trait Controller: Send + Sync + Sized + 'static {
    const BASE_PATH: &'static str;

    fn actions() -> Vec<ActionDecl<Self>>;
}

/// Declaration of one parameter of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    index: Option<usize>,
    name: Cow<'static, str>,
    ty: ParamType,
    source: ParamSource,
    required: bool,
}

impl ParamSpec {
    /// Required string query parameter.
    pub fn query(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            index: None,
            name: name.into(),
            ty: ParamType::String,
            source: ParamSource::Query,
            required: true,
        }
    }

    /// Required parameter bound to the whole parsed request body.
    pub fn body(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            index: None,
            name: name.into(),
            ty: ParamType::Unknown,
            source: ParamSource::Body,
            required: true,
        }
    }

    pub fn number(mut self) -> Self {
        self.ty = ParamType::Number;
        self
    }

    pub fn boolean(mut self) -> Self {
        self.ty = ParamType::Boolean;
        self
    }

    pub fn of_type(mut self, ty: ParamType) -> Self {
        self.ty = ty;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Pin the argument position instead of using declaration order.
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// Declaration of one controller member.
pub struct ActionDecl<C> {
    member: &'static str,
    handler: Handler<C>,
    facts: Vec<(FactKind, FactValue)>,
    next_index: usize,
}

impl<C: Controller> ActionDecl<C> {
    /// Declare `member`. Without an HTTP verb the member is not routed.
    pub fn new(member: &'static str, handler: Handler<C>) -> Self {
        Self {
            member,
            handler,
            facts: Vec::new(),
            next_index: 0,
        }
    }

    pub fn get(self, name: impl Into<String>) -> Self {
        self.route(Verb::Get, Some(name.into()))
    }

    pub fn post(self, name: impl Into<String>) -> Self {
        self.route(Verb::Post, Some(name.into()))
    }

    pub fn put(self, name: impl Into<String>) -> Self {
        self.route(Verb::Put, Some(name.into()))
    }

    pub fn delete(self, name: impl Into<String>) -> Self {
        self.route(Verb::Delete, Some(name.into()))
    }

    /// Route under `verb`; the route segment defaults to the member name.
    pub fn route(mut self, verb: Verb, name: Option<String>) -> Self {
        self.facts.push((FactKind::HttpMethod, FactValue::Verb(verb)));
        if let Some(name) = name {
            self.facts.push((FactKind::PathName, FactValue::Path(name)));
        }
        self
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        let index = spec.index.unwrap_or(self.next_index);
        self.next_index = self.next_index.max(index + 1);
        self.facts.push((
            FactKind::ParamSource,
            FactValue::Param(ParamDescriptor {
                index,
                name: spec.name.into_owned(),
                ty: spec.ty,
                source: spec.source,
                required: spec.required,
            }),
        ));
        self
    }

    /// Require a single named policy.
    pub fn authorize(self, policy: impl Into<Cow<'static, str>>) -> Self {
        self.require(PolicyRequirement::policy(policy))
    }

    /// Require any one of a group of policies.
    pub fn authorize_any<I, S>(self, policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        self.require(PolicyRequirement::group(policies))
    }

    pub fn require(mut self, requirement: PolicyRequirement) -> Self {
        self.facts
            .push((FactKind::PolicyRequirement, FactValue::Requirement(requirement)));
        self
    }

    pub fn member(&self) -> &'static str {
        self.member
    }

    /// Write this declaration's facts under `class` and hand back the handler.
    pub(crate) fn annotate(self, class: &'static str, metadata: &mut MetadataRegistry) -> Handler<C> {
        let subject = Subject::member(class, self.member);
        for (kind, value) in self.facts {
            metadata.put(subject, kind, value);
        }
        self.handler
    }
}
