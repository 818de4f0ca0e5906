//! `tollgate-router`: controller registration and authorized dispatch.
//!
//! Startup builds an immutable routing table from controller declarations;
//! each request then runs the same pipeline:
//!
//! ```text
//! resolve context -> policy chain -> bind params -> invoke action -> map errors
//! ```

pub mod binder;
pub mod builder;
pub mod controller;
pub mod descriptor;
pub mod dispatcher;
pub mod errors;
pub mod metadata;
pub mod middleware;
pub mod registration;

pub use binder::{ArgValue, BindError, BoundArgs, RequestValues, bind, coerce};
pub use builder::{RegistrationError, join_route};
pub use controller::{ActionDecl, Controller, Handler, ParamSpec};
pub use descriptor::{
    ActionDescriptor, ActionFuture, ControllerDescriptor, ParamDescriptor, ParamSource, ParamType,
    Verb,
};
pub use dispatcher::Dispatcher;
pub use metadata::{AnnotationFact, FactKind, FactValue, MetadataRegistry, Subject};
pub use middleware::{AnonymousMiddleware, AuthMiddleware};
pub use registration::{Registration, RegistrationContext};
