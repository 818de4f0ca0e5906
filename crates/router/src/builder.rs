//! Controller builder: turns declared facts into immutable descriptors.
//!
//! Every failure here is a configuration error. Startup must abort on any of
//! them rather than serve a partial routing table.

use std::sync::Arc;

use thiserror::Error;

use tollgate_auth::{PolicyError, PolicyRequirement};
use tollgate_infra::ContainerError;

use crate::controller::{Controller, Handler};
use crate::descriptor::BoundAction;
use crate::metadata::{FactKind, FactValue, MetadataRegistry, Subject};
use crate::{ActionDescriptor, ControllerDescriptor, ParamDescriptor, ParamSource, Verb};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("controller {0} is already registered")]
    AlreadyRegistered(&'static str),

    #[error("controller {0} has no base path")]
    MissingBasePath(&'static str),

    #[error("failed to obtain instance of controller {controller}: {source}")]
    Instance {
        controller: &'static str,
        #[source]
        source: ContainerError,
    },

    #[error("{controller}::{member} declares conflicting HTTP methods")]
    ConflictingVerbs {
        controller: &'static str,
        member: &'static str,
    },

    #[error("{controller}::{member} declares more than one body parameter")]
    MultipleBodyParams {
        controller: &'static str,
        member: &'static str,
    },

    #[error("{controller}::{member} declares parameter position {index} more than once")]
    DuplicateParamIndex {
        controller: &'static str,
        member: &'static str,
        index: usize,
    },

    #[error("{controller}::{member} has no parameter at position {index}")]
    ParamGap {
        controller: &'static str,
        member: &'static str,
        index: usize,
    },

    #[error("{controller}::{member} declares an empty policy group")]
    EmptyPolicyGroup {
        controller: &'static str,
        member: &'static str,
    },

    #[error("route {verb} {path} is declared more than once")]
    DuplicateRoute { verb: Verb, path: String },

    #[error("route {verb} {path} requires unknown policy '{policy}'")]
    UnknownPolicy {
        verb: Verb,
        path: String,
        policy: String,
    },

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// POSIX-style join of a controller base path and an action name.
///
/// Empty and `.` segments are dropped, `..` pops; the result always starts with
/// `/` and never ends with one (except the root itself).
pub fn join_route(base: &str, name: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(name.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}

/// Build the descriptor for controller `C` from the facts in `metadata`.
///
/// `methods` is the controller's member table; members without an HTTP verb
/// fact are skipped.
pub(crate) fn build_controller<C: Controller>(
    class: &'static str,
    metadata: &MetadataRegistry,
    instance: Arc<C>,
    methods: Vec<(&'static str, Handler<C>)>,
) -> Result<ControllerDescriptor, RegistrationError> {
    let base_path = match metadata.get_last(Subject::class(class), FactKind::ControllerPath) {
        Some(FactValue::Path(path)) => path.clone(),
        _ => return Err(RegistrationError::MissingBasePath(class)),
    };

    let mut actions = Vec::new();
    for (member, handler) in methods {
        let subject = Subject::member(class, member);

        let Some(verb) = resolve_verb(class, member, metadata.get(subject, FactKind::HttpMethod))? else {
            tracing::debug!(controller = class, member, "member has no HTTP method; not routed");
            continue;
        };

        let name = match metadata.get_last(subject, FactKind::PathName) {
            Some(FactValue::Path(name)) => name.as_str(),
            _ => member,
        };

        let params = merge_params(class, member, metadata.get(subject, FactKind::ParamSource))?;
        let requirements =
            merge_requirements(class, member, metadata.get(subject, FactKind::PolicyRequirement))?;

        let bound = instance.clone();
        let invoke: BoundAction = Arc::new(move |ctx, args| handler(bound.clone(), ctx, args));

        actions.push(Arc::new(ActionDescriptor {
            member,
            verb,
            path: join_route(&base_path, name),
            params,
            requirements,
            invoke,
        }));
    }

    Ok(ControllerDescriptor {
        name: class,
        base_path,
        instance,
        actions,
    })
}

fn resolve_verb(
    class: &'static str,
    member: &'static str,
    facts: &[FactValue],
) -> Result<Option<Verb>, RegistrationError> {
    let mut verb = None;
    for fact in facts {
        if let FactValue::Verb(v) = fact {
            match verb {
                Some(existing) if existing != *v => {
                    return Err(RegistrationError::ConflictingVerbs {
                        controller: class,
                        member,
                    });
                }
                _ => verb = Some(*v),
            }
        }
    }
    Ok(verb)
}

/// Order parameters by position and enforce the positional invariants.
fn merge_params(
    class: &'static str,
    member: &'static str,
    facts: &[FactValue],
) -> Result<Vec<ParamDescriptor>, RegistrationError> {
    let mut params: Vec<ParamDescriptor> = facts
        .iter()
        .filter_map(|fact| match fact {
            FactValue::Param(p) => Some(p.clone()),
            _ => None,
        })
        .collect();
    params.sort_by_key(|p| p.index);

    for (expected, param) in params.iter().enumerate() {
        if param.index < expected {
            return Err(RegistrationError::DuplicateParamIndex {
                controller: class,
                member,
                index: param.index,
            });
        }
        if param.index > expected {
            return Err(RegistrationError::ParamGap {
                controller: class,
                member,
                index: expected,
            });
        }
    }

    let bodies = params
        .iter()
        .filter(|p| p.source == ParamSource::Body)
        .count();
    if bodies > 1 {
        return Err(RegistrationError::MultipleBodyParams {
            controller: class,
            member,
        });
    }

    Ok(params)
}

/// Accumulate requirements in declaration order, dropping repeats.
fn merge_requirements(
    class: &'static str,
    member: &'static str,
    facts: &[FactValue],
) -> Result<Vec<PolicyRequirement>, RegistrationError> {
    let mut requirements: Vec<PolicyRequirement> = Vec::new();
    for fact in facts {
        let FactValue::Requirement(requirement) = fact else {
            continue;
        };
        if matches!(requirement, PolicyRequirement::Group(names) if names.is_empty()) {
            return Err(RegistrationError::EmptyPolicyGroup {
                controller: class,
                member,
            });
        }
        if !requirements.contains(requirement) {
            requirements.push(requirement.clone());
        }
    }
    Ok(requirements)
}
