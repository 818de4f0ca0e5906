//! Startup registration: the only phase in which routing state is mutable.

use std::any::type_name;
use std::collections::HashSet;
use std::sync::Arc;

use tollgate_auth::{Policy, PolicyEvaluator, PolicyRegistry};
use tollgate_infra::Container;

use crate::builder::{RegistrationError, build_controller};
use crate::controller::Controller;
use crate::metadata::{FactKind, FactValue, MetadataRegistry, Subject};
use crate::{ActionDescriptor, ControllerDescriptor};

/// Mutable registration state, used sequentially during startup.
#[derive(Debug, Default)]
pub struct RegistrationContext {
    metadata: MetadataRegistry,
    policies: PolicyRegistry,
    controllers: Vec<ControllerDescriptor>,
    registered: HashSet<&'static str>,
}

impl RegistrationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_policy(
        &mut self,
        name: impl Into<String>,
        policy: impl Policy + 'static,
    ) -> Result<&mut Self, RegistrationError> {
        self.policies.register(name, policy)?;
        Ok(self)
    }

    /// Declare `C`, build its descriptor, and append it to the table.
    ///
    /// The controller instance is the container's singleton for `C`.
    pub fn register_controller<C: Controller>(
        &mut self,
        container: &Container,
    ) -> Result<&mut Self, RegistrationError> {
        let class = type_name::<C>();
        if !self.registered.insert(class) {
            return Err(RegistrationError::AlreadyRegistered(class));
        }

        self.metadata.put(
            Subject::class(class),
            FactKind::ControllerPath,
            FactValue::Path(C::BASE_PATH.to_string()),
        );

        let methods: Vec<_> = C::actions()
            .into_iter()
            .map(|decl| (decl.member(), decl.annotate(class, &mut self.metadata)))
            .collect();

        let instance = container
            .get::<C>()
            .map_err(|source| RegistrationError::Instance {
                controller: class,
                source,
            })?;

        let descriptor = build_controller(class, &self.metadata, instance, methods)?;
        tracing::debug!(
            controller = class,
            base_path = %descriptor.base_path,
            actions = descriptor.actions.len(),
            "registered controller"
        );
        self.controllers.push(descriptor);
        Ok(self)
    }

    fn validate(&self) -> Result<(), RegistrationError> {
        let mut seen = HashSet::new();
        for action in self.controllers.iter().flat_map(|c| &c.actions) {
            if !seen.insert((action.verb, action.path.as_str())) {
                return Err(RegistrationError::DuplicateRoute {
                    verb: action.verb,
                    path: action.path.clone(),
                });
            }

            let unknown = action
                .requirements
                .iter()
                .flat_map(|r| r.names())
                .find(|name| !self.policies.contains(name));
            if let Some(policy) = unknown {
                return Err(RegistrationError::UnknownPolicy {
                    verb: action.verb,
                    path: action.path.clone(),
                    policy: policy.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validate the whole table and freeze it.
    ///
    /// Fails on duplicate `(verb, path)` routes and on requirements naming
    /// unregistered policies.
    pub fn finish(self) -> Result<Registration, RegistrationError> {
        self.validate()?;

        Ok(Registration {
            controllers: self.controllers,
            evaluator: PolicyEvaluator::new(self.policies),
        })
    }
}

/// The frozen routing table and policy set. Read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct Registration {
    controllers: Vec<ControllerDescriptor>,
    evaluator: PolicyEvaluator,
}

impl Registration {
    pub fn controllers(&self) -> &[ControllerDescriptor] {
        &self.controllers
    }

    pub fn actions(&self) -> impl Iterator<Item = &Arc<ActionDescriptor>> {
        self.controllers.iter().flat_map(|c| c.actions.iter())
    }

    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }
}
