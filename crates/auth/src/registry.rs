//! Name → policy lookup table, filled during startup registration.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::Policy;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A requirement names a policy that was never registered.
    #[error("no policy registered under '{0}'")]
    Unknown(String),

    #[error("policy '{0}' is already registered")]
    Duplicate(String),
}

/// Registered policies, keyed by exact name.
#[derive(Default, Clone)]
pub struct PolicyRegistry {
    policies: HashMap<String, Arc<dyn Policy>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        policy: impl Policy + 'static,
    ) -> Result<(), PolicyError> {
        let name = name.into();
        if self.policies.contains_key(&name) {
            return Err(PolicyError::Duplicate(name));
        }
        tracing::debug!(policy = %name, "registered policy");
        self.policies.insert(name, Arc::new(policy));
        Ok(())
    }

    /// Exact-match lookup. Names are case-sensitive.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Policy>> {
        self.policies.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }
}

impl core::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("PolicyRegistry").field("policies", &names).finish()
    }
}
