//! Singleton container: one shared instance per type for the process lifetime.
//!
//! Bindings are added during startup; instances are created lazily on first
//! `get` and memoized. Concurrent first `get`s of one type wait on a
//! per-binding guard, so a factory runs once; a failed factory is retried by
//! the next `get`. Factories may resolve their own dependencies through the
//! container they receive; a dependency cycle between factories deadlocks.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn(&Container) -> anyhow::Result<Instance> + Send + Sync>;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("no binding registered for {0}")]
    Unbound(&'static str),

    #[error("{0} is already bound")]
    AlreadyBound(&'static str),

    #[error("failed to construct {type_name}: {source}")]
    Construction {
        type_name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

struct Binding {
    type_name: &'static str,
    instance: OnceLock<Instance>,
    factory: Option<Factory>,
    init: Mutex<()>,
}

#[derive(Default)]
pub struct Container {
    bindings: HashMap<TypeId, Binding>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an already-constructed instance.
    pub fn bind_instance<T: Send + Sync + 'static>(&mut self, value: T) -> Result<(), ContainerError> {
        let instance = OnceLock::new();
        let _ = instance.set(Arc::new(value) as Instance);
        self.insert::<T>(Binding {
            type_name: type_name::<T>(),
            instance,
            factory: None,
            init: Mutex::new(()),
        })
    }

    /// Bind a lazily-constructed singleton.
    pub fn bind_singleton<T, F>(&mut self, factory: F) -> Result<(), ContainerError>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.insert::<T>(Binding {
            type_name: type_name::<T>(),
            instance: OnceLock::new(),
            factory: Some(Box::new(move |c| Ok(Arc::new(factory(c)?) as Instance))),
            init: Mutex::new(()),
        })
    }

    pub fn is_bound<T: 'static>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<T>())
    }

    /// Resolve the singleton for `T`, constructing it on first use.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        let binding = self
            .bindings
            .get(&TypeId::of::<T>())
            .ok_or(ContainerError::Unbound(type_name::<T>()))?;

        let instance = match binding.instance.get() {
            Some(instance) => instance.clone(),
            None => self.construct(binding)?,
        };

        instance
            .downcast::<T>()
            .map_err(|_| ContainerError::Unbound(type_name::<T>()))
    }

    fn construct(&self, binding: &Binding) -> Result<Instance, ContainerError> {
        let factory = binding
            .factory
            .as_ref()
            .ok_or(ContainerError::Unbound(binding.type_name))?;

        let _guard = binding.init.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(instance) = binding.instance.get() {
            return Ok(instance.clone());
        }

        let created = factory(self).map_err(|source| ContainerError::Construction {
            type_name: binding.type_name,
            source,
        })?;
        tracing::debug!(service = binding.type_name, "constructed singleton");
        let _ = binding.instance.set(created.clone());
        Ok(created)
    }

    fn insert<T: 'static>(&mut self, binding: Binding) -> Result<(), ContainerError> {
        let key = TypeId::of::<T>();
        if self.bindings.contains_key(&key) {
            return Err(ContainerError::AlreadyBound(binding.type_name));
        }
        self.bindings.insert(key, binding);
        Ok(())
    }
}

impl core::fmt::Debug for Container {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<&str> = self.bindings.values().map(|b| b.type_name).collect();
        names.sort_unstable();
        f.debug_struct("Container").field("bindings", &names).finish()
    }
}
