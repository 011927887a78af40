//! Step registry.
//!
//! Maps step names to factories. A factory receives the injected
//! [`Dependencies`] and returns a bound step. Building is all-or-nothing:
//! an unknown name or a failing factory aborts before any step runs.

mod dependencies;
mod error;

pub use dependencies::Dependencies;
pub use error::RegistryError;

use crate::config::TriageConfig;
use crate::pipeline::{BoxError, Pipeline, Step};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds a step from the injected collaborators.
pub type StepFactory =
    Arc<dyn Fn(&Dependencies) -> Result<Arc<dyn Step>, BoxError> + Send + Sync>;

/// Name-keyed collection of step factories.
#[derive(Clone, Default)]
pub struct Registry {
    factories: BTreeMap<String, StepFactory>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("steps", &self.names())
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in steps configured from `config`.
    #[must_use]
    pub fn with_builtin_steps(config: &TriageConfig) -> Self {
        let mut registry = Self::new();
        crate::steps::register_builtin(&mut registry, config);
        registry
    }

    /// Registers `factory` under `name`, replacing any previous factory.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Dependencies) -> Result<Arc<dyn Step>, BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .factories
            .insert(name.clone(), Arc::new(factory))
            .is_some()
        {
            warn!(step = %name, "Replacing previously registered step");
        }
    }

    /// Returns true if a factory is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Builds a pipeline running the named steps in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownStep`] if any name is unregistered and
    /// [`RegistryError::Factory`] if a factory fails. All names are checked
    /// before any factory is invoked.
    pub fn build_from_names<S: AsRef<str>>(
        &self,
        names: &[S],
        deps: &Dependencies,
    ) -> Result<Pipeline, RegistryError> {
        let factories = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.factories
                    .get(name)
                    .map(|factory| (name, factory))
                    .ok_or_else(|| RegistryError::UnknownStep {
                        name: name.to_string(),
                        available: self.names().join(", "),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let steps = factories
            .into_iter()
            .map(|(name, factory)| {
                factory(deps).map_err(|source| RegistryError::Factory {
                    step: name.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pipeline = Pipeline::new(steps);
        debug!(steps = ?pipeline.step_names(), dry_run = deps.dry_run, "Built pipeline");
        Ok(pipeline)
    }
}
