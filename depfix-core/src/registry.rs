//! Explicit name→factory registries for the pluggable collaborators.
//!
//! Configuration refers to package managers, platforms, and notification
//! sinks by discriminator strings; each registry resolves those strings at
//! initialization time. Unknown names fail fast with the known set.

use crate::adapters::LogSink;
use crate::ports::{GitPlatformClient, NotificationSink, PackageManagerAdapter};
use std::collections::BTreeMap;

type Factory<T> = Box<dyn Fn() -> Box<T> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown {kind} \"{name}\" (registered: {known})")]
    Unknown {
        kind: &'static str,
        name: String,
        known: String,
    },

    #[error("{kind} \"{name}\" is already registered")]
    Duplicate { kind: &'static str, name: String },
}

/// A map from discriminator string to a constructor returning a boxed
/// implementation of the collaborator trait.
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    factories: BTreeMap<String, Factory<T>>,
}

impl<T: ?Sized> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: BTreeMap::new(),
        }
    }

    pub fn register(
        &mut self,
        name: &str,
        factory: impl Fn() -> Box<T> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        if self.factories.contains_key(name) {
            return Err(RegistryError::Duplicate {
                kind: self.kind,
                name: name.to_string(),
            });
        }
        self.factories.insert(name.to_string(), Box::new(factory));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Box<T>, RegistryError> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(RegistryError::Unknown {
                kind: self.kind,
                name: name.to_string(),
                known: self.known(),
            }),
        }
    }

    pub fn resolve_all(&self, names: &[String]) -> Result<Vec<Box<T>>, RegistryError> {
        names.iter().map(|name| self.resolve(name)).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    fn known(&self) -> String {
        if self.factories.is_empty() {
            "none".to_string()
        } else {
            self.names().join(", ")
        }
    }
}

pub type ManagerRegistry = Registry<dyn PackageManagerAdapter>;
pub type PlatformRegistry = Registry<dyn GitPlatformClient>;
pub type SinkRegistry = Registry<dyn NotificationSink>;

/// Package-manager registry with no builtins; concrete ecosystem adapters
/// register themselves here.
pub fn manager_registry() -> ManagerRegistry {
    Registry::new("package manager")
}

/// Platform registry with the dry-run client preinstalled.
pub fn platform_registry() -> PlatformRegistry {
    let mut registry: PlatformRegistry = Registry::new("platform");
    let registered = registry.register("dry-run", || {
        Box::new(crate::adapters::DryRunPlatform::default())
    });
    debug_assert!(registered.is_ok());
    registry
}

/// Sink registry with the tracing-backed log sink preinstalled.
pub fn sink_registry() -> SinkRegistry {
    let mut registry: SinkRegistry = Registry::new("notification sink");
    let registered = registry.register("log", || Box::new(LogSink));
    debug_assert!(registered.is_ok());
    registry
}
