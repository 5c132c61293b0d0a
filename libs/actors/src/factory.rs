//! Actor factories
//!
//! Explicit registry of constructors turning a configuration [`Map`] into
//! a [`Mailbox`]. Hosts fill a [`FactoryRegistry`] at startup and hand it
//! to whatever instantiates configured actors.

use crate::error::DispatchError;
use crate::mailbox::Mailbox;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use types::{Error, Map};

/// Builds an actor from its configuration
pub trait ActorFactory: Send + Sync {
    fn create(&self, configuration: &Map) -> Result<Mailbox, Error>;
}

impl<F> ActorFactory for F
where
    F: Fn(&Map) -> Result<Mailbox, Error> + Send + Sync,
{
    fn create(&self, configuration: &Map) -> Result<Mailbox, Error> {
        self(configuration)
    }
}

/// Named actor factories
#[derive(Clone, Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, Arc<dyn ActorFactory>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any earlier one
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: ActorFactory + 'static,
    {
        let name = name.into();
        debug!(factory = %name, "Registering actor factory");
        self.factories.insert(name, Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build an actor with the factory registered as `name`
    pub fn instantiate(&self, name: &str, configuration: &Map) -> Result<Mailbox, Error> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| DispatchError::UnknownFactory {
                name: name.to_string(),
            })?;
        debug!(factory = name, "Instantiating actor");
        factory.create(configuration)
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("factories", &self.names())
            .finish()
    }
}
