//! Actor host
//!
//! Turns a [`RuntimeConfig`] into running actors: one scheduler, every
//! configured module built through the [`FactoryRegistry`], and one
//! [`Replier`] for each module that names a `listen` address.

use crate::account;
use actors::{FactoryRegistry, Group, Mailbox, Scheduler};
use anyhow::{Context, Result};
use network::{Replier, TcpConfig};
use runtime_config::RuntimeConfig;
use std::net::SocketAddr;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Registry holding every built-in factory
pub fn default_registry() -> FactoryRegistry {
    let mut registry = FactoryRegistry::new();
    registry.register(account::FACTORY, account::create);
    registry
}

/// Transport limits taken from the runtime configuration
pub fn tcp_config(config: &RuntimeConfig) -> TcpConfig {
    TcpConfig::default().with_max_message_size(config.transport.max_message_size)
}

/// A module's replier, bound but not yet serving
pub struct BoundModule {
    pub name: String,
    pub replier: Replier,
}

impl BoundModule {
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.replier.local_addr()?)
    }
}

pub struct Host {
    scheduler: Scheduler,
    modules: Group,
    tcp: TcpConfig,
    listen: Vec<(String, String)>,
}

impl Host {
    /// Build the scheduler and instantiate every configured module
    pub fn build(config: &RuntimeConfig, registry: &FactoryRegistry) -> Result<Self> {
        let scheduler = Scheduler::new(config.scheduler.threads);
        let modules = Group::new();
        let mut listen = Vec::new();

        for module in &config.modules {
            let mailbox = registry
                .instantiate(&module.factory, &module.configuration)
                .with_context(|| format!("Failed to instantiate module {}", module.name))?;
            info!(module = %module.name, factory = %module.factory, "Module instantiated");
            modules.add(module.name.clone(), mailbox);
            if let Some(addr) = &module.listen {
                listen.push((module.name.clone(), addr.clone()));
            }
        }

        Ok(Self {
            scheduler,
            modules,
            tcp: tcp_config(config),
            listen,
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Every module, addressable as `module/operation`
    pub fn modules(&self) -> &Group {
        &self.modules
    }

    pub fn mailbox(&self, module: &str) -> Option<Mailbox> {
        self.modules.find(module)
    }

    /// Bind a replier for every module with a `listen` address
    pub async fn bind(&self) -> Result<Vec<BoundModule>> {
        let mut bound = Vec::with_capacity(self.listen.len());
        for (name, addr) in &self.listen {
            let replier = Replier::bind(addr.as_str(), self.tcp.clone())
                .await
                .with_context(|| format!("Failed to bind module {} to {}", name, addr))?;
            bound.push(BoundModule {
                name: name.clone(),
                replier,
            });
        }
        Ok(bound)
    }

    /// Serve bound modules until one of their repliers fails
    pub async fn serve(&self, bound: Vec<BoundModule>) -> Result<()> {
        let mut serving = JoinSet::new();
        for BoundModule { name, replier } in bound {
            let mailbox = self
                .mailbox(&name)
                .with_context(|| format!("Module {} is not instantiated", name))?;
            if let Ok(addr) = replier.local_addr() {
                info!(module = %name, addr = %addr, "Serving module");
            }
            let scheduler = self.scheduler.clone();
            serving.spawn(async move { (name, replier.serve(scheduler, mailbox).await) });
        }

        while let Some(joined) = serving.join_next().await {
            let (name, result) = joined.context("Replier task failed")?;
            if let Err(e) = result {
                error!(module = %name, error = %e, "Replier stopped");
                return Err(e).with_context(|| format!("Module {} stopped serving", name));
            }
        }
        Ok(())
    }
}
