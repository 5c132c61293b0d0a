//! Service Configuration Module
//!
//! Loads [`RuntimeConfig`] for an actor host from an optional TOML file
//! with `ACTORS_`-prefixed environment overrides, e.g.
//! `ACTORS_SCHEDULER__THREADS=8` or `ACTORS_LOGGING__LEVEL=debug`.
//!
//! Keys are matched case-insensitively by the loader, so module
//! configuration maps should use lowercase keys.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};
use types::Map;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ACTORS";

/// Top-level actor host configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
    pub transport: TransportConfig,
    pub modules: Vec<ModuleConfig>,
}

/// Worker pool sizing
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SchedulerConfig {
    pub threads: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Log filter and output style
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Socket transport limits
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TransportConfig {
    /// Largest accepted frame, all parts included
    pub max_message_size: usize,
    /// Codec used by requesters and publishers the host creates
    pub default_format: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_message_size: 16 * 1024 * 1024,
            default_format: "json".to_string(),
        }
    }
}

/// One actor instantiated at startup
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModuleConfig {
    /// Unique name of this instance
    pub name: String,
    /// Registered factory building it
    pub factory: String,
    /// Replier address serving it, if exposed
    #[serde(default)]
    pub listen: Option<String>,
    /// Handed to the factory verbatim
    #[serde(default)]
    pub configuration: Map,
}

impl RuntimeConfig {
    /// Load from `path` (if any) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("Loading runtime config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }
        Self::build(builder)
    }

    /// Load from TOML text and the environment
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut runtime: RuntimeConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        runtime.expand_env_vars()?;
        runtime.validate()?;
        debug!(
            threads = runtime.scheduler.threads,
            modules = runtime.modules.len(),
            "Runtime configuration loaded"
        );
        Ok(runtime)
    }

    /// Expand environment variables in listen addresses
    pub fn expand_env_vars(&mut self) -> Result<()> {
        for module in &mut self.modules {
            if let Some(listen) = &module.listen {
                let expanded = shellexpand::env(listen)
                    .with_context(|| format!("Failed to expand listen address of {}", module.name))?;
                module.listen = Some(expanded.into_owned());
            }
        }
        Ok(())
    }

    /// Reject configurations the host cannot start from
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.threads == 0 {
            bail!("scheduler.threads must be at least 1");
        }
        if self.transport.max_message_size == 0 {
            bail!("transport.max_message_size must be at least 1");
        }
        codec::require(&self.transport.default_format)
            .context("Invalid transport.default_format")?;

        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.name.is_empty() {
                bail!("module name must not be empty");
            }
            if !seen.insert(module.name.as_str()) {
                bail!("duplicate module name {}", module.name);
            }
            if module.factory.is_empty() {
                bail!("module {} names no factory", module.name);
            }
        }
        Ok(())
    }

    pub fn module(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|module| module.name == name)
    }

    /// Render back to TOML, e.g. to print the effective configuration
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
