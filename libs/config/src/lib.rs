//! # Actor Host Configuration
//!
//! Configuration loading and logging setup shared by actor host binaries.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use runtime_config::{init_logging, RuntimeConfig};
//! use std::path::Path;
//!
//! let config = RuntimeConfig::load(Some(Path::new("config/host.toml")))?;
//! init_logging(&config.logging)?;
//! for module in &config.modules {
//!     println!("{} built by {}", module.name, module.factory);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod logging;
pub mod service_config;

// Re-export commonly used types
pub use logging::init_logging;
pub use service_config::{
    LoggingConfig, ModuleConfig, RuntimeConfig, SchedulerConfig, TransportConfig, ENV_PREFIX,
};
