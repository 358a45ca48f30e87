//! Configuration loading
//!
//! Builds [`ClientOptions`](classeviva_domain::ClientOptions) from environment
//! variables or a `classeviva.{toml,json}` file.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths, ConfigError};
