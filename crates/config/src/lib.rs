//! Configuration loading and env substitution.
//!
//! Config files: `beacon.toml`, `beacon.yaml`, or `beacon.json`,
//! searched in `./` then `~/.config/beacon/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{BeaconConfig, ServerConfig, TrackerConfig},
};
