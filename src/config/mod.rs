// src/config/mod.rs
pub mod desk;

pub use desk::{DeskConfig, EngineParams, ServerConfig, UpstashConfig};

use anyhow::{anyhow, Result};
use std::path::PathBuf;

pub const ENV_CONFIG_PATH: &str = "DESK_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/desk.toml";

/// Load config using env var + fallbacks:
/// 1) $DESK_CONFIG_PATH (must exist)
/// 2) config/desk.toml
/// 3) built-in defaults
pub fn load_default() -> Result<DeskConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return DeskConfig::load_from_file(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_CONFIG_PATH);
    if toml_p.exists() {
        return DeskConfig::load_from_file(&toml_p);
    }
    DeskConfig::from_toml_str("")
}
