//! Pipeline configuration files

use crate::error::Result;
use roof_core::MiddlewareConfig;
use std::fs;
use std::path::Path;

/// Parse a [`MiddlewareConfig`] from RON; omitted fields keep their defaults
pub fn load_config_str(content: &str) -> Result<MiddlewareConfig> {
    Ok(ron::from_str(content)?)
}

/// Read a [`MiddlewareConfig`] from a RON file
pub fn load_config_file(path: impl AsRef<Path>) -> Result<MiddlewareConfig> {
    let content = fs::read_to_string(path)?;
    load_config_str(&content)
}
