//! Configuration and snapshot file loading.

use super::types::ClusterConfig;
use crate::ClusterError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Loader for JSON/YAML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a cluster configuration.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ClusterConfig, ClusterError> {
        let config: ClusterConfig = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load any document from file path.
    /// Supports both JSON (.json) and YAML (.yaml/.yml) formats based on file extension.
    pub fn load<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ClusterError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClusterError::from_io_error(e, "config loading"))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "json" => serde_json::from_str(&content)
                .map_err(|e| ClusterError::from_parse_error(e, "JSON parsing")),
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| ClusterError::from_parse_error(e, "YAML parsing")),
            _ => serde_json::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .map_err(|e| {
                    ClusterError::from_parse_error(e, "parsing (tried both JSON and YAML)")
                }),
        }
    }
}
