//! Configuration loading functions.

use std::fs;
use std::path::Path;

use super::error::ConfigError;
use super::types::Config;

/// Config file names probed in the scan root, in order.
const CONFIG_FILENAMES: &[&str] = &[
    ".omniscan.yaml",
    ".omniscan.yml",
    ".omniscan.json",
    ".omniscan.toml",
];

impl Config {
    /// Load and validate configuration from a file. The format is chosen by
    /// extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let config: Config = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
                path: path.display().to_string(),
                source: e,
            })?,
            "json" => serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
                path: path.display().to_string(),
                source: e,
            })?,
            "toml" => toml::from_str(&content).map_err(|e| ConfigError::ParseToml {
                path: path.display().to_string(),
                source: e,
            })?,
            _ => {
                return Err(ConfigError::UnsupportedFormat(
                    path.display().to_string(),
                    ext,
                ));
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Locate and load the config for a scan root.
    ///
    /// Search order: `.omniscan.yaml`, `.omniscan.yml`, `.omniscan.json`,
    /// `.omniscan.toml` in the root. There is no fallback default: an engine
    /// with zero configured scanners has nothing to do.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        for filename in CONFIG_FILENAMES {
            let path = root.join(filename);
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Err(ConfigError::Validation(format!(
            "no config file found in {} (expected one of: {})",
            root.display(),
            CONFIG_FILENAMES.join(", ")
        )))
    }
}
