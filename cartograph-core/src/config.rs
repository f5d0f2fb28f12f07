use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level analyzer configuration, matching `.cartograph/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub discovery: DiscoverySection,
}

impl AnalyzerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.include_patterns.is_empty() {
            return Err(ConfigError::Invalid(
                "discovery.include_patterns must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// File discovery: which paths enter the pipeline at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySection {
    pub include_patterns: Vec<String>,
    /// Vendor and build output directories are excluded by default; file
    /// selection policy beyond these lists belongs to the caller.
    pub exclude_patterns: Vec<String>,
    /// Files larger than this are skipped with a diagnostic so one giant
    /// blob cannot stall the extraction barrier.
    pub max_file_bytes: u64,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            include_patterns: vec!["**/*".into()],
            exclude_patterns: vec![
                "**/.git/**".into(),
                "**/node_modules/**".into(),
                "**/.next/**".into(),
                "**/dist/**".into(),
                "**/build/**".into(),
                "**/target/**".into(),
                "**/__pycache__/**".into(),
                "**/venv/**".into(),
                "**/env/**".into(),
                "**/vendor/**".into(),
            ],
            max_file_bytes: 1_048_576,
        }
    }
}
