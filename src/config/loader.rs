// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use super::core::AuditConfig;
use super::validation::ConfigValidator;

pub struct ConfigLoader {
    config_path: PathBuf,
    format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Format from the file extension, case-insensitive. Shared by config,
    /// catalog and fixture files.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow::anyhow!("Could not determine file format of {:?}", path))?
            .to_ascii_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            other => Err(anyhow::anyhow!("Unsupported file format: {}", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }

    pub fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        let value: Result<T> = match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(anyhow::Error::from),
            ConfigFormat::Toml => toml::from_str(content).map_err(anyhow::Error::from),
            ConfigFormat::Json => serde_json::from_str(content).map_err(anyhow::Error::from),
        };
        value.with_context(|| format!("Failed to parse {}", self.as_str()))
    }
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref().to_path_buf();
        let format = ConfigFormat::from_path(&path)?;

        Ok(Self {
            config_path: path,
            format,
        })
    }

    pub fn load_config(&self) -> Result<AuditConfig> {
        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;

        let mut config = Self::parse(&content, self.format)?;

        apply_env_overrides(&mut config)?;
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    fn parse(content: &str, format: ConfigFormat) -> Result<AuditConfig> {
        format.deserialize(content).context("Invalid config file")
    }

    pub fn save_config(&self, config: &AuditConfig) -> Result<()> {
        let content = match self.format {
            ConfigFormat::Yaml => serde_yaml::to_string(config)?,
            ConfigFormat::Toml => toml::to_string_pretty(config)?,
            ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        };

        std::fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;

        Ok(())
    }
}

/// Environment variables take precedence over file values
pub fn apply_env_overrides(config: &mut AuditConfig) -> Result<()> {
    if let Ok(delay) = std::env::var("AUDIT_INTER_TEST_DELAY_MS") {
        config.engine.inter_test_delay_ms = delay
            .parse()
            .context("Invalid AUDIT_INTER_TEST_DELAY_MS")?;
    }

    if let Ok(timeout) = std::env::var("AUDIT_PROBE_TIMEOUT_MS") {
        config.probe.timeout_ms = timeout.parse().context("Invalid AUDIT_PROBE_TIMEOUT_MS")?;
    }

    if let Ok(log_level) = std::env::var("AUDIT_LOG_LEVEL") {
        config.observability.log_level = log_level;
    }

    if let Ok(catalog) = std::env::var("AUDIT_CATALOG") {
        config.catalog_path = Some(PathBuf::from(catalog));
    }

    Ok(())
}

/// Load from a file when given, otherwise defaults; env overrides apply either way
pub fn load_config(path: Option<&Path>) -> Result<AuditConfig> {
    match path {
        Some(path) => ConfigLoader::new(path)?.load_config(),
        None => {
            let mut config = AuditConfig::default();
            apply_env_overrides(&mut config)?;
            ConfigValidator::validate(&config)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("audit.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("audit.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("audit.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::from_path(Path::new("audit.ini")).is_err());
        assert!(ConfigFormat::from_path(Path::new("audit")).is_err());
    }

    #[test]
    fn test_detect_format_ignores_extension_case() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("audit.TOML")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("Fixture.Json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("catalog.YML")).unwrap(),
            ConfigFormat::Yaml
        );
    }

    #[test]
    fn test_parse_yaml() {
        let config = ConfigLoader::parse(
            "engine:\n  inter_test_delay_ms: 0\nprobe:\n  sinkhole_addresses: [\"192.0.2.1\"]\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(config.engine.inter_test_delay_ms, 0);
        assert_eq!(config.probe.sinkhole_addresses, vec!["192.0.2.1"]);
        assert_eq!(config.probe.timeout_ms, 2000);
    }
}
