// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::net::IpAddr;
use validator::Validate;

use super::core::AuditConfig;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AuditConfig) -> Result<()> {
        config.validate().context("Configuration validation failed")?;

        Self::validate_probe_config(config)?;
        Self::validate_observability_config(config)?;

        Ok(())
    }

    fn validate_probe_config(config: &AuditConfig) -> Result<()> {
        let scheme = config.probe.scheme.as_str();
        if scheme != "https" && scheme != "http" {
            return Err(anyhow::anyhow!(
                "Probe scheme must be http or https, got '{}'",
                scheme
            ));
        }

        for address in &config.probe.sinkhole_addresses {
            address
                .parse::<IpAddr>()
                .map_err(|_| anyhow::anyhow!("Invalid sinkhole address: {}", address))?;
        }

        if config.probe.detection_timeout_ms < config.probe.timeout_ms / 2 {
            return Err(anyhow::anyhow!(
                "Detection timeout ({}ms) must be at least half the probe timeout ({}ms)",
                config.probe.detection_timeout_ms,
                config.probe.timeout_ms
            ));
        }

        Ok(())
    }

    fn validate_observability_config(config: &AuditConfig) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.observability.log_level.to_lowercase().as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                config.observability.log_level,
                valid_levels
            ));
        }

        Ok(())
    }
}
