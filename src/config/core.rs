// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AuditConfig {
    #[validate(nested)]
    #[serde(default)]
    pub engine: EngineConfig,

    #[validate(nested)]
    #[serde(default)]
    pub probe: ProbeConfig,

    #[validate(nested)]
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Custom catalog file; the built-in catalog is used when unset
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Pause between tests, for a steadily progressing status stream
    #[validate(range(max = 10000))]
    #[serde(default = "default_inter_test_delay")]
    pub inter_test_delay_ms: u64,
}

impl EngineConfig {
    pub fn inter_test_delay(&self) -> Duration {
        Duration::from_millis(self.inter_test_delay_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inter_test_delay_ms: default_inter_test_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProbeConfig {
    #[validate(range(min = 100, max = 60000))]
    #[serde(default = "default_probe_timeout")]
    pub timeout_ms: u64,

    #[validate(range(min = 100, max = 60000))]
    #[serde(default = "default_detection_timeout")]
    pub detection_timeout_ms: u64,

    #[validate(length(min = 1))]
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Extra block-page addresses; unspecified and loopback answers always count
    #[serde(default)]
    pub sinkhole_addresses: Vec<String>,

    /// Origin queried by the HTTP ETag test
    #[validate(url)]
    #[serde(default)]
    pub etag_origin: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout(),
            detection_timeout_ms: default_detection_timeout(),
            scheme: default_scheme(),
            sinkhole_addresses: Vec::new(),
            etag_origin: None,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DetectionConfig {
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_dns_quorum_ratio")]
    pub dns_quorum_ratio: f64,

    #[validate(range(min = 1))]
    #[serde(default = "default_browser_quorum_min")]
    pub browser_quorum_min: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            dns_quorum_ratio: default_dns_quorum_ratio(),
            browser_quorum_min: default_browser_quorum_min(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_inter_test_delay() -> u64 {
    120
}

fn default_probe_timeout() -> u64 {
    2000
}

fn default_detection_timeout() -> u64 {
    3000
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_dns_quorum_ratio() -> f64 {
    0.5
}

fn default_browser_quorum_min() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}
