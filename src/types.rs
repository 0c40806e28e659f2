// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Defensive layer a category is scored under
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Dns,
    Browser,
    Cname,
    Advanced,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Dns, Layer::Browser, Layer::Cname, Layer::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Dns => "dns",
            Layer::Browser => "browser",
            Layer::Cname => "cname",
            Layer::Advanced => "advanced",
        }
    }

    /// Human-facing name used by the report projections
    pub fn display_name(&self) -> &'static str {
        match self {
            Layer::Dns => "DNS Level",
            Layer::Browser => "Browser Level",
            Layer::Cname => "CNAME Protection",
            Layer::Advanced => "Advanced Tracking",
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dns" => Ok(Layer::Dns),
            "browser" => Ok(Layer::Browser),
            "cname" => Ok(Layer::Cname),
            "advanced" => Ok(Layer::Advanced),
            other => Err(other.to_string()),
        }
    }
}

/// Probe capability a test is dispatched to.
///
/// Catalog files name methods by their display string ("DNS", "DOM Bait",
/// "Canvas API", ...). Names outside the known set are kept verbatim in
/// `Unrecognized` so a custom catalog still loads; such tests are reported
/// as `Unsupported` instead of reaching a probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TestMethod {
    Dns,
    Script,
    Pixel,
    Api,
    Cdn,
    DomBait,
    ScriptInjection,
    Cname,
    CanvasApi,
    WebGlApi,
    AudioApi,
    FontApi,
    ScreenApi,
    NavigatorApi,
    WebRtcApi,
    ServiceWorker,
    WebSocket,
    BeaconApi,
    IndexedDb,
    LocalStorage,
    HttpEtags,
    Unrecognized(String),
}

impl TestMethod {
    pub const KNOWN: [TestMethod; 21] = [
        TestMethod::Dns,
        TestMethod::Script,
        TestMethod::Pixel,
        TestMethod::Api,
        TestMethod::Cdn,
        TestMethod::DomBait,
        TestMethod::ScriptInjection,
        TestMethod::Cname,
        TestMethod::CanvasApi,
        TestMethod::WebGlApi,
        TestMethod::AudioApi,
        TestMethod::FontApi,
        TestMethod::ScreenApi,
        TestMethod::NavigatorApi,
        TestMethod::WebRtcApi,
        TestMethod::ServiceWorker,
        TestMethod::WebSocket,
        TestMethod::BeaconApi,
        TestMethod::IndexedDb,
        TestMethod::LocalStorage,
        TestMethod::HttpEtags,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TestMethod::Dns => "DNS",
            TestMethod::Script => "Script",
            TestMethod::Pixel => "Pixel",
            TestMethod::Api => "API",
            TestMethod::Cdn => "CDN",
            TestMethod::DomBait => "DOM Bait",
            TestMethod::ScriptInjection => "Script Injection",
            TestMethod::Cname => "CNAME",
            TestMethod::CanvasApi => "Canvas API",
            TestMethod::WebGlApi => "WebGL API",
            TestMethod::AudioApi => "Audio API",
            TestMethod::FontApi => "Font API",
            TestMethod::ScreenApi => "Screen API",
            TestMethod::NavigatorApi => "Navigator API",
            TestMethod::WebRtcApi => "WebRTC API",
            TestMethod::ServiceWorker => "Service Worker",
            TestMethod::WebSocket => "WebSocket",
            TestMethod::BeaconApi => "Beacon API",
            TestMethod::IndexedDb => "IndexedDB",
            TestMethod::LocalStorage => "LocalStorage",
            TestMethod::HttpEtags => "HTTP ETags",
            TestMethod::Unrecognized(name) => name.as_str(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, TestMethod::Unrecognized(_))
    }

    /// Methods that only have meaning inside a live browser page
    pub fn requires_browser(&self) -> bool {
        matches!(
            self,
            TestMethod::DomBait
                | TestMethod::ScriptInjection
                | TestMethod::CanvasApi
                | TestMethod::WebGlApi
                | TestMethod::AudioApi
                | TestMethod::FontApi
                | TestMethod::ScreenApi
                | TestMethod::NavigatorApi
                | TestMethod::WebRtcApi
                | TestMethod::ServiceWorker
                | TestMethod::BeaconApi
                | TestMethod::IndexedDb
                | TestMethod::LocalStorage
        )
    }
}

impl From<&str> for TestMethod {
    fn from(name: &str) -> Self {
        TestMethod::KNOWN
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(name.trim()))
            .cloned()
            .unwrap_or_else(|| TestMethod::Unrecognized(name.to_string()))
    }
}

impl std::fmt::Display for TestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for TestMethod {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TestMethod {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(TestMethod::from(name.as_str()))
    }
}

/// A single declarative test
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestDefinition {
    pub id: String,
    pub name: String,
    /// Domain, URL or synthetic local identifier handed to the probe
    pub target: String,
    pub method: TestMethod,
    #[serde(default)]
    pub critical: bool,
}

impl TestDefinition {
    pub fn new(id: &str, name: &str, target: &str, method: TestMethod, critical: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            target: target.to_string(),
            method,
            critical,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub icon: String,
    pub layer: Layer,
    pub weight: f64,
    #[serde(default)]
    pub tests: Vec<TestDefinition>,
}

/// Running per-category counters for one run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub total: u32,
    pub blocked: u32,
    pub allowed: u32,
    pub weight: f64,
    pub layer: Layer,
}

impl CategoryStat {
    pub fn new(total: u32, weight: f64, layer: Layer) -> Self {
        Self {
            total,
            blocked: 0,
            allowed: 0,
            weight,
            layer,
        }
    }

    pub fn completed(&self) -> u32 {
        self.blocked + self.allowed
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == self.total
    }

    pub fn block_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.blocked as f64 / self.total as f64
        }
    }
}

/// Classification of how (or why) a test ended up blocked or allowed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockType {
    None,
    NetworkBlock,
    BrowserDomBlock,
    ApiUnavailable,
    Exception,
    Unsupported,
    /// Probe-specific detail. Build it with [`BlockType::other`] so that a
    /// label naming a taxonomy entry never ends up here.
    Other(String),
}

impl BlockType {
    /// Residual classification, normalized through the label parser:
    /// `other("Exception")` is `Exception`, `other("")` is `None`.
    pub fn other(detail: impl AsRef<str>) -> Self {
        BlockType::from(detail.as_ref())
    }

    pub fn as_str(&self) -> &str {
        match self {
            BlockType::None => "None",
            BlockType::NetworkBlock => "DNS/NetworkBlock",
            BlockType::BrowserDomBlock => "BrowserDOMBlock",
            BlockType::ApiUnavailable => "APIUnavailable",
            BlockType::Exception => "Exception",
            BlockType::Unsupported => "Unsupported",
            BlockType::Other(detail) => detail.as_str(),
        }
    }
}

impl From<&str> for BlockType {
    fn from(label: &str) -> Self {
        match label.trim() {
            "" | "None" => BlockType::None,
            "DNS/NetworkBlock" | "DNS" | "DNS/Network" | "NetworkBlock" => BlockType::NetworkBlock,
            "BrowserDOMBlock" | "Browser DOM" => BlockType::BrowserDomBlock,
            "APIUnavailable" => BlockType::ApiUnavailable,
            "Exception" => BlockType::Exception,
            "Unsupported" => BlockType::Unsupported,
            other => BlockType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for BlockType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BlockType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(BlockType::from(label.as_str()))
    }
}

/// Outcome of one executed test, appended to the run log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub target: String,
    pub method: TestMethod,
    pub layer: Layer,
    pub blocked: bool,
    pub block_type: BlockType,
    /// "None" when the probe had nothing to report
    pub error: String,
    pub execution_time_ms: u64,
    pub critical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub dns_filtering_active: bool,
    pub browser_ad_block_active: bool,
    /// Best-effort label, never a definitive identification
    pub dns_provider: String,
}

impl Default for DetectionResult {
    fn default() -> Self {
        Self {
            dns_filtering_active: false,
            browser_ad_block_active: false,
            dns_provider: "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scores {
    pub global: u8,
    pub dns: u8,
    pub browser: u8,
    pub cname: u8,
    pub advanced: u8,
}

impl Scores {
    pub fn layer(&self, layer: Layer) -> u8 {
        match layer {
            Layer::Dns => self.dns,
            Layer::Browser => self.browser,
            Layer::Cname => self.cname,
            Layer::Advanced => self.advanced,
        }
    }

    pub fn set_layer(&mut self, layer: Layer, score: u8) {
        match layer {
            Layer::Dns => self.dns = score,
            Layer::Browser => self.browser = score,
            Layer::Cname => self.cname = score,
            Layer::Advanced => self.advanced = score,
        }
    }
}

/// Test ids bucketed by the layer that blocked them, plus the tests that
/// were allowed through
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub blocked_by_dns: Vec<String>,
    pub blocked_by_browser: Vec<String>,
    pub cname_detected: Vec<String>,
    pub fingerprinting_blocked: Vec<String>,
    pub allowed_through: Vec<String>,
}

impl RunMetadata {
    pub fn record(&mut self, test_id: &str, layer: Layer, blocked: bool) {
        let bucket = if !blocked {
            &mut self.allowed_through
        } else {
            match layer {
                Layer::Dns => &mut self.blocked_by_dns,
                Layer::Browser => &mut self.blocked_by_browser,
                Layer::Cname => &mut self.cname_detected,
                Layer::Advanced => &mut self.fingerprinting_blocked,
            }
        };
        bucket.push(test_id.to_string());
    }

    pub fn blocked_total(&self) -> usize {
        self.blocked_by_dns.len()
            + self.blocked_by_browser.len()
            + self.cname_detected.len()
            + self.fingerprinting_blocked.len()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: u32,
    pub blocked: u32,
    pub allowed: u32,
    /// Percentage with two decimals, e.g. "62.50%"
    pub block_rate: String,
}

impl RunSummary {
    pub fn from_counts(total: u32, blocked: u32, allowed: u32) -> Self {
        let rate = if total == 0 {
            0.0
        } else {
            blocked as f64 / total as f64 * 100.0
        };
        Self {
            total,
            blocked,
            allowed,
            block_rate: format!("{:.2}%", rate),
        }
    }
}

/// Remediation severity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub remediation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlocklistSuggestion {
    pub name: String,
    pub description: String,
    pub url: String,
}

/// Final state of one run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub version: String,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub execution_time_secs: f64,
    pub detection: DetectionResult,
    pub scores: Scores,
    pub summary: RunSummary,
    pub metadata: RunMetadata,
    /// Keyed by category id
    pub category_stats: BTreeMap<String, CategoryStat>,
    pub test_results: Vec<TestResult>,
    pub recommendations: Vec<Recommendation>,
    pub blocklists: Vec<BlocklistSuggestion>,
}
