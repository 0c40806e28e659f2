// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Test Catalog
 * Declarative registry of categories and tests, organized by layer
 *
 * Each test includes:
 * - id: globally unique identifier
 * - target: domain, URL or synthetic local identifier
 * - method: which probe capability to invoke
 * - critical: importance hint for reporting
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::config::ConfigFormat;
use crate::errors::CatalogError;
use crate::types::{Category, CategoryStat, Layer, TestDefinition, TestMethod};

/// Validated, read-only set of categories shared across runs
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    categories: Vec<Category>,
}

/// On-disk layout of a custom catalog file
#[derive(Debug, Deserialize)]
struct CatalogFile {
    categories: Vec<CategoryEntry>,
}

/// Category as written in a catalog file; the layer is parsed on conversion
#[derive(Debug, Deserialize)]
struct CategoryEntry {
    id: String,
    title: String,
    #[serde(default)]
    icon: String,
    layer: String,
    weight: f64,
    #[serde(default)]
    tests: Vec<TestDefinition>,
}

impl TryFrom<CategoryEntry> for Category {
    type Error = CatalogError;

    fn try_from(entry: CategoryEntry) -> Result<Self, Self::Error> {
        let layer = entry
            .layer
            .parse::<Layer>()
            .map_err(|_| CatalogError::UnknownLayer {
                category: entry.id.clone(),
                layer: entry.layer.clone(),
            })?;

        Ok(Category {
            id: entry.id,
            title: entry.title,
            icon: entry.icon,
            layer,
            weight: entry.weight,
            tests: entry.tests,
        })
    }
}

#[derive(Serialize)]
struct CatalogExport<'a> {
    categories: &'a [Category],
}

impl Catalog {
    /// Validate and wrap a list of categories
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        validate(&categories)?;
        debug!(
            "Catalog validated: {} categories, {} tests",
            categories.len(),
            categories.iter().map(|c| c.tests.len()).sum::<usize>()
        );
        Ok(Self { categories })
    }

    /// The built-in catalog
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(get_test_definitions())
    }

    /// Load a custom catalog from a TOML, YAML or JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {:?}", path))?;

        let file: CatalogFile = ConfigFormat::from_path(path)?
            .deserialize(&content)
            .with_context(|| format!("Invalid catalog file: {:?}", path))?;

        let categories = file
            .categories
            .into_iter()
            .map(Category::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(categories)?)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn total_tests(&self) -> usize {
        self.categories.iter().map(|c| c.tests.len()).sum()
    }

    /// Ordered (category, test) pairs in execution order
    pub fn iter_tests(&self) -> impl Iterator<Item = (&Category, &TestDefinition)> {
        self.categories
            .iter()
            .flat_map(|c| c.tests.iter().map(move |t| (c, t)))
    }

    /// Fresh zeroed stats, one per category
    pub fn initial_stats(&self) -> BTreeMap<String, CategoryStat> {
        self.categories
            .iter()
            .map(|c| {
                (
                    c.id.clone(),
                    CategoryStat::new(c.tests.len() as u32, c.weight, c.layer),
                )
            })
            .collect()
    }

    /// Categories assigned to one layer
    pub fn layer_categories(&self, layer: Layer) -> Vec<&Category> {
        self.categories
            .iter()
            .filter(|c| c.layer == layer)
            .collect()
    }

    pub fn to_toml(&self) -> Result<String> {
        let export = CatalogExport {
            categories: &self.categories,
        };
        toml::to_string_pretty(&export).context("Failed to serialize catalog")
    }
}

/// Check id uniqueness, weights and that no category is empty
pub fn validate(categories: &[Category]) -> Result<(), CatalogError> {
    if categories.is_empty() {
        return Err(CatalogError::Empty);
    }

    let mut category_ids: HashSet<&str> = HashSet::new();
    let mut test_owner: HashMap<&str, &str> = HashMap::new();

    for category in categories {
        if !category_ids.insert(category.id.as_str()) {
            return Err(CatalogError::DuplicateCategoryId(category.id.clone()));
        }

        if !(category.weight.is_finite() && category.weight > 0.0) {
            return Err(CatalogError::InvalidWeight {
                category: category.id.clone(),
                weight: category.weight,
            });
        }

        if category.tests.is_empty() {
            return Err(CatalogError::EmptyCategory(category.id.clone()));
        }

        for test in &category.tests {
            if let Some(first) = test_owner.insert(test.id.as_str(), category.id.as_str()) {
                return Err(CatalogError::DuplicateTestId {
                    id: test.id.clone(),
                    first: first.to_string(),
                    second: category.id.clone(),
                });
            }
        }
    }

    Ok(())
}

fn category(id: &str, icon: &str, title: &str, layer: Layer, weight: f64, tests: Vec<TestDefinition>) -> Category {
    Category {
        id: id.to_string(),
        title: title.to_string(),
        icon: icon.to_string(),
        layer,
        weight,
        tests,
    }
}

/// Built-in test definitions, in execution order
pub fn get_test_definitions() -> Vec<Category> {
    use TestMethod::*;
    let t = TestDefinition::new;

    vec![
        // DNS level (network blocking)
        category("dns-ads-core", "🎯", "Core Ad Networks (DNS)", Layer::Dns, 1.5, vec![
            t("dns-001", "Google AdSense", "pagead2.googlesyndication.com", Dns, true),
            t("dns-002", "DoubleClick", "doubleclick.net", Dns, true),
            t("dns-003", "Google Ads", "googleads.g.doubleclick.net", Dns, true),
            t("dns-004", "AdColony", "ads30.adcolony.com", Dns, true),
            t("dns-005", "Criteo", "static.criteo.net", Dns, true),
            t("dns-006", "Taboola", "cdn.taboola.com", Dns, true),
            t("dns-007", "Outbrain", "widgets.outbrain.com", Dns, true),
        ]),
        category("dns-trackers-core", "📡", "Core Trackers (DNS)", Layer::Dns, 1.4, vec![
            t("dns-101", "Google Analytics", "google-analytics.com", Dns, true),
            t("dns-102", "Google Tag Manager", "googletagmanager.com", Dns, true),
            t("dns-103", "Facebook Pixel", "connect.facebook.net", Dns, true),
            t("dns-104", "Hotjar", "static.hotjar.com", Dns, true),
            t("dns-105", "Mixpanel", "cdn.mxpnl.com", Dns, true),
            t("dns-106", "Amplitude", "cdn.amplitude.com", Dns, false),
        ]),
        category("dns-social-trackers", "🐦", "Social Media Trackers (DNS)", Layer::Dns, 1.2, vec![
            t("dns-201", "Twitter Analytics", "analytics.twitter.com", Dns, false),
            t("dns-202", "LinkedIn Insight", "px.ads.linkedin.com", Dns, false),
            t("dns-203", "TikTok Pixel", "analytics.tiktok.com", Dns, false),
            t("dns-204", "Pinterest Tag", "ct.pinterest.com", Dns, false),
            t("dns-205", "Reddit Pixel", "alb.reddit.com", Dns, false),
        ]),
        // Browser level (client-side blocking)
        category("browser-dom-ads", "🌐", "DOM-based Ads (Browser)", Layer::Browser, 1.3, vec![
            t("browser-001", "Ad Element Detection", "local-ad-element", DomBait, true),
            t("browser-002", "Banner Ad Class", "local-banner-class", DomBait, true),
            t("browser-003", "Sponsored Content", "local-sponsored", DomBait, false),
            t("browser-004", "Ad Placeholder", "local-ad-placeholder", DomBait, false),
        ]),
        category("browser-scripts", "⚙️", "Script-based Tracking (Browser)", Layer::Browser, 1.2, vec![
            t("browser-101", "Inline Analytics Script", "local-analytics-inline", ScriptInjection, false),
            t("browser-102", "Third-party Loader", "local-3p-loader", ScriptInjection, false),
            t("browser-103", "Tracking Pixel Script", "local-pixel-script", ScriptInjection, false),
        ]),
        // CNAME cloaking
        category("cname-first-party", "🧬", "CNAME Cloaking Detection", Layer::Cname, 1.5, vec![
            t("cname-001", "First-party Analytics", "analytics.example.com", Cname, true),
            t("cname-002", "Metrics Subdomain", "metrics.website.com", Cname, true),
            t("cname-003", "Data Collection Subdomain", "data.domain.com", Cname, true),
            t("cname-004", "CDN-masked Tracker", "cdn-analytics.site.com", Cname, true),
            t("cname-005", "Tracking Subdomain", "track.yoursite.com", Cname, false),
        ]),
        // Advanced tracking
        category("fingerprinting", "🧩", "Browser Fingerprinting", Layer::Advanced, 1.4, vec![
            t("fp-001", "Canvas Fingerprint", "local-canvas-fp", CanvasApi, true),
            t("fp-002", "WebGL Fingerprint", "local-webgl-fp", WebGlApi, true),
            t("fp-003", "Audio Context Fingerprint", "local-audio-fp", AudioApi, true),
            t("fp-004", "Font Enumeration", "local-font-fp", FontApi, false),
            t("fp-005", "Screen Resolution Tracking", "local-screen-fp", ScreenApi, false),
            t("fp-006", "Hardware Concurrency", "local-hardware-fp", NavigatorApi, false),
            t("fp-007", "WebRTC IP Leak", "local-webrtc-fp", WebRtcApi, true),
        ]),
        category("advanced-tracking", "🎭", "Advanced Tracking Methods", Layer::Advanced, 1.3, vec![
            t("adv-001", "Service Worker Tracking", "local-sw-track", ServiceWorker, true),
            t("adv-002", "WebSocket Tracker", "wss://track.example.com", WebSocket, false),
            t("adv-003", "Beacon API", "local-beacon-track", BeaconApi, false),
            t("adv-004", "IndexedDB Tracking", "local-idb-track", IndexedDb, false),
            t("adv-005", "LocalStorage Fingerprint", "local-storage-fp", LocalStorage, false),
            t("adv-006", "HTTP ETags", "local-etag-track", HttpEtags, false),
        ]),
        // Additional categories
        category("cdn-trackers", "🌍", "CDN-based Trackers", Layer::Dns, 1.0, vec![
            t("cdn-001", "Cloudflare Insights", "static.cloudflareinsights.com", Cdn, false),
            t("cdn-002", "Akamai Analytics", "akamaihd.net", Cdn, false),
        ]),
        category("email-trackers", "📧", "Email Tracking", Layer::Dns, 0.9, vec![
            t("email-001", "Mailchimp Tracking", "mailchimp.com", Pixel, false),
            t("email-002", "SendGrid Tracking", "sendgrid.net", Pixel, false),
        ]),
        category("anti-adblock", "🧱", "Anti-Adblock Detection", Layer::Browser, 1.1, vec![
            t("anti-001", "BlockAdBlock Script", "blockadblock.js", Script, false),
            t("anti-002", "FuckAdBlock", "fuckadblock.js", Script, false),
            t("anti-003", "Admiral Anti-Adblock", "getadmiral.com", Script, false),
        ]),
    ]
}
