// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Ensemble Detection
 * Decides whether DNS filtering and browser ad blocking are active by
 * polling independent, individually unreliable signals and applying a
 * quorum rule
 *
 * - DNS filtering: majority of a small homogeneous set
 * - Browser ad blocking: any single positive signal
 * - Provider label: best-effort inference, never asserted
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::errors::ProbeError;
use crate::probes::{DetectionSignal, Probe, SignalKind};
use crate::types::DetectionResult;

/// Minimum positive votes for an ensemble to declare a capability active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quorum {
    /// `positive >= ceil(total * ratio)`
    Ratio(f64),
    /// `positive >= count`
    AtLeast(usize),
}

impl Quorum {
    pub fn required(&self, total: usize) -> usize {
        match *self {
            Quorum::Ratio(ratio) => (total as f64 * ratio).ceil() as usize,
            Quorum::AtLeast(count) => count,
        }
    }

    /// An empty ensemble is never active
    pub fn is_met(&self, positive: usize, total: usize) -> bool {
        total > 0 && positive >= self.required(total).max(1)
    }
}

/// Tally of one ensemble run
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleVerdict {
    pub active: bool,
    pub positive: usize,
    pub total: usize,
    /// (vote label, counted vote) in input order
    pub votes: Vec<(String, bool)>,
}

/// Await every vote concurrently and apply the quorum. Failed votes count
/// as negative; errors never propagate.
pub async fn tally<F>(quorum: Quorum, votes: Vec<(String, F)>) -> EnsembleVerdict
where
    F: Future<Output = Result<bool, ProbeError>>,
{
    let (labels, futures): (Vec<String>, Vec<F>) = votes.into_iter().unzip();
    let results = join_all(futures).await;

    let votes: Vec<(String, bool)> = labels
        .into_iter()
        .zip(results)
        .map(|(label, result)| {
            let vote = match result {
                Ok(vote) => vote,
                Err(e) => {
                    debug!(signal = %label, "Vote failed, counted as negative: {}", e);
                    false
                }
            };
            (label, vote)
        })
        .collect();

    let total = votes.len();
    let positive = votes.iter().filter(|(_, vote)| *vote).count();

    EnsembleVerdict {
        active: quorum.is_met(positive, total),
        positive,
        total,
        votes,
    }
}

/// Run a fixed signal set through a probe as one ensemble
pub async fn run_ensemble(
    probe: &dyn Probe,
    signals: &[DetectionSignal],
    quorum: Quorum,
) -> EnsembleVerdict {
    let votes = signals
        .iter()
        .map(|signal| (signal.id.clone(), probe.signal(signal)))
        .collect();
    tally(quorum, votes).await
}

/// Network-level votes: well-known ad hosts and script paths
pub fn dns_signals() -> Vec<DetectionSignal> {
    vec![
        DetectionSignal::new("dns-adsense", SignalKind::DnsBlock, "pagead2.googlesyndication.com/pagead/js/adsbygoogle.js"),
        DetectionSignal::new("dns-doubleclick", SignalKind::DnsBlock, "doubleclick.net/instream/ad_status.js"),
        DetectionSignal::new("dns-criteo", SignalKind::DnsBlock, "static.criteo.net/js/ld/ld.js"),
        DetectionSignal::new("dns-googleads", SignalKind::DnsBlock, "googleads.g.doubleclick.net/pagead/id"),
    ]
}

/// Page-level votes: bait elements, cosmetic filtering and request blocking
pub fn browser_signals() -> Vec<DetectionSignal> {
    vec![
        DetectionSignal::new("bait-element", SignalKind::BaitElement, "ad_banner_300x250"),
        DetectionSignal::new("ad-classes", SignalKind::AdClasses, "adsbox ad-banner adsbygoogle pub_300x250"),
        DetectionSignal::new("known-ad-domains", SignalKind::KnownAdDomains, "pagead2.googlesyndication.com"),
        DetectionSignal::new("ublock-signature", SignalKind::UblockSignature, "googleads.g.doubleclick.net/pagead/ads"),
        DetectionSignal::new("dom-modification", SignalKind::DomModification, "adsbygoogle"),
        DetectionSignal::new("computed-style", SignalKind::ComputedStyle, "google_ads_iframe_test"),
        DetectionSignal::new("multiple-baits", SignalKind::MultipleBaits, "ad-slot banner_ad sponsor-box"),
        DetectionSignal::new("script-block", SignalKind::ScriptBlock, "pagead2.googlesyndication.com/pagead/js/adsbygoogle.js"),
        DetectionSignal::new("css-injection", SignalKind::CssInjection, "ad-test-css-injection"),
        DetectionSignal::new("resource-timing", SignalKind::ResourceTiming, "pagead2.googlesyndication.com/pagead/show_ads.js"),
    ]
}

const PROVIDER_NONE: &str = "No DNS Filtering Detected";
const PROVIDER_GENERIC: &str = "DNS Filtering Active (Pi-hole / AdGuard / NextDNS / Custom)";

pub struct Detector {
    dns_quorum: Quorum,
    browser_quorum: Quorum,
    dns_signals: Vec<DetectionSignal>,
    browser_signals: Vec<DetectionSignal>,
}

impl Detector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            dns_quorum: Quorum::Ratio(config.dns_quorum_ratio),
            browser_quorum: Quorum::AtLeast(config.browser_quorum_min),
            dns_signals: dns_signals(),
            browser_signals: browser_signals(),
        }
    }

    /// Run both ensembles, then infer a provider label if DNS filtering is on
    pub async fn detect(&self, probe: &dyn Probe) -> DetectionResult {
        let dns = run_ensemble(probe, &self.dns_signals, self.dns_quorum).await;
        info!(
            "DNS filtering: {} ({}/{} signals)",
            if dns.active { "ACTIVE" } else { "INACTIVE" },
            dns.positive,
            dns.total
        );

        let browser = run_ensemble(probe, &self.browser_signals, self.browser_quorum).await;
        info!(
            "Browser ad blocking: {} ({}/{} signals)",
            if browser.active { "ACTIVE" } else { "INACTIVE" },
            browser.positive,
            browser.total
        );

        let dns_provider = if dns.active {
            infer_provider(probe).await
        } else {
            PROVIDER_NONE.to_string()
        };

        DetectionResult {
            dns_filtering_active: dns.active,
            browser_ad_block_active: browser.active,
            dns_provider,
        }
    }
}

/// Match blocking patterns typical of common resolvers. Purely a hint.
pub async fn infer_provider(probe: &dyn Probe) -> String {
    let pihole = vec![DetectionSignal::new("provider-pihole", SignalKind::DnsBlock, "doubleclick.net")];
    let adguard = vec![
        DetectionSignal::new("provider-adguard-adservice", SignalKind::DnsBlock, "adservice.google.com"),
        DetectionSignal::new("provider-adguard-pagead", SignalKind::DnsBlock, "pagead2.googlesyndication.com"),
        DetectionSignal::new("provider-adguard-youtube", SignalKind::DnsBlock, "ads.youtube.com"),
    ];
    let nextdns = vec![DetectionSignal::new("provider-nextdns", SignalKind::DnsBlock, "analytics.example.com")];

    let (pihole, adguard, nextdns) = futures::join!(
        run_ensemble(probe, &pihole, Quorum::AtLeast(1)),
        run_ensemble(probe, &adguard, Quorum::Ratio(1.0)),
        run_ensemble(probe, &nextdns, Quorum::AtLeast(1)),
    );

    let label = if pihole.active {
        "DNS Filtering Active (likely Pi-hole or Unbound)"
    } else if adguard.active {
        "DNS Filtering Active (likely AdGuard Home)"
    } else if nextdns.active {
        "DNS Filtering Active (likely NextDNS)"
    } else {
        PROVIDER_GENERIC
    };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::ScriptedProbe;
    use std::time::Duration;

    fn votes(pattern: &[Option<bool>]) -> Vec<(String, impl Future<Output = Result<bool, ProbeError>>)> {
        pattern
            .iter()
            .enumerate()
            .map(|(i, vote)| {
                let vote = *vote;
                (format!("v{}", i), async move {
                    vote.ok_or_else(|| ProbeError::Other("boom".into()))
                })
            })
            .collect()
    }

    #[test]
    fn test_quorum_required() {
        assert_eq!(Quorum::Ratio(0.5).required(4), 2);
        assert_eq!(Quorum::Ratio(0.5).required(3), 2);
        assert_eq!(Quorum::Ratio(1.0).required(3), 3);
        assert_eq!(Quorum::AtLeast(1).required(10), 1);
        assert!(!Quorum::Ratio(0.5).is_met(0, 0));
        assert!(!Quorum::AtLeast(0).is_met(0, 5));
    }

    #[tokio::test]
    async fn test_dns_majority_two_of_four_is_active() {
        let verdict = tally(Quorum::Ratio(0.5), votes(&[Some(true), Some(true), Some(false), Some(false)])).await;
        assert!(verdict.active);
        assert_eq!((verdict.positive, verdict.total), (2, 4));
    }

    #[tokio::test]
    async fn test_dns_majority_one_of_four_is_inactive() {
        let verdict = tally(Quorum::Ratio(0.5), votes(&[Some(true), Some(false), Some(false), Some(false)])).await;
        assert!(!verdict.active);
    }

    #[tokio::test]
    async fn test_browser_single_positive_of_ten_is_active() {
        let mut pattern = vec![Some(false); 10];
        pattern[7] = Some(true);
        let verdict = tally(Quorum::AtLeast(1), votes(&pattern)).await;
        assert!(verdict.active);
        assert_eq!(verdict.positive, 1);

        let verdict = tally(Quorum::AtLeast(1), votes(&[Some(false); 10])).await;
        assert!(!verdict.active);
    }

    #[tokio::test]
    async fn test_errors_count_as_negative_votes() {
        let verdict = tally(Quorum::Ratio(0.5), votes(&[Some(true), None, None, None])).await;
        assert!(!verdict.active);
        assert_eq!(verdict.votes[1], ("v1".to_string(), false));

        let verdict = tally(Quorum::AtLeast(1), votes(&[None; 10])).await;
        assert!(!verdict.active);
    }

    #[tokio::test]
    async fn test_signals_are_polled_concurrently() {
        let probe = ScriptedProbe::new().with_latency(Duration::from_millis(20));
        let verdict = run_ensemble(&probe, &browser_signals(), Quorum::AtLeast(1)).await;
        assert_eq!(verdict.total, 10);
        assert!(!verdict.active);
        assert_eq!(probe.peak_concurrency(), 10);
    }

    #[tokio::test]
    async fn test_detect_infers_pihole_first() {
        let probe = ScriptedProbe::new()
            .with_signal("dns-adsense", true)
            .with_signal("dns-doubleclick", true)
            .with_signal("provider-pihole", true)
            .with_signal("provider-nextdns", true)
            .with_signal("script-block", true);

        let detection = Detector::new(&DetectionConfig::default()).detect(&probe).await;
        assert!(detection.dns_filtering_active);
        assert!(detection.browser_ad_block_active);
        assert_eq!(
            detection.dns_provider,
            "DNS Filtering Active (likely Pi-hole or Unbound)"
        );
    }

    #[tokio::test]
    async fn test_provider_requires_every_adguard_host() {
        let partial = ScriptedProbe::new()
            .with_signal("provider-adguard-adservice", true)
            .with_signal("provider-adguard-pagead", true);
        assert_eq!(infer_provider(&partial).await, PROVIDER_GENERIC);

        let full = partial.with_signal("provider-adguard-youtube", true);
        assert_eq!(
            infer_provider(&full).await,
            "DNS Filtering Active (likely AdGuard Home)"
        );
    }

    #[tokio::test]
    async fn test_inactive_dns_skips_provider_inference() {
        let probe = ScriptedProbe::new().with_signal("provider-pihole", true);
        let detection = Detector::new(&DetectionConfig::default()).detect(&probe).await;
        assert!(!detection.dns_filtering_active);
        assert_eq!(detection.dns_provider, PROVIDER_NONE);
        assert!(!probe.calls().iter().any(|c| c.starts_with("provider-")));
    }
}
