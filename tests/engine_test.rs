// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Audit Engine Tests
 * End-to-end runs through the scripted probe: statistics, scoring,
 * classification, busy flag, pacing and progress events
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use adblock_audit::catalog::Catalog;
use adblock_audit::config::AuditConfig;
use adblock_audit::engine::{AuditEngine, ProgressEvent, RunPhase};
use adblock_audit::errors::{AuditError, ProbeError};
use adblock_audit::probes::{DetectionSignal, Probe, ProbeOutcome, ScriptedProbe};
use adblock_audit::types::{BlockType, Category, Severity, TestDefinition, TestMethod};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn engine(probe: impl Probe + 'static, catalog: Catalog) -> AuditEngine {
    AuditEngine::new(Arc::new(catalog), Arc::new(probe), &AuditConfig::default())
        .with_inter_test_delay(Duration::ZERO)
}

fn category(id: &str, layer: &str, weight: f64, tests: Vec<TestDefinition>) -> Category {
    Category {
        id: id.to_string(),
        title: id.to_uppercase(),
        icon: String::new(),
        layer: layer.parse().unwrap(),
        weight,
        tests,
    }
}

fn small_catalog() -> Catalog {
    Catalog::new(vec![
        category(
            "ads",
            "dns",
            1.5,
            vec![
                TestDefinition::new("ads-1", "AdSense", "pagead2.googlesyndication.com", TestMethod::Dns, true),
                TestDefinition::new("ads-2", "DoubleClick", "doubleclick.net", TestMethod::Dns, true),
            ],
        ),
        category(
            "baits",
            "browser",
            1.3,
            vec![TestDefinition::new("bait-1", "Banner", "local-banner", TestMethod::DomBait, true)],
        ),
        category(
            "fp",
            "advanced",
            1.0,
            vec![TestDefinition::new("fp-1", "Canvas", "local-canvas", TestMethod::CanvasApi, false)],
        ),
    ])
    .unwrap()
}

fn blocked() -> ProbeOutcome {
    ProbeOutcome::blocked(BlockType::NetworkBlock, "NXDOMAIN")
}

/// Probe that records how many `run` calls overlap
#[derive(Default)]
struct CountingProbe {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    runs: AtomicUsize,
}

#[async_trait::async_trait]
impl Probe for CountingProbe {
    fn name(&self) -> &str {
        "counting"
    }

    async fn run(&self, _method: &TestMethod, _target: &str) -> Result<ProbeOutcome, ProbeError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(ProbeOutcome::allowed())
    }

    async fn signal(&self, _signal: &DetectionSignal) -> Result<bool, ProbeError> {
        Ok(false)
    }
}

#[tokio::test]
async fn test_every_category_completes_when_every_probe_errors() {
    let catalog = Catalog::builtin().unwrap();
    let total = catalog.total_tests();
    let engine = engine(ScriptedProbe::new(), catalog);

    let report = engine.run_all(None).await.unwrap();

    assert_eq!(report.test_results.len(), total);
    for (id, stat) in &report.category_stats {
        assert_eq!(stat.blocked + stat.allowed, stat.total, "category {}", id);
    }
    assert!(report
        .test_results
        .iter()
        .all(|r| r.blocked && r.block_type == BlockType::Exception));

    assert_eq!(report.scores.global, 100);
    assert_eq!(report.summary.block_rate, "100.00%");
    assert!(!report.detection.dns_filtering_active);
    assert!(!report.detection.browser_ad_block_active);
    assert_eq!(report.detection.dns_provider, "No DNS Filtering Detected");

    let criticals: Vec<_> = report
        .recommendations
        .iter()
        .filter(|r| r.severity == Severity::Critical)
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(
        criticals,
        vec!["No DNS Filtering Detected", "No Browser Ad Blocker Detected"]
    );
}

#[tokio::test]
async fn test_scores_and_metadata_follow_outcomes() {
    let probe = ScriptedProbe::new()
        .with_outcome("pagead2.googlesyndication.com", blocked())
        .with_outcome("doubleclick.net", ProbeOutcome::allowed())
        .with_outcome(
            "local-banner",
            ProbeOutcome::blocked(BlockType::BrowserDomBlock, "Element hidden"),
        )
        .with_outcome("local-canvas", ProbeOutcome::allowed())
        .with_signal("dns-adsense", true)
        .with_signal("dns-doubleclick", true)
        .with_signal("bait-element", true);
    let engine = engine(probe, small_catalog());

    let report = engine.run_all(None).await.unwrap();

    assert_eq!(report.scores.dns, 50);
    assert_eq!(report.scores.browser, 100);
    assert_eq!(report.scores.cname, 0);
    assert_eq!(report.scores.advanced, 0);
    // (50 * 2.0 + 100 * 1.5) / 6.0 = 41.67
    assert_eq!(report.scores.global, 42);
    for score in [
        report.scores.global,
        report.scores.dns,
        report.scores.browser,
        report.scores.cname,
        report.scores.advanced,
    ] {
        assert!(score <= 100);
    }

    assert_eq!(report.metadata.blocked_by_dns, vec!["ads-1"]);
    assert_eq!(report.metadata.blocked_by_browser, vec!["bait-1"]);
    assert_eq!(report.metadata.allowed_through, vec!["ads-2", "fp-1"]);
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.blocked, 2);
    assert_eq!(report.summary.block_rate, "50.00%");

    assert!(report.detection.dns_filtering_active);
    assert!(report.detection.browser_ad_block_active);
    assert_eq!(
        report.detection.dns_provider,
        "DNS Filtering Active (Pi-hole / AdGuard / NextDNS / Custom)"
    );
    assert!(!report
        .recommendations
        .iter()
        .any(|r| r.severity == Severity::Critical));

    assert_eq!(engine.report(), Some(report.clone()));
    assert_eq!(engine.scores(), report.scores);
}

#[tokio::test]
async fn test_unrecognized_method_never_reaches_probe() {
    let catalog = Catalog::new(vec![category(
        "custom",
        "dns",
        1.0,
        vec![
            TestDefinition::new("known", "Known", "known.test", TestMethod::Dns, false),
            TestDefinition::new("odd", "Odd", "odd.test", TestMethod::from("Carrier Pigeon"), false),
        ],
    )])
    .unwrap();
    let probe = Arc::new(ScriptedProbe::new().with_outcome("known.test", blocked()));
    let engine = AuditEngine::new(Arc::new(catalog), probe.clone(), &AuditConfig::default())
        .with_inter_test_delay(Duration::ZERO);

    let report = engine.run_all(None).await.unwrap();

    let odd = report.test_results.iter().find(|r| r.id == "odd").unwrap();
    assert!(!odd.blocked);
    assert_eq!(odd.block_type, BlockType::Unsupported);
    assert_eq!(report.metadata.allowed_through, vec!["odd"]);
    assert!(probe.calls().contains(&"known.test".to_string()));
    assert!(!probe.calls().contains(&"odd.test".to_string()));
}

#[tokio::test]
async fn test_concurrent_run_is_rejected_while_busy() {
    let probe = ScriptedProbe::new().with_latency(Duration::from_millis(20));
    let engine = Arc::new(engine(probe, small_catalog()));

    let first = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run_all(None).await })
    };
    while !engine.is_busy() {
        tokio::task::yield_now().await;
    }

    assert!(matches!(engine.run_all(None).await, Err(AuditError::Busy)));

    let report = first.await.unwrap().unwrap();
    assert_eq!(report.test_results.len(), 4);
    assert!(!engine.is_busy());
    assert_eq!(engine.phase(), RunPhase::Idle);

    // the flag is released, so a new run goes through
    assert!(engine.run_all(None).await.is_ok());
}

#[tokio::test]
async fn test_tests_execute_strictly_sequentially() {
    let probe = Arc::new(CountingProbe::default());
    let engine = AuditEngine::new(
        Arc::new(Catalog::builtin().unwrap()),
        probe.clone(),
        &AuditConfig::default(),
    )
    .with_inter_test_delay(Duration::ZERO);

    let report = engine.run_all(None).await.unwrap();

    assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
    assert_eq!(probe.runs.load(Ordering::SeqCst), report.test_results.len());
}

#[tokio::test]
async fn test_results_follow_catalog_order() {
    let catalog = Catalog::builtin().unwrap();
    let expected: Vec<String> = catalog.iter_tests().map(|(_, t)| t.id.clone()).collect();
    let engine = engine(ScriptedProbe::new(), catalog);

    let report = engine.run_all(None).await.unwrap();
    let ids: Vec<String> = report.test_results.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_progress_events_are_monotonic() {
    let engine = engine(
        ScriptedProbe::new().with_outcome("doubleclick.net", ProbeOutcome::allowed()),
        small_catalog(),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();

    let report = engine.run_all(Some(tx)).await.unwrap();

    let mut phases = Vec::new();
    let mut updates = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Phase { phase, run_id } => {
                assert_eq!(run_id, report.run_id);
                phases.push(phase);
            }
            ProgressEvent::Test(update) => updates.push(update),
        }
    }

    assert_eq!(
        phases,
        vec![RunPhase::Detection, RunPhase::Executing, RunPhase::Finalizing]
    );
    assert_eq!(updates.len(), 4);
    for (i, update) in updates.iter().enumerate() {
        assert_eq!(update.completed, i + 1);
        assert_eq!(update.total, 4);
        assert_eq!(update.blocked + update.allowed, (i + 1) as u32);
    }
    assert!(updates
        .windows(2)
        .all(|w| w[0].percentage < w[1].percentage && w[0].elapsed_time_ms <= w[1].elapsed_time_ms));
    let last = updates.last().unwrap();
    assert!((last.percentage - 100.0).abs() < f64::EPSILON);
    assert_eq!(last.scores, report.scores);
}

#[tokio::test]
async fn test_reruns_start_from_fresh_state() {
    let probe = ScriptedProbe::new()
        .with_outcome("pagead2.googlesyndication.com", blocked())
        .with_outcome("doubleclick.net", ProbeOutcome::allowed())
        .with_outcome("local-banner", ProbeOutcome::allowed())
        .with_outcome("local-canvas", blocked());
    let engine = engine(probe, small_catalog());

    let first = engine.run_all(None).await.unwrap();
    let second = engine.run_all(None).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.scores, second.scores);
    assert_eq!(first.category_stats, second.category_stats);
    assert_eq!(first.metadata, second.metadata);
    assert_eq!(second.test_results.len(), 4);
    assert_eq!(second.summary.total, 4);
}

#[tokio::test]
async fn test_inter_test_delay_paces_the_run() {
    let catalog = Catalog::new(vec![category(
        "paced",
        "dns",
        1.0,
        (0..3)
            .map(|i| {
                TestDefinition::new(&format!("t-{}", i), "T", &format!("t{}.test", i), TestMethod::Dns, false)
            })
            .collect(),
    )])
    .unwrap();
    let engine = AuditEngine::new(
        Arc::new(catalog),
        Arc::new(ScriptedProbe::new()),
        &AuditConfig::default(),
    )
    .with_inter_test_delay(Duration::from_millis(30));

    let started = std::time::Instant::now();
    engine.run_all(None).await.unwrap();

    // two gaps between three tests
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_replayed_fixture_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
[tests]
"pagead2.googlesyndication.com" = {{ blocked = true, blockType = "DNS/NetworkBlock", error = "NXDOMAIN" }}
"doubleclick.net" = {{ blocked = true, blockType = "DNS/NetworkBlock" }}
"local-banner" = {{ blocked = true, blockType = "BrowserDOMBlock", error = "Element hidden" }}
"local-canvas" = {{ raise = "canvas unavailable" }}

[signals]
dns-adsense = true
dns-doubleclick = true
dns-criteo = false
provider-pihole = true
multiple-baits = true
"#
    )
    .unwrap();

    let probe = ScriptedProbe::from_path(file.path()).unwrap();
    let engine = engine(probe, small_catalog());
    let report = engine.run_all(None).await.unwrap();

    assert!(report.detection.dns_filtering_active);
    assert!(report.detection.browser_ad_block_active);
    assert_eq!(
        report.detection.dns_provider,
        "DNS Filtering Active (likely Pi-hole or Unbound)"
    );
    let canvas = report.test_results.iter().find(|r| r.id == "fp-1").unwrap();
    assert_eq!(canvas.block_type, BlockType::Exception);
    assert!(canvas.error.contains("canvas unavailable"));
    // no cname categories in this catalog: (100 * 2.0 + 100 * 1.5 + 100 * 1.0) / 6.0
    assert_eq!(report.scores.global, 75);
    let titles: Vec<_> = report.recommendations.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Vulnerable to CNAME Cloaking"]);
}

#[tokio::test]
async fn test_builtin_catalog_engine() {
    let engine =
        AuditEngine::with_builtin_catalog(Arc::new(ScriptedProbe::new()), &AuditConfig::default())
            .unwrap();

    assert_eq!(engine.catalog().total_tests(), 50);
    assert_eq!(engine.catalog(), &Catalog::builtin().unwrap());
    assert!(!engine.is_busy());
    assert!(engine.report().is_none());
}
