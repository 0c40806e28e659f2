// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Configuration Tests
 * File loading in every supported format, validation failures and saving
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use adblock_audit::catalog::Catalog;
use adblock_audit::config::{AuditConfig, ConfigLoader};
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_toml_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "audit.toml",
        r#"
[engine]
inter_test_delay_ms = 0

[probe]
timeout_ms = 1500
sinkhole_addresses = ["192.0.2.10"]

[detection]
browser_quorum_min = 2
"#,
    );

    let config = ConfigLoader::new(&path).unwrap().load_config().unwrap();

    assert_eq!(config.engine.inter_test_delay_ms, 0);
    assert_eq!(config.probe.timeout_ms, 1500);
    assert_eq!(config.probe.sinkhole_addresses, vec!["192.0.2.10"]);
    assert_eq!(config.detection.browser_quorum_min, 2);
    assert_eq!(config.probe.scheme, "https");
}

#[test]
fn test_load_json_and_yaml_configs() {
    let dir = tempfile::tempdir().unwrap();

    let json = write(
        &dir,
        "audit.json",
        r#"{ "detection": { "dns_quorum_ratio": 0.75 }, "observability": { "log_level": "debug" } }"#,
    );
    let config = ConfigLoader::new(&json).unwrap().load_config().unwrap();
    assert!((config.detection.dns_quorum_ratio - 0.75).abs() < f64::EPSILON);

    let yaml = write(
        &dir,
        "audit.yaml",
        "probe:\n  scheme: http\n  etag_origin: \"https://example.com/\"\n",
    );
    let config = ConfigLoader::new(&yaml).unwrap().load_config().unwrap();
    assert_eq!(config.probe.scheme, "http");
    assert_eq!(config.probe.etag_origin.as_deref(), Some("https://example.com/"));
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let cases = [
        ("delay.toml", "[engine]\ninter_test_delay_ms = 20000\n"),
        ("quorum.toml", "[detection]\nbrowser_quorum_min = 0\n"),
        ("sinkhole.toml", "[probe]\nsinkhole_addresses = [\"not-an-ip\"]\n"),
        ("scheme.toml", "[probe]\nscheme = \"ftp\"\n"),
        ("broken.toml", "[engine\n"),
    ];

    for (name, content) in cases {
        let path = write(&dir, name, content);
        assert!(
            ConfigLoader::new(&path).unwrap().load_config().is_err(),
            "{} should fail",
            name
        );
    }
}

#[test]
fn test_uppercase_extensions_load_everywhere() {
    let dir = tempfile::tempdir().unwrap();

    let config = write(&dir, "AUDIT.TOML", "[engine]\ninter_test_delay_ms = 40\n");
    let loaded = ConfigLoader::new(&config).unwrap().load_config().unwrap();
    assert_eq!(loaded.engine.inter_test_delay_ms, 40);

    let catalog = write(
        &dir,
        "catalog.Yml",
        "categories:\n  - { id: c, title: C, layer: dns, weight: 1.0, tests: [ { id: c-1, name: C, target: c.test, method: DNS } ] }\n",
    );
    assert_eq!(Catalog::from_path(&catalog).unwrap().total_tests(), 1);
}

#[test]
fn test_unsupported_extension_and_missing_file() {
    assert!(ConfigLoader::new("audit.ini").is_err());

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    assert!(ConfigLoader::new(&missing).unwrap().load_config().is_err());
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.yaml");

    let mut config = AuditConfig::default();
    config.engine.inter_test_delay_ms = 250;
    config.catalog_path = Some(PathBuf::from("catalog.toml"));

    let loader = ConfigLoader::new(&path).unwrap();
    loader.save_config(&config).unwrap();
    let loaded = loader.load_config().unwrap();

    assert_eq!(loaded.engine.inter_test_delay_ms, 250);
    assert_eq!(loaded.catalog_path, Some(PathBuf::from("catalog.toml")));
}

#[test]
fn test_custom_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "catalog.yaml",
        r#"
categories:
  - id: home-dns
    title: Home DNS
    layer: dns
    weight: 1.0
    tests:
      - id: home-1
        name: Ad host
        target: ads.example.net
        method: DNS
        critical: true
      - id: home-2
        name: Smoke signal
        target: hill.example.net
        method: Smoke Signal
"#,
    );

    let catalog = Catalog::from_path(&path).unwrap();
    assert_eq!(catalog.total_tests(), 2);
    let (_, odd) = catalog.iter_tests().nth(1).unwrap();
    assert!(!odd.method.is_recognized());
    assert!(!odd.critical);

    let duplicate = write(
        &dir,
        "dup.json",
        r#"{ "categories": [
            { "id": "a", "title": "A", "layer": "dns", "weight": 1.0,
              "tests": [ { "id": "x", "name": "X", "target": "x.test", "method": "DNS" } ] },
            { "id": "b", "title": "B", "layer": "dns", "weight": 1.0,
              "tests": [ { "id": "x", "name": "X", "target": "y.test", "method": "DNS" } ] }
        ] }"#,
    );
    let err = Catalog::from_path(&duplicate).unwrap_err();
    assert!(format!("{:#}", err).contains("x"));
}
