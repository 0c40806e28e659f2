// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * adblock-audit - Ad & Tracker Blocking Effectiveness Auditor
 * Standalone CLI
 *
 * Features:
 * - DNS filtering and browser ad-block detection
 * - 50 declarative tests across four defensive layers
 * - Weighted multi-layer scoring with remediation advice
 * - JSON (technical), text (simple) and HTML (styled) reports
 * - Replay of browser-captured verdicts from fixture files
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use adblock_audit::catalog::Catalog;
use adblock_audit::config::{load_config, AuditConfig, ConfigValidator};
use adblock_audit::engine::{AuditEngine, ProgressEvent};
use adblock_audit::probes::{NetworkProbe, Probe, ScriptedProbe};
use adblock_audit::reporting::{ReportConfig, ReportEngine, ReportFormat};
use adblock_audit::scoring::ScoreLabel;
use adblock_audit::types::{AuditReport, Layer};

/// adblock-audit - measure how well ads and trackers are blocked
#[derive(Parser)]
#[command(name = "adblock-audit")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Audits DNS filtering and ad blocking across four defensive layers.", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - only show the final summary
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "AUDIT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full audit
    Run {
        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replay verdicts from a fixture file instead of probing the network
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Include per-test technical detail in text reports
        #[arg(long)]
        audit: bool,

        /// Delay between tests in milliseconds (0-10000)
        #[arg(long, value_parser = clap::value_parser!(u64).range(..=10_000))]
        delay_ms: Option<u64>,

        /// Custom catalog file (TOML, YAML or JSON)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// List catalog categories and tests
    List {
        /// Show every test
        #[arg(short, long)]
        verbose: bool,

        /// Filter by layer (dns, browser, cname, advanced)
        #[arg(short, long)]
        layer: Option<Layer>,

        /// Custom catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Export the catalog as TOML to this path
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Validate configuration and catalog without running
    Validate {
        /// Custom catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Generate sample configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "adblock-audit.toml")]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
    Html,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Html => ReportFormat::Html,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let level = if cli.debug {
        "debug".to_string()
    } else if cli.verbose {
        "info".to_string()
    } else if cli.quiet {
        "error".to_string()
    } else {
        config.observability.log_level.clone()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("adblock-audit")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli, config))
}

async fn async_main(cli: Cli, config: AuditConfig) -> Result<()> {
    match cli.command {
        Commands::Run {
            format,
            output,
            fixture,
            audit,
            delay_ms,
            catalog,
        } => {
            let mut config = config;
            if let Some(delay) = delay_ms {
                config.engine.inter_test_delay_ms = delay;
                ConfigValidator::validate(&config)?;
            }
            let catalog = match catalog.or_else(|| config.catalog_path.clone()) {
                Some(path) => {
                    info!("Loading catalog from {:?}", path);
                    Some(Catalog::from_path(path)?)
                }
                None => None,
            };
            let report_config = ReportConfig {
                format: format.into(),
                audit_mode: audit,
            };
            run_audit(
                config,
                catalog,
                fixture.as_deref(),
                report_config,
                output,
                cli.quiet,
            )
            .await
        }
        Commands::List {
            verbose,
            layer,
            catalog,
            export,
        } => {
            let catalog = load_catalog(catalog.as_deref(), &config)?;
            list_catalog(&catalog, verbose, layer, export.as_deref())
        }
        Commands::Validate { catalog } => validate(&config, catalog.as_deref()),
        Commands::Init { output } => generate_config(output),
    }
}

fn load_catalog(path: Option<&Path>, config: &AuditConfig) -> Result<Catalog> {
    match path.or(config.catalog_path.as_deref()) {
        Some(path) => {
            info!("Loading catalog from {:?}", path);
            Catalog::from_path(path)
        }
        None => Ok(Catalog::builtin()?),
    }
}

async fn run_audit(
    config: AuditConfig,
    catalog: Option<Catalog>,
    fixture: Option<&Path>,
    report_config: ReportConfig,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let probe: Arc<dyn Probe> = match fixture {
        Some(path) => {
            info!("Replaying verdicts from {:?}", path);
            Arc::new(ScriptedProbe::from_path(path)?)
        }
        None => Arc::new(NetworkProbe::new(&config.probe)?),
    };

    let engine = match catalog {
        Some(catalog) => AuditEngine::new(Arc::new(catalog), probe, &config),
        None => AuditEngine::with_builtin_catalog(probe, &config)?,
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if !quiet {
                print_progress(&event);
            }
        }
    });

    let report = engine.run_all(Some(tx)).await?;
    if let Err(e) = printer.await {
        warn!("Progress printer stopped: {}", e);
    }

    let reports = ReportEngine::new();
    let rendered = reports.generate_report(&report, &report_config).await?;

    match output {
        Some(path) => reports.write_report(&rendered, &path).await?,
        None => {
            let text = String::from_utf8(rendered.data).context("Report is not valid UTF-8")?;
            println!("{}", text);
        }
    }

    print_summary(&report);
    Ok(())
}

fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::Phase { phase, .. } => eprintln!("== {} ==", phase),
        ProgressEvent::Test(update) => {
            let result = &update.result;
            eprintln!(
                "[{:>3}/{}] {:>5.1}%  {:<7} {:<32} {:<18} {:>5}ms  global {}",
                update.completed,
                update.total,
                update.percentage,
                if result.blocked { "BLOCKED" } else { "ALLOWED" },
                result.name,
                result.block_type.as_str(),
                result.execution_time_ms,
                update.scores.global
            );
        }
    }
}

fn print_summary(report: &AuditReport) {
    eprintln!("{}", "=".repeat(60));
    eprintln!("AUDIT COMPLETE");
    eprintln!("{}", "=".repeat(60));
    eprintln!(
        "Global score:       {}/100 ({})",
        report.scores.global,
        ScoreLabel::from_score(report.scores.global)
    );
    for layer in Layer::ALL {
        eprintln!(
            "{:<20}{}/100",
            format!("{}:", layer.display_name()),
            report.scores.layer(layer)
        );
    }
    eprintln!(
        "Blocked:            {}/{} ({})",
        report.summary.blocked, report.summary.total, report.summary.block_rate
    );
    eprintln!("Provider:           {}", report.detection.dns_provider);
    eprintln!("Recommendations:    {}", report.recommendations.len());
    eprintln!("Duration:           {:.2}s", report.execution_time_secs);
    eprintln!("{}", "=".repeat(60));
}

fn list_catalog(
    catalog: &Catalog,
    verbose: bool,
    layer: Option<Layer>,
    export: Option<&Path>,
) -> Result<()> {
    if let Some(path) = export {
        std::fs::write(path, catalog.to_toml()?)
            .with_context(|| format!("Failed to write catalog to {:?}", path))?;
        println!("Catalog exported to {:?}", path);
        return Ok(());
    }

    let categories = match layer {
        Some(layer) => catalog.layer_categories(layer),
        None => catalog.categories().iter().collect(),
    };

    println!("{}", "=".repeat(60));
    println!("TEST CATALOG");
    println!("{}", "=".repeat(60));
    for category in &categories {
        println!(
            "{} {:<32} {:<9} weight {:.1}  {} tests",
            category.icon,
            category.title,
            category.layer.as_str(),
            category.weight,
            category.tests.len()
        );
        if verbose {
            for test in &category.tests {
                println!(
                    "    {:<28} {:<36} {}{}",
                    test.id,
                    test.target,
                    test.method,
                    if test.critical { "  [critical]" } else { "" }
                );
            }
        }
    }
    println!("{}", "=".repeat(60));
    println!(
        "{} categories, {} tests",
        categories.len(),
        categories.iter().map(|c| c.tests.len()).sum::<usize>()
    );

    Ok(())
}

fn validate(config: &AuditConfig, catalog_path: Option<&Path>) -> Result<()> {
    ConfigValidator::validate(config)?;
    println!("Configuration: OK");

    let catalog = load_catalog(catalog_path, config)?;
    let unsupported: Vec<_> = catalog
        .iter_tests()
        .filter(|(_, test)| !test.method.is_recognized())
        .map(|(_, test)| test.id.as_str())
        .collect();

    println!(
        "Catalog: OK ({} categories, {} tests)",
        catalog.categories().len(),
        catalog.total_tests()
    );
    if !unsupported.is_empty() {
        println!(
            "Warning: {} tests use unrecognized methods and will report Unsupported: {}",
            unsupported.len(),
            unsupported.join(", ")
        );
    }

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<()> {
    let config = r#"# adblock-audit configuration

# Custom catalog (optional)
# catalog_path = "catalog.toml"

[engine]
# Pause between tests in milliseconds (0-10000)
inter_test_delay_ms = 120

[probe]
# Per-test network timeout in milliseconds
timeout_ms = 2000

# Per-vote timeout during the detection phase
detection_timeout_ms = 3000

# Scheme used for HTTP checks: http or https
scheme = "https"

# Extra IPs your resolver answers with for blocked domains.
# 0.0.0.0, :: and loopback always count as blocked.
sinkhole_addresses = []

# Origin queried by the HTTP ETag test (optional)
# etag_origin = "https://example.com/"

[detection]
# Fraction of DNS signals that must observe blocking
dns_quorum_ratio = 0.5

# Minimum number of positive browser signals
browser_quorum_min = 1

[observability]
log_level = "info"
"#;

    if output.exists() {
        return Err(anyhow::anyhow!("{:?} already exists", output));
    }

    std::fs::write(&output, config)
        .with_context(|| format!("Failed to write config to {:?}", output))?;
    println!("Configuration written to {:?}", output);

    Ok(())
}
