// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Audit Execution Engine
 * Drives the catalog through a probe one test at a time and keeps live
 * statistics, scores and progress
 *
 * Run lifecycle: idle -> detection -> executing -> finalizing -> idle
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod context;

pub use context::{ProgressEvent, ProgressUpdate, RunContext, RunPhase};

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::AuditConfig;
use crate::detection::Detector;
use crate::errors::{AuditError, AuditResult};
use crate::probes::{Probe, ProbeOutcome};
use crate::recommendations::{recommend, suggest_blocklists};
use crate::types::{AuditReport, BlockType, Category, RunSummary, Scores, TestDefinition, TestResult};

pub struct AuditEngine {
    catalog: Arc<Catalog>,
    probe: Arc<dyn Probe>,
    detector: Detector,
    inter_test_delay: Duration,
    busy: AtomicBool,
    phase: RwLock<RunPhase>,
    scores: RwLock<Scores>,
    report: RwLock<Option<AuditReport>>,
}

/// Clears the busy flag however the run ends
struct BusyGuard<'a> {
    engine: &'a AuditEngine,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.engine.phase.write() = RunPhase::Idle;
        self.engine.busy.store(false, Ordering::SeqCst);
    }
}

impl AuditEngine {
    pub fn new(catalog: Arc<Catalog>, probe: Arc<dyn Probe>, config: &AuditConfig) -> Self {
        Self {
            catalog,
            probe,
            detector: Detector::new(&config.detection),
            inter_test_delay: config.engine.inter_test_delay(),
            busy: AtomicBool::new(false),
            phase: RwLock::new(RunPhase::Idle),
            scores: RwLock::new(Scores::default()),
            report: RwLock::new(None),
        }
    }

    /// Engine over the built-in catalog. Fails only if the catalog itself
    /// is malformed, before any run can start.
    pub fn with_builtin_catalog(probe: Arc<dyn Probe>, config: &AuditConfig) -> AuditResult<Self> {
        let catalog = Catalog::builtin()?;
        Ok(Self::new(Arc::new(catalog), probe, config))
    }

    pub fn with_inter_test_delay(mut self, delay: Duration) -> Self {
        self.inter_test_delay = delay;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// True while a run is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> RunPhase {
        *self.phase.read()
    }

    /// Latest published scores (live during a run, frozen afterwards)
    pub fn scores(&self) -> Scores {
        *self.scores.read()
    }

    /// Report of the last completed run
    pub fn report(&self) -> Option<AuditReport> {
        self.report.read().clone()
    }

    fn try_acquire(&self) -> AuditResult<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| AuditError::Busy)?;
        Ok(BusyGuard { engine: self })
    }

    fn enter_phase(
        &self,
        ctx: &RunContext,
        phase: RunPhase,
        progress: Option<&mpsc::UnboundedSender<ProgressEvent>>,
    ) {
        *self.phase.write() = phase;
        debug!("Run {} entering {} phase", ctx.run_id, phase);
        emit(
            progress,
            ProgressEvent::Phase {
                run_id: ctx.run_id.clone(),
                phase,
            },
        );
    }

    /// Execute one full run. Probe failures never abort the run; the only
    /// error is `AuditError::Busy` when another run is already in flight.
    pub async fn run_all(
        &self,
        progress: Option<mpsc::UnboundedSender<ProgressEvent>>,
    ) -> AuditResult<AuditReport> {
        let _guard = self.try_acquire()?;
        let progress = progress.as_ref();

        let started_at = Utc::now();
        let mut ctx = RunContext::new(Uuid::new_v4().to_string(), &self.catalog);
        *self.scores.write() = ctx.scores;

        info!(
            "Starting audit run {} ({} tests, probe: {})",
            ctx.run_id,
            ctx.total,
            self.probe.name()
        );

        self.enter_phase(&ctx, RunPhase::Detection, progress);
        let detection = self.detector.detect(self.probe.as_ref()).await;
        info!("Detected: {}", detection.dns_provider);

        self.enter_phase(&ctx, RunPhase::Executing, progress);
        let mut first = true;
        for (category, test) in self.catalog.iter_tests() {
            if !first && !self.inter_test_delay.is_zero() {
                tokio::time::sleep(self.inter_test_delay).await;
            }
            first = false;

            let result = self.execute(category, test).await;
            let update = ctx.record(result);
            *self.scores.write() = update.scores;
            emit(progress, ProgressEvent::Test(Box::new(update)));
        }

        self.enter_phase(&ctx, RunPhase::Finalizing, progress);
        let scores = ctx.scores;
        let recommendations = recommend(&detection, &scores);
        let blocklists = suggest_blocklists(&scores);
        let finished_at = Utc::now();

        let report = AuditReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            run_id: ctx.run_id.clone(),
            started_at: started_at.to_rfc3339(),
            finished_at: finished_at.to_rfc3339(),
            execution_time_secs: ctx.started.elapsed().as_secs_f64(),
            detection,
            scores,
            summary: RunSummary::from_counts(ctx.total as u32, ctx.blocked, ctx.allowed),
            metadata: ctx.metadata,
            category_stats: ctx.stats,
            test_results: ctx.results,
            recommendations,
            blocklists,
        };

        info!(
            "Audit run {} complete: global {}/100, {} blocked, {} allowed ({})",
            report.run_id,
            report.scores.global,
            report.summary.blocked,
            report.summary.allowed,
            report.summary.block_rate
        );

        *self.scores.write() = scores;
        *self.report.write() = Some(report.clone());

        Ok(report)
    }

    /// Run one test through the probe and classify the outcome
    async fn execute(&self, category: &Category, test: &TestDefinition) -> TestResult {
        let layer = category.layer;
        let start = Instant::now();

        let outcome = if !test.method.is_recognized() {
            warn!(
                test_id = %test.id,
                "Unsupported test method '{}', counting as allowed",
                test.method
            );
            ProbeOutcome::unsupported(&test.method)
        } else {
            match self.probe.run(&test.method, &test.target).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(test_id = %test.id, "Probe raised for {}: {}", test.target, e);
                    ProbeOutcome::blocked(BlockType::Exception, e.to_string())
                }
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        debug!(
            test_id = %test.id,
            layer = %layer,
            blocked = outcome.blocked,
            elapsed_ms,
            "{} -> {}",
            test.name,
            outcome.block_type
        );

        TestResult {
            id: test.id.clone(),
            category_id: category.id.clone(),
            name: test.name.clone(),
            target: test.target.clone(),
            method: test.method.clone(),
            layer,
            blocked: outcome.blocked,
            block_type: outcome.block_type,
            error: outcome.error,
            execution_time_ms: elapsed_ms,
            critical: test.critical,
        }
    }
}

fn emit(progress: Option<&mpsc::UnboundedSender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = progress {
        // A dropped receiver only means nobody is watching
        let _ = tx.send(event);
    }
}
