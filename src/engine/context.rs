// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::catalog::Catalog;
use crate::scoring::compute_scores;
use crate::types::{CategoryStat, RunMetadata, Scores, TestResult};

/// Run-level state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Detection,
    Executing,
    Finalizing,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Detection => "detection",
            RunPhase::Executing => "executing",
            RunPhase::Finalizing => "finalizing",
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot published after every completed test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub run_id: String,
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
    pub blocked: u32,
    pub allowed: u32,
    pub elapsed_time_ms: u64,
    pub result: TestResult,
    pub scores: Scores,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Phase { run_id: String, phase: RunPhase },
    Test(Box<ProgressUpdate>),
}

/// Mutable state of a single run. Created fresh by every `run_all`, so
/// nothing leaks from one run into the next.
pub struct RunContext {
    pub run_id: String,
    pub started: Instant,
    pub stats: BTreeMap<String, CategoryStat>,
    pub metadata: RunMetadata,
    pub results: Vec<TestResult>,
    pub scores: Scores,
    pub blocked: u32,
    pub allowed: u32,
    pub total: usize,
}

impl RunContext {
    pub fn new(run_id: String, catalog: &Catalog) -> Self {
        Self {
            run_id,
            started: Instant::now(),
            stats: catalog.initial_stats(),
            metadata: RunMetadata::default(),
            results: Vec::with_capacity(catalog.total_tests()),
            scores: Scores::default(),
            blocked: 0,
            allowed: 0,
            total: catalog.total_tests(),
        }
    }

    /// Fold one result into the counters, the metadata buckets and the
    /// scores, then describe the new state
    pub fn record(&mut self, result: TestResult) -> ProgressUpdate {
        if let Some(stat) = self.stats.get_mut(&result.category_id) {
            if result.blocked {
                stat.blocked += 1;
            } else {
                stat.allowed += 1;
            }
        }

        if result.blocked {
            self.blocked += 1;
        } else {
            self.allowed += 1;
        }

        self.metadata.record(&result.id, result.layer, result.blocked);
        self.scores = compute_scores(&self.stats);
        self.results.push(result.clone());

        ProgressUpdate {
            run_id: self.run_id.clone(),
            completed: self.results.len(),
            total: self.total,
            percentage: self.percentage(),
            blocked: self.blocked,
            allowed: self.allowed,
            elapsed_time_ms: self.started.elapsed().as_millis() as u64,
            result,
            scores: self.scores,
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.results.len() as f64 / self.total as f64 * 100.0
        }
    }
}
