// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Fixture-driven probe.
//!
//! Replays verdicts captured elsewhere (typically by a page-embedded
//! harness that can run DOM baits and fingerprinting checks) so the engine
//! can score them. Test outcomes are keyed by target, detection votes by
//! signal id. Anything without an entry raises a probe error.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{DetectionSignal, Probe, ProbeOutcome};
use crate::config::ConfigFormat;
use crate::errors::ProbeError;
use crate::types::TestMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptedTest {
    Raise { raise: String },
    Outcome(ProbeOutcome),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptedSignal {
    Raise { raise: String },
    Vote(bool),
}

/// On-disk fixture layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub tests: HashMap<String, ScriptedTest>,
    #[serde(default)]
    pub signals: HashMap<String, ScriptedSignal>,
}

#[derive(Default)]
pub struct ScriptedProbe {
    fixture: Fixture,
    latency: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        Self {
            fixture,
            ..Self::default()
        }
    }

    /// Load a fixture from a TOML, YAML or JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture: {:?}", path))?;

        let fixture: Fixture = ConfigFormat::from_path(path)?
            .deserialize(&content)
            .with_context(|| format!("Invalid fixture: {:?}", path))?;

        Ok(Self::from_fixture(fixture))
    }

    pub fn with_outcome(mut self, target: &str, outcome: ProbeOutcome) -> Self {
        self.fixture
            .tests
            .insert(target.to_string(), ScriptedTest::Outcome(outcome));
        self
    }

    pub fn with_failure(mut self, target: &str, message: &str) -> Self {
        self.fixture.tests.insert(
            target.to_string(),
            ScriptedTest::Raise {
                raise: message.to_string(),
            },
        );
        self
    }

    pub fn with_signal(mut self, signal_id: &str, vote: bool) -> Self {
        self.fixture
            .signals
            .insert(signal_id.to_string(), ScriptedSignal::Vote(vote));
        self
    }

    pub fn with_signal_failure(mut self, signal_id: &str, message: &str) -> Self {
        self.fixture.signals.insert(
            signal_id.to_string(),
            ScriptedSignal::Raise {
                raise: message.to_string(),
            },
        );
        self
    }

    /// Delay every call, to observe pacing and overlap
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Targets and signal ids in the order they were invoked
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Highest number of overlapping calls observed
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, key: &str) {
        self.calls.lock().push(key.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Probe for ScriptedProbe {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run(&self, method: &TestMethod, target: &str) -> Result<ProbeOutcome, ProbeError> {
        self.enter(target).await;
        let result = match self.fixture.tests.get(target) {
            Some(ScriptedTest::Outcome(outcome)) => Ok(outcome.clone()),
            Some(ScriptedTest::Raise { raise }) => Err(ProbeError::Other(raise.clone())),
            None => Err(ProbeError::Other(format!(
                "no scripted outcome for {} '{}'",
                method, target
            ))),
        };
        self.leave();
        result
    }

    async fn signal(&self, signal: &DetectionSignal) -> Result<bool, ProbeError> {
        self.enter(&signal.id).await;
        let result = match self.fixture.signals.get(&signal.id) {
            Some(ScriptedSignal::Vote(vote)) => Ok(*vote),
            Some(ScriptedSignal::Raise { raise }) => Err(ProbeError::Other(raise.clone())),
            None => Err(ProbeError::ApiUnavailable(format!(
                "no scripted vote for signal '{}'",
                signal.id
            ))),
        };
        self.leave();
        result
    }
}
