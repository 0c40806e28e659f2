// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Capability Contract
 * Single-shot asynchronous checks the engine dispatches tests and
 * detection votes to
 *
 * Each probe must:
 * - bound its own duration (the engine never times a probe out)
 * - isolate whatever artifacts it creates
 * - report a blocked/allowed verdict or raise a ProbeError
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod network;
pub mod scripted;

pub use network::NetworkProbe;
pub use scripted::ScriptedProbe;

use serde::{Deserialize, Serialize};

use crate::errors::ProbeError;
use crate::types::{BlockType, TestMethod};

/// Verdict of a single probe invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    pub blocked: bool,
    pub block_type: BlockType,
    /// "None" when there is nothing to report
    #[serde(default = "none_label")]
    pub error: String,
}

fn none_label() -> String {
    "None".to_string()
}

impl ProbeOutcome {
    pub fn allowed() -> Self {
        Self {
            blocked: false,
            block_type: BlockType::None,
            error: none_label(),
        }
    }

    pub fn blocked(block_type: BlockType, error: impl Into<String>) -> Self {
        Self {
            blocked: true,
            block_type,
            error: error.into(),
        }
    }

    /// The probe cannot evaluate this method. Counted as allowed: a
    /// capability gap is not evidence of blocking.
    pub fn unsupported(method: &TestMethod) -> Self {
        Self {
            blocked: false,
            block_type: BlockType::Unsupported,
            error: format!("Method '{}' not supported by this probe", method),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }
}

/// Detection vector kinds. `DnsBlock` is the network-level vote; the rest
/// are browser-side heuristics that only a page-embedded harness can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    DnsBlock,
    BaitElement,
    AdClasses,
    KnownAdDomains,
    UblockSignature,
    DomModification,
    ComputedStyle,
    MultipleBaits,
    ScriptBlock,
    CssInjection,
    ResourceTiming,
}

/// One vote in an ensemble
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionSignal {
    pub id: String,
    pub kind: SignalKind,
    /// Host, URL or bait identifier the vote inspects
    pub target: String,
}

impl DetectionSignal {
    pub fn new(id: &str, kind: SignalKind, target: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            target: target.to_string(),
        }
    }
}

/// External capability the engine drives
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Short name for logs and reports
    fn name(&self) -> &str;

    /// Run one catalog test. `TestMethod::Unrecognized` never reaches a probe.
    async fn run(&self, method: &TestMethod, target: &str) -> Result<ProbeOutcome, ProbeError>;

    /// Cast one detection vote: `true` means the signal observed blocking
    async fn signal(&self, signal: &DetectionSignal) -> Result<bool, ProbeError>;
}
