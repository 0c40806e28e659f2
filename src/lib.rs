// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Ad & Tracker Blocking Audit Library
 * Declarative test catalog, ensemble detection, sequential execution
 * engine, multi-layer scoring and remediation classifier
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod catalog;
pub mod config;
pub mod detection;
pub mod engine;
pub mod errors;
pub mod probes;
pub mod recommendations;
pub mod reporting;
pub mod scoring;
pub mod types;

pub use catalog::Catalog;
pub use engine::{AuditEngine, ProgressEvent, RunPhase};
pub use errors::{AuditError, AuditResult, CatalogError, ProbeError};
pub use probes::{NetworkProbe, Probe, ProbeOutcome, ScriptedProbe};
pub use types::{AuditReport, Scores};
