// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Audit Error Types
 * Catalog validation is the only fatal condition; probe errors are always
 * folded into a test result by the engine.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use thiserror::Error;

/// Top-level error for the audit library
#[derive(Error, Debug)]
pub enum AuditError {
    /// Catalog failed validation before any run started
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A second run was requested while one is in flight
    #[error("An audit run is already in progress")]
    Busy,
}

/// Static catalog problems, detected once at startup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("duplicate test id '{id}' (categories '{first}' and '{second}')")]
    DuplicateTestId {
        id: String,
        first: String,
        second: String,
    },

    #[error("duplicate category id '{0}'")]
    DuplicateCategoryId(String),

    #[error("category '{category}' has unknown layer '{layer}'")]
    UnknownLayer { category: String, layer: String },

    #[error("category '{0}' has no tests")]
    EmptyCategory(String),

    #[error("category '{category}' has non-positive weight {weight}")]
    InvalidWeight { category: String, weight: f64 },

    #[error("catalog is empty")]
    Empty,
}

/// Errors raised by a probe invocation
#[derive(Error, Debug, Clone)]
pub enum ProbeError {
    #[error("Capability unavailable: {0}")]
    ApiUnavailable(String),

    #[error("Probe error: {0}")]
    Other(String),
}

pub type AuditResult<T> = Result<T, AuditError>;
