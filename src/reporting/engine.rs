// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::reporting::formats::{
    html::HtmlReportGenerator, json::JsonReportGenerator, text::TextReportGenerator,
};
use crate::reporting::types::{ReportConfig, ReportFormat, ReportOutput};
use crate::types::AuditReport;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

pub struct ReportEngine;

impl ReportEngine {
    pub fn new() -> Self {
        Self
    }

    pub async fn generate_report(
        &self,
        report: &AuditReport,
        config: &ReportConfig,
    ) -> Result<ReportOutput> {
        let data = match config.format {
            ReportFormat::Json => JsonReportGenerator::new().generate(report).await?,
            ReportFormat::Text => {
                TextReportGenerator::new(config.audit_mode)
                    .generate(report)
                    .await?
            }
            ReportFormat::Html => HtmlReportGenerator::new().generate(report).await?,
        };

        Ok(ReportOutput {
            format: config.format,
            data,
            filename: Self::filename(report, config.format),
            mime_type: config.format.mime_type().to_string(),
        })
    }

    fn filename(report: &AuditReport, format: ReportFormat) -> String {
        let kind = match format {
            ReportFormat::Json => "technical",
            ReportFormat::Text => "simple",
            ReportFormat::Html => "styled",
        };
        let stamp: String = report
            .finished_at
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(14)
            .collect();
        format!("adblock-audit-{}-{}.{}", kind, stamp, format.extension())
    }

    pub async fn write_report(&self, output: &ReportOutput, path: &Path) -> Result<()> {
        tokio::fs::write(path, &output.data)
            .await
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        info!(
            "Wrote {} report ({} bytes) to {:?}",
            output.format.extension(),
            output.data.len(),
            path
        );
        Ok(())
    }
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}
