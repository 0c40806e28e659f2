// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::scoring::ScoreLabel;
use crate::types::{AuditReport, Layer};
use anyhow::Result;

const RULE: &str = "===========================================================";

pub struct TextReportGenerator {
    audit_mode: bool,
}

impl TextReportGenerator {
    pub fn new(audit_mode: bool) -> Self {
        Self { audit_mode }
    }

    pub async fn generate(&self, report: &AuditReport) -> Result<Vec<u8>> {
        Ok(self.generate_text(report).into_bytes())
    }

    fn generate_text(&self, report: &AuditReport) -> String {
        let mut txt = String::new();

        txt.push_str(&format!("{}\nDNS FILTERING & ADBLOCK TEST REPORT\n{}\n\n", RULE, RULE));
        txt.push_str(&format!("Generated: {}\n", report.finished_at));
        txt.push_str(&format!("Run ID: {}\n", report.run_id));
        txt.push_str(&format!(
            "Execution Time: {:.2}s\n\n",
            report.execution_time_secs
        ));

        txt.push_str("=== DETECTION ===\n");
        txt.push_str(&format!(
            "DNS Filtering: {}\n",
            active_label(report.detection.dns_filtering_active)
        ));
        txt.push_str(&format!("Provider: {}\n", report.detection.dns_provider));
        txt.push_str(&format!(
            "Browser AdBlock: {}\n\n",
            active_label(report.detection.browser_ad_block_active)
        ));

        txt.push_str("=== SCORES ===\n");
        txt.push_str(&format!(
            "Global Score: {}/100 ({})\n",
            report.scores.global,
            ScoreLabel::from_score(report.scores.global)
        ));
        for layer in Layer::ALL {
            txt.push_str(&format!(
                "{}: {}/100\n",
                layer.display_name(),
                report.scores.layer(layer)
            ));
        }
        txt.push('\n');

        let summary = &report.summary;
        txt.push_str("=== SUMMARY ===\n");
        txt.push_str(&format!("Total Tests: {}\n", summary.total));
        txt.push_str(&format!(
            "Blocked: {} ({})\n",
            summary.blocked, summary.block_rate
        ));
        txt.push_str(&format!(
            "Allowed: {} ({:.2}%)\n\n",
            summary.allowed,
            percent(summary.allowed, summary.total)
        ));

        txt.push_str("=== RESULTS BY CATEGORY ===\n");
        for (id, stat) in &report.category_stats {
            txt.push_str(&format!(
                "[{}] {}: {}/{} blocked\n",
                stat.layer, id, stat.blocked, stat.total
            ));
        }

        txt.push_str("\n=== ALLOWED THROUGH (Need Attention) ===\n");
        let allowed: Vec<_> = report.test_results.iter().filter(|r| !r.blocked).collect();
        if allowed.is_empty() {
            txt.push_str("None\n");
        }
        for result in allowed {
            txt.push_str(&format!(
                "x {} ({}) - {}\n",
                result.name, result.target, result.method
            ));
        }

        if !report.recommendations.is_empty() {
            txt.push_str("\n=== RECOMMENDATIONS ===\n");
            for rec in &report.recommendations {
                txt.push_str(&format!(
                    "[{}] {}\n    {}\n",
                    rec.severity.as_str().to_uppercase(),
                    rec.title,
                    rec.description
                ));
            }
        }

        if self.audit_mode {
            txt.push_str("\n=== TECHNICAL AUDIT ===\n");
            for result in &report.test_results {
                txt.push_str(&format!(
                    "{:<28} {:<12} {:<9} {:<8} {:<18} {:>6}ms  {}\n",
                    result.id,
                    result.method.as_str(),
                    result.layer.as_str(),
                    if result.blocked { "BLOCKED" } else { "ALLOWED" },
                    result.block_type.as_str(),
                    result.execution_time_ms,
                    result.error
                ));
            }
        }

        txt.push_str("\n=== END OF REPORT ===\n");
        txt
    }
}

fn active_label(active: bool) -> &'static str {
    if active {
        "ACTIVE"
    } else {
        "INACTIVE"
    }
}

fn percent(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
