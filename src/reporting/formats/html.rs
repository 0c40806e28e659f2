// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::scoring::ScoreLabel;
use crate::types::{AuditReport, Layer};
use anyhow::Result;

pub struct HtmlReportGenerator;

impl HtmlReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub async fn generate(&self, report: &AuditReport) -> Result<Vec<u8>> {
        let html = self.generate_html(report);
        Ok(html.into_bytes())
    }

    fn generate_html(&self, report: &AuditReport) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>DNS Filtering Report - {}</title>
    <style>
        {}
    </style>
</head>
<body>
    <div class="container">
        {}
        {}
        {}
        {}
        {}
        {}
    </div>
</body>
</html>"#,
            self.escape_html(&report.finished_at),
            self.get_css(),
            self.generate_header(report),
            self.generate_scores(report),
            self.generate_detection(report),
            self.generate_recommendations(report),
            self.generate_results_table(report),
            self.generate_footer(report)
        )
    }

    fn get_css(&self) -> &'static str {
        r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f5f5f5;
            padding: 20px;
            line-height: 1.6;
            color: #333;
        }
        .container {
            max-width: 1200px;
            margin: 0 auto;
            background: white;
            padding: 40px;
            border-radius: 12px;
            box-shadow: 0 2px 20px rgba(0,0,0,0.1);
        }
        .header {
            text-align: center;
            border-bottom: 3px solid #007bff;
            padding-bottom: 20px;
            margin-bottom: 30px;
        }
        .header h1 { font-size: 32px; color: #007bff; margin-bottom: 10px; }
        .score-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 20px;
            margin: 30px 0;
        }
        .score-card {
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: white;
            padding: 20px;
            border-radius: 12px;
            text-align: center;
        }
        .score-card h3 { font-size: 14px; margin-bottom: 10px; }
        .score-card .value { font-size: 48px; font-weight: bold; margin: 10px 0; }
        .detection, .recommendations {
            background: #f8f9fa;
            padding: 20px;
            border-radius: 8px;
            margin: 20px 0;
        }
        .detection-item {
            display: flex;
            justify-content: space-between;
            padding: 10px;
            border-bottom: 1px solid #ddd;
        }
        .detection-item:last-child { border-bottom: none; }
        .status-ok { color: #28a745; font-weight: bold; }
        .status-fail { color: #dc3545; font-weight: bold; }
        .severity-critical { border-left: 4px solid #dc3545; padding-left: 12px; margin: 12px 0; }
        .severity-warning { border-left: 4px solid #ffc107; padding-left: 12px; margin: 12px 0; }
        .severity-info { border-left: 4px solid #17a2b8; padding-left: 12px; margin: 12px 0; }
        pre { background: #272822; color: #f8f8f2; padding: 10px; border-radius: 6px; white-space: pre-wrap; }
        table { width: 100%; border-collapse: collapse; margin: 20px 0; }
        th { background: #007bff; color: white; padding: 12px; text-align: left; }
        td { padding: 10px 12px; border-bottom: 1px solid #ddd; }
        tr:nth-child(even) { background: #f8f9fa; }
        .blocked { color: #28a745; font-weight: bold; }
        .allowed { color: #dc3545; font-weight: bold; }
        .mono { font-family: monospace; font-size: 11px; }
        .footer {
            text-align: center;
            margin-top: 40px;
            padding-top: 20px;
            border-top: 2px solid #ddd;
            color: #666;
        }
        @media print {
            body { background: white; }
            .container { box-shadow: none; }
        }
        "#
    }

    fn generate_header(&self, report: &AuditReport) -> String {
        format!(
            r#"<div class="header">
            <h1>DNS Filtering &amp; AdBlock Report</h1>
            <p>Generated: {}</p>
            <p>Execution time: {:.2}s</p>
            <p>Run {}</p>
        </div>"#,
            self.escape_html(&report.finished_at),
            report.execution_time_secs,
            self.escape_html(&report.run_id)
        )
    }

    fn generate_scores(&self, report: &AuditReport) -> String {
        let mut cards = vec![self.score_card("Global Score", report.scores.global)];
        for layer in Layer::ALL {
            cards.push(self.score_card(layer.display_name(), report.scores.layer(layer)));
        }
        format!(r#"<div class="score-grid">{}</div>"#, cards.join("\n"))
    }

    fn score_card(&self, title: &str, score: u8) -> String {
        format!(
            r#"<div class="score-card">
                <h3>{}</h3>
                <div class="value">{}</div>
                <p>{}</p>
            </div>"#,
            title,
            score,
            ScoreLabel::from_score(score)
        )
    }

    fn generate_detection(&self, report: &AuditReport) -> String {
        let detection = &report.detection;
        format!(
            r#"<div class="detection">
            <h3>Blocker Detection</h3>
            {}
            {}
            <div class="detection-item">
                <span><strong>Inferred provider</strong></span>
                <span>{}</span>
            </div>
        </div>"#,
            self.detection_row(
                "DNS Filtering (Pi-hole / AdGuard / NextDNS)",
                detection.dns_filtering_active
            ),
            self.detection_row(
                "Browser AdBlock (uBlock / ABP / Brave)",
                detection.browser_ad_block_active
            ),
            self.escape_html(&detection.dns_provider)
        )
    }

    fn detection_row(&self, label: &str, active: bool) -> String {
        format!(
            r#"<div class="detection-item">
                <span><strong>{}</strong></span>
                <span class="{}">{}</span>
            </div>"#,
            label,
            if active { "status-ok" } else { "status-fail" },
            if active { "ACTIVE" } else { "INACTIVE" }
        )
    }

    fn generate_recommendations(&self, report: &AuditReport) -> String {
        if report.recommendations.is_empty() {
            return r#"<div class="recommendations"><h3>Recommendations</h3><p>All layers are effective.</p></div>"#.to_string();
        }

        let items: String = report
            .recommendations
            .iter()
            .map(|rec| {
                format!(
                    r#"<div class="severity-{}">
                <h4>{}</h4>
                <p>{}</p>
                <pre>{}</pre>
            </div>"#,
                    rec.severity.as_str(),
                    self.escape_html(&rec.title),
                    self.escape_html(&rec.description),
                    self.escape_html(&rec.remediation)
                )
            })
            .collect();

        let lists: String = report
            .blocklists
            .iter()
            .map(|list| {
                format!(
                    r#"<li><strong>{}</strong> - {} <span class="mono">{}</span></li>"#,
                    self.escape_html(&list.name),
                    self.escape_html(&list.description),
                    self.escape_html(&list.url)
                )
            })
            .collect();

        format!(
            r#"<div class="recommendations">
            <h3>Recommendations</h3>
            {}
            <h3>Suggested Blocklists</h3>
            <ul>{}</ul>
        </div>"#,
            items, lists
        )
    }

    fn generate_results_table(&self, report: &AuditReport) -> String {
        let rows: String = report
            .test_results
            .iter()
            .map(|result| {
                format!(
                    r#"<tr>
                    <td>{}</td>
                    <td class="mono">{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td class="{}">{}</td>
                    <td>{}</td>
                    <td>{}ms</td>
                </tr>"#,
                    self.escape_html(&result.name),
                    self.escape_html(&result.target),
                    self.escape_html(result.method.as_str()),
                    result.layer.as_str(),
                    if result.blocked { "blocked" } else { "allowed" },
                    if result.blocked { "Blocked" } else { "Allowed" },
                    self.escape_html(result.block_type.as_str()),
                    result.execution_time_ms
                )
            })
            .collect();

        format!(
            r#"<h2>Detailed Results</h2>
        <p>{} of {} blocked ({})</p>
        <table>
            <thead>
                <tr>
                    <th>Test</th>
                    <th>Target</th>
                    <th>Method</th>
                    <th>Layer</th>
                    <th>Status</th>
                    <th>Block type</th>
                    <th>Time</th>
                </tr>
            </thead>
            <tbody>{}</tbody>
        </table>"#,
            report.summary.blocked,
            report.summary.total,
            self.escape_html(&report.summary.block_rate),
            rows
        )
    }

    fn generate_footer(&self, report: &AuditReport) -> String {
        format!(
            r#"<div class="footer">
            <p><strong>adblock-audit v{}</strong></p>
            <p>Generated locally. No data leaves this machine.</p>
        </div>"#,
            self.escape_html(&report.version)
        )
    }

    fn escape_html(&self, text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }
}

impl Default for HtmlReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
