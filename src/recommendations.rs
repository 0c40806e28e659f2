// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Remediation Classifier
 * Maps detection verdicts and final scores to remediation records and
 * blocklist suggestions
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::types::{BlocklistSuggestion, DetectionResult, Layer, Recommendation, Scores, Severity};

/// Layer scores below this raise a layer-specific warning
pub const LAYER_WARNING_THRESHOLD: u8 = 70;

fn rec(severity: Severity, title: &str, description: String, remediation: &str) -> Recommendation {
    Recommendation {
        severity,
        title: title.to_string(),
        description,
        remediation: remediation.to_string(),
    }
}

/// Every rule is evaluated independently; an empty list means all layers
/// are effective
pub fn recommend(detection: &DetectionResult, scores: &Scores) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if !detection.dns_filtering_active {
        recommendations.push(rec(
            Severity::Critical,
            "No DNS Filtering Detected",
            "DNS-level blocking (Pi-hole, AdGuard Home, NextDNS) protects every device on the \
             network. Installing a DNS filtering solution is strongly recommended."
                .to_string(),
            "Pi-hole: curl -sSL https://install.pi-hole.net | bash\n\
             AdGuard Home: https://github.com/AdguardTeam/AdGuardHome",
        ));
    }

    if !detection.browser_ad_block_active {
        recommendations.push(rec(
            Severity::Critical,
            "No Browser Ad Blocker Detected",
            "Browser extensions such as uBlock Origin block elements that slip past DNS filtering."
                .to_string(),
            "uBlock Origin:\n\
             Chrome: https://chrome.google.com/webstore/detail/cjpalhdlnbpafiamejdnhcphjbkeiagm\n\
             Firefox: https://addons.mozilla.org/firefox/addon/ublock-origin/",
        ));
    }

    for layer in Layer::ALL {
        let score = scores.layer(layer);
        if score < LAYER_WARNING_THRESHOLD {
            recommendations.push(layer_warning(layer, score));
        }
    }

    recommendations
}

fn layer_warning(layer: Layer, score: u8) -> Recommendation {
    match layer {
        Layer::Dns => rec(
            Severity::Warning,
            "Low DNS Score",
            format!(
                "DNS filtering scored {}/100. Consider adding blocklists or regex blocking.",
                score
            ),
            "Recommended lists:\n\
             - OISD Big: https://big.oisd.nl/\n\
             - Hagezi Pro: https://github.com/hagezi/dns-blocklists\n\
             - 1Hosts Pro: https://o0.pages.dev/Pro/hosts.txt",
        ),
        Layer::Browser => rec(
            Severity::Warning,
            "Low Browser Score",
            format!(
                "Browser filtering scored {}/100. Review installed extensions and their settings.",
                score
            ),
            "- Install uBlock Origin\n\
             - Enable the Annoyances and Privacy lists\n\
             - Add custom cosmetic filters",
        ),
        Layer::Cname => rec(
            Severity::Warning,
            "Vulnerable to CNAME Cloaking",
            format!(
                "CNAME protection scored {}/100. CNAME cloaking disguises trackers as first-party \
                 subdomains. Pi-hole v6+ inspects CNAME chains natively.",
                score
            ),
            "Pi-hole v6+:\npihole -up\nSettings -> DNS -> CNAME Deep Inspection",
        ),
        Layer::Advanced => rec(
            Severity::Warning,
            "Advanced Tracking Not Blocked",
            format!(
                "Advanced tracking protection scored {}/100. Fingerprinting and storage-based \
                 tracking are getting through.",
                score
            ),
            "- Firefox: about:config -> privacy.resistFingerprinting = true\n\
             - Brave: Shields -> Fingerprinting = Block\n\
             - Extensions: CanvasBlocker, Chameleon",
        ),
    }
}

/// Blocklists worth adding given the final scores
pub fn suggest_blocklists(scores: &Scores) -> Vec<BlocklistSuggestion> {
    let candidates = [
        (
            "OISD Big List",
            "Comprehensive list with over a million domains. Improves DNS coverage.",
            "https://big.oisd.nl/",
            scores.dns < 80,
        ),
        (
            "Hagezi Pro++",
            "Privacy and advanced tracking focus. Improves CNAME protection.",
            "https://github.com/hagezi/dns-blocklists",
            scores.cname < 80,
        ),
        (
            "1Hosts Pro",
            "Aggressive ad and tracker blocking.",
            "https://o0.pages.dev/Pro/hosts.txt",
            scores.dns < 70,
        ),
        (
            "Steven Black Unified",
            "Balanced merge of several well-maintained lists.",
            "https://raw.githubusercontent.com/StevenBlack/hosts/master/hosts",
            true,
        ),
        (
            "AdGuard DNS Filter",
            "Actively maintained by AdGuard with frequent updates.",
            "https://adguardteam.github.io/AdGuardSDNSFilter/Filters/filter.txt",
            true,
        ),
        (
            "EasyPrivacy",
            "Anti-tracking list that complements ad blocklists.",
            "https://easylist.to/easylist/easyprivacy.txt",
            scores.advanced < 70,
        ),
    ];

    candidates
        .into_iter()
        .filter(|(_, _, _, relevant)| *relevant)
        .map(|(name, description, url, _)| BlocklistSuggestion {
            name: name.to_string(),
            description: description.to_string(),
            url: url.to_string(),
        })
        .collect()
}
