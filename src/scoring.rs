// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Layer Scoring
 * Turns per-category blocked/total ratios into layer scores and a single
 * weighted global score
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{CategoryStat, Layer, Scores};

/// Fixed layer weights for the global score
pub fn layer_weight(layer: Layer) -> f64 {
    match layer {
        Layer::Dns => 2.0,
        Layer::Browser => 1.5,
        Layer::Cname => 1.5,
        Layer::Advanced => 1.0,
    }
}

/// Weighted block ratio of one layer, 0-100. Layers with no weight score 0.
pub fn layer_score<'a, I>(layer: Layer, stats: I) -> u8
where
    I: IntoIterator<Item = &'a CategoryStat>,
{
    let mut raw = 0.0;
    let mut weight_sum = 0.0;

    for stat in stats.into_iter().filter(|s| s.layer == layer) {
        raw += stat.block_ratio() * stat.weight;
        weight_sum += stat.weight;
    }

    if weight_sum > 0.0 {
        clamp_score(100.0 * raw / weight_sum)
    } else {
        0
    }
}

/// Weighted average of the four layer scores
pub fn global_score(scores: &Scores) -> u8 {
    let (weighted, total) = Layer::ALL.iter().fold((0.0, 0.0), |(sum, total), layer| {
        let weight = layer_weight(*layer);
        (sum + scores.layer(*layer) as f64 * weight, total + weight)
    });
    clamp_score(weighted / total)
}

/// Recompute every score from the current stats
pub fn compute_scores(stats: &BTreeMap<String, CategoryStat>) -> Scores {
    let mut scores = Scores::default();
    for layer in Layer::ALL {
        scores.set_layer(layer, layer_score(layer, stats.values()));
    }
    scores.global = global_score(&scores);
    scores
}

fn clamp_score(value: f64) -> u8 {
    if value.is_finite() {
        value.round().clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreLabel {
    Excellent,
    Good,
    Medium,
    Weak,
}

impl ScoreLabel {
    /// Bands are inclusive on their lower bound
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => ScoreLabel::Excellent,
            70..=89 => ScoreLabel::Good,
            50..=69 => ScoreLabel::Medium,
            _ => ScoreLabel::Weak,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreLabel::Excellent => "Excellent",
            ScoreLabel::Good => "Good",
            ScoreLabel::Medium => "Medium",
            ScoreLabel::Weak => "Weak",
        }
    }
}

impl std::fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(layer: Layer, weight: f64, total: u32, blocked: u32) -> CategoryStat {
        CategoryStat {
            total,
            blocked,
            allowed: total - blocked,
            weight,
            layer,
        }
    }

    fn stats(entries: Vec<(&str, CategoryStat)>) -> BTreeMap<String, CategoryStat> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_single_dns_category_dilutes_global() {
        let stats = stats(vec![("only", stat(Layer::Dns, 1.0, 2, 2))]);
        let scores = compute_scores(&stats);

        assert_eq!(scores.dns, 100);
        assert_eq!(scores.browser, 0);
        assert_eq!(scores.cname, 0);
        assert_eq!(scores.advanced, 0);
        // 100 * 2.0 / 6.0
        assert_eq!(scores.global, 33);
    }

    #[test]
    fn test_layer_score_is_weighted_by_category() {
        let stats = stats(vec![
            ("a", stat(Layer::Browser, 1.3, 4, 4)),
            ("b", stat(Layer::Browser, 1.2, 3, 0)),
            ("c", stat(Layer::Browser, 1.1, 3, 3)),
        ]);
        // (1.3 + 1.1) / 3.6 = 66.67
        assert_eq!(compute_scores(&stats).browser, 67);
    }

    #[test]
    fn test_partial_run_counts_pending_as_unblocked() {
        let mut pending = stat(Layer::Cname, 1.5, 5, 0);
        pending.allowed = 0;
        pending.blocked = 2;
        let stats = stats(vec![("cname", pending)]);
        assert_eq!(compute_scores(&stats).cname, 40);
    }

    #[test]
    fn test_all_layers_blocked_scores_100() {
        let stats = stats(
            Layer::ALL
                .iter()
                .map(|l| (l.as_str(), stat(*l, 1.0, 3, 3)))
                .collect(),
        );
        let scores = compute_scores(&stats);
        assert_eq!(
            scores,
            Scores {
                global: 100,
                dns: 100,
                browser: 100,
                cname: 100,
                advanced: 100
            }
        );
    }

    #[test]
    fn test_empty_stats_score_zero() {
        assert_eq!(compute_scores(&BTreeMap::new()), Scores::default());
    }

    #[test]
    fn test_scores_are_deterministic() {
        let stats = stats(vec![
            ("a", stat(Layer::Dns, 1.5, 7, 3)),
            ("b", stat(Layer::Advanced, 1.4, 7, 5)),
            ("c", stat(Layer::Cname, 1.5, 5, 1)),
        ]);
        let first = compute_scores(&stats);
        for _ in 0..10 {
            assert_eq!(compute_scores(&stats.clone()), first);
        }
    }

    #[test]
    fn test_global_weights() {
        let scores = Scores {
            global: 0,
            dns: 80,
            browser: 60,
            cname: 40,
            advanced: 20,
        };
        // (160 + 90 + 60 + 20) / 6 = 55
        assert_eq!(global_score(&scores), 55);
    }

    #[test]
    fn test_score_labels() {
        assert_eq!(ScoreLabel::from_score(100), ScoreLabel::Excellent);
        assert_eq!(ScoreLabel::from_score(90), ScoreLabel::Excellent);
        assert_eq!(ScoreLabel::from_score(89), ScoreLabel::Good);
        assert_eq!(ScoreLabel::from_score(70), ScoreLabel::Good);
        assert_eq!(ScoreLabel::from_score(69), ScoreLabel::Medium);
        assert_eq!(ScoreLabel::from_score(50), ScoreLabel::Medium);
        assert_eq!(ScoreLabel::from_score(49), ScoreLabel::Weak);
        assert_eq!(ScoreLabel::from_score(0), ScoreLabel::Weak);
    }
}
