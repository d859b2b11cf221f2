// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::analysis_result::{
    Finding, PerformanceScores, ProcessedTag, Severity,
};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::warn;

const MAX_TAG_BONUS: i32 = 5;

/// 标签加分词表
///
/// 分析服务填充 `name` 与 `type` 的方式并不一致，
/// 因此两个字段都会被归一化（小写、仅保留字母数字）后与别名比较。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TagVocabulary {
    /// Google Analytics 4，+2
    pub ga4: Vec<String>,
    /// Google Tag Manager，+1
    pub gtm: Vec<String>,
    /// Meta Pixel，+1
    pub meta_pixel: Vec<String>,
    /// LinkedIn Insight Tag 或 Twitter Pixel，+1
    pub linkedin_or_twitter: Vec<String>,
}

impl Default for TagVocabulary {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            ga4: owned(&["Google Analytics 4", "GA4"]),
            gtm: owned(&["Google Tag Manager", "GTM"]),
            meta_pixel: owned(&["Meta Pixel", "Facebook Pixel", "MetaPixel", "Meta"]),
            linkedin_or_twitter: owned(&[
                "LinkedIn Insight Tag",
                "LinkedIn",
                "Twitter Pixel",
                "Twitter",
            ]),
        }
    }
}

fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// 健康分计算器
///
/// 从100分开始按发现、性能和标签调整，结果取整并限制在 [1, 100]。
#[derive(Debug, Clone, Default)]
pub struct HealthScorer {
    vocabulary: TagVocabulary,
}

impl HealthScorer {
    pub fn new(vocabulary: TagVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn score(
        &self,
        findings: &[Finding],
        perf: &PerformanceScores,
        tags: &[ProcessedTag],
    ) -> u8 {
        let mut score: f64 = 100.0;

        score -= findings.iter().map(finding_penalty).sum::<f64>();
        score -= performance_penalty(perf);
        score += self.tag_bonus(tags) as f64;

        score.round().clamp(1.0, 100.0) as u8
    }

    fn tag_bonus(&self, tags: &[ProcessedTag]) -> i32 {
        if tags.is_empty() {
            return 0;
        }
        if tags.iter().all(|t| t.name.is_none()) {
            warn!(
                tag_count = tags.len(),
                "Processed tags carry no name field, matching tag bonus on type only"
            );
        }

        let present: HashSet<String> = tags
            .iter()
            .flat_map(|t| [t.name.as_deref(), t.kind.as_deref()])
            .flatten()
            .map(normalize)
            .filter(|k| !k.is_empty())
            .collect();
        let matches = |aliases: &[String]| aliases.iter().any(|a| present.contains(&normalize(a)));

        let mut bonus = 0;
        if matches(&self.vocabulary.ga4) {
            bonus += 2;
        }
        if matches(&self.vocabulary.gtm) {
            bonus += 1;
        }
        if matches(&self.vocabulary.meta_pixel) {
            bonus += 1;
        }
        if matches(&self.vocabulary.linkedin_or_twitter) {
            bonus += 1;
        }
        bonus.min(MAX_TAG_BONUS)
    }
}

fn finding_penalty(finding: &Finding) -> f64 {
    match finding.severity {
        Some(Severity::High) => 20.0,
        Some(Severity::Medium) => 12.0,
        Some(Severity::Low) => 5.0,
        None => match finding.kind.as_deref() {
            Some("issue") => 10.0,
            Some("warning") => 6.0,
            _ => 0.0,
        },
    }
}

fn performance_penalty(perf: &PerformanceScores) -> f64 {
    let mut penalty = 0.0;

    let load = perf.load_time_ms.unwrap_or(0.0);
    penalty += if load > 8000.0 {
        25.0
    } else if load > 5000.0 {
        15.0
    } else if load > 3500.0 {
        8.0
    } else if load > 2500.0 {
        4.0
    } else {
        0.0
    };

    let lcp = perf.largest_contentful_paint_ms.unwrap_or(0.0);
    penalty += if lcp > 6000.0 {
        15.0
    } else if lcp > 4000.0 {
        10.0
    } else if lcp > 2500.0 {
        5.0
    } else {
        0.0
    };

    if let Some(cls) = perf.cumulative_layout_shift {
        penalty += if cls > 0.4 {
            10.0
        } else if cls > 0.25 {
            6.0
        } else if cls > 0.1 {
            3.0
        } else {
            0.0
        };
    }

    penalty
}
