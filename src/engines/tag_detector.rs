// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scan_result::{InjectedTag, TagKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static TAG_PATTERNS: Lazy<Vec<(TagKind, Regex)>> = Lazy::new(|| {
    let patterns: [(TagKind, &str); 8] = [
        (TagKind::Gtm, r"\b(GTM-[A-Z0-9]+)\b"),
        (TagKind::Ga4, r"\b(G-[A-Z0-9]+)\b"),
        (
            TagKind::MetaPixel,
            r#"fbq\(\s*['"]init['"]\s*,\s*['"]([^'"]+)['"]"#,
        ),
        (
            TagKind::LinkedIn,
            r#"_linkedin_partner_id\s*=\s*['"]([^'"]+)['"]"#,
        ),
        (
            TagKind::LinkedIn,
            r#"lntrck\(\s*['"]init['"]\s*,\s*['"]([^'"]+)['"]"#,
        ),
        (TagKind::TikTok, r#"ttq\.load\(\s*['"]([^'"]+)['"]"#),
        (
            TagKind::Twitter,
            r#"twq\(\s*['"]init['"]\s*,\s*['"]([^'"]+)['"]"#,
        ),
        (
            TagKind::Pinterest,
            r#"pintrk\(\s*['"]load['"]\s*,\s*['"]([^'"]+)['"]"#,
        ),
    ];

    patterns
        .into_iter()
        .filter_map(|(kind, pattern)| match Regex::new(pattern) {
            Ok(re) => Some((kind, re)),
            Err(e) => {
                tracing::error!("Invalid tag pattern for {}: {}", kind, e);
                None
            }
        })
        .collect()
});

/// 从页面HTML中识别营销与统计标签
///
/// 同一类型下重复的ID只保留第一次出现。
pub fn detect_tags(html: &str) -> Vec<InjectedTag> {
    let mut seen: HashSet<(TagKind, String)> = HashSet::new();
    let mut tags = Vec::new();

    for (kind, re) in TAG_PATTERNS.iter() {
        for caps in re.captures_iter(html) {
            let Some(id) = caps.get(1).map(|m| m.as_str().to_string()) else {
                continue;
            };
            if seen.insert((*kind, id.clone())) {
                tags.push(InjectedTag::found(*kind, id));
            }
        }
    }

    tags
}
