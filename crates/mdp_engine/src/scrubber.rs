//! Splits a document into blank-line-delimited blocks and removes
//! boilerplate clustered at the edges: author/translator/editor notes,
//! navigation chrome, promo/ad/social copy, watermarks, and link farms.

use mdp_config::ScrubberConfig;
use mdp_domain::report::StageStats;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrubCategory {
    AuthorsNote,
    TranslatorsNote,
    EditorsNote,
    Navigation,
    PromoAdSocial,
    Watermark,
    LinkFarm,
}

impl ScrubCategory {
    pub fn heading(self) -> &'static str {
        match self {
            Self::AuthorsNote => "Author's Notes",
            Self::TranslatorsNote => "Translator's Notes",
            Self::EditorsNote => "Editor's Notes",
            Self::Navigation => "Navigation",
            Self::PromoAdSocial => "Promotional Content",
            Self::Watermark => "Watermarks",
            Self::LinkFarm => "Link Farms",
        }
    }

    fn base_confidence(self) -> f64 {
        match self {
            Self::AuthorsNote | Self::TranslatorsNote | Self::EditorsNote => 0.9,
            Self::Navigation => 0.85,
            Self::PromoAdSocial => 0.8,
            Self::Watermark => 0.75,
            Self::LinkFarm => 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockPosition {
    EdgeTop,
    EdgeBottom,
    Middle,
}

#[derive(Debug, Clone)]
pub struct ScrubCandidate {
    pub block_id: usize,
    pub category: ScrubCategory,
    pub reason: String,
    pub content: String,
    pub position: BlockPosition,
    pub confidence: f64,
}

fn note_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"(?i)\b(author'?s? note|a/n)\b").unwrap())
}

fn translator_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"(?i)\b(translator'?s? note|t/n)\b").unwrap())
}

fn editor_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"(?i)\b(editor'?s? note|e/n)\b").unwrap())
}

fn link_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap())
}

fn blocks_of(text: &str) -> Vec<&str> {
    text.split("\n\n").filter(|b| !b.trim().is_empty()).collect()
}

fn position_of(index: usize, total: usize, window: usize) -> BlockPosition {
    if index < window {
        BlockPosition::EdgeTop
    } else if index >= total.saturating_sub(window) {
        BlockPosition::EdgeBottom
    } else {
        BlockPosition::Middle
    }
}

fn matches_any_keyword(lower: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| lower.contains(k.as_str()))
}

fn link_density(block: &str) -> (f64, usize) {
    let link_chars: usize = link_re().captures_iter(block).map(|c| c.get(1).map(|m| m.as_str().len()).unwrap_or(0)).sum();
    let count = link_re().find_iter(block).count();
    let total = block.chars().count().max(1);
    (link_chars as f64 / total as f64, count)
}

fn classify_block(block: &str, cfg: &ScrubberConfig) -> Option<(ScrubCategory, String)> {
    let lower = block.to_lowercase();
    let first_line = block.lines().next().unwrap_or("").to_lowercase();

    if cfg.categories.authors_notes && note_re().is_match(&lower) {
        return Some((ScrubCategory::AuthorsNote, "matched author's-note marker".into()));
    }
    if cfg.categories.translators_notes && translator_re().is_match(&lower) {
        return Some((ScrubCategory::TranslatorsNote, "matched translator's-note marker".into()));
    }
    if cfg.categories.editors_notes && editor_re().is_match(&lower) {
        return Some((ScrubCategory::EditorsNote, "matched editor's-note marker".into()));
    }
    if cfg.categories.navigation && matches_any_keyword(&lower, &cfg.keywords.navigation) {
        return Some((ScrubCategory::Navigation, "matched navigation keyword".into()));
    }
    if cfg.categories.promos_ads_social && matches_any_keyword(&lower, &cfg.keywords.promos) {
        return Some((ScrubCategory::PromoAdSocial, "matched promotional keyword".into()));
    }
    if matches_any_keyword(&first_line, &cfg.keywords.watermarks) {
        return Some((ScrubCategory::Watermark, "matched watermark keyword".into()));
    }
    if cfg.categories.link_farms {
        let (density, count) = link_density(block);
        if density >= cfg.link_density_threshold && count >= 2 {
            return Some((ScrubCategory::LinkFarm, format!("link density {density:.2} over {count} links")));
        }
    }
    None
}

fn whitelisted(block: &str, cfg: &ScrubberConfig) -> bool {
    let first_line = block.lines().next().unwrap_or("").trim();
    cfg.whitelist.headings_keep.iter().any(|h| first_line.eq_ignore_ascii_case(h))
}

/// Scans `text`'s blank-line-delimited blocks for boilerplate. Returns the
/// scrubbed text (candidates removed) and the full candidate list, whether
/// or not each was actually removed — the edge bias in `dry_run=false`
/// determines which are actually dropped.
pub fn scrub(text: &str, cfg: &ScrubberConfig, stats: &mut StageStats) -> (String, Vec<ScrubCandidate>) {
    if !cfg.enabled {
        return (text.to_string(), Vec::new());
    }

    let blocks = blocks_of(text);
    let total = blocks.len();
    let mut candidates = Vec::new();
    let mut kept_blocks = Vec::new();

    for (idx, block) in blocks.iter().enumerate() {
        if block.trim().len() < cfg.min_chars_to_strip || whitelisted(block, cfg) {
            kept_blocks.push(*block);
            continue;
        }
        let position = position_of(idx, total, cfg.edge_block_window);
        if let Some((category, reason)) = classify_block(block, cfg) {
            let confidence = category.base_confidence();
            let candidate = ScrubCandidate { block_id: idx, category, reason, content: block.to_string(), position, confidence };
            let removable = position != BlockPosition::Middle || confidence >= 0.95;
            if removable {
                stats.incr("blocks_removed");
                candidates.push(candidate);
                continue;
            }
            stats.incr("blocks_kept_edge_bias");
            candidates.push(candidate);
        }
        kept_blocks.push(*block);
    }

    (kept_blocks.join("\n\n"), candidates)
}

/// Candidates that were actually removed (not merely flagged and kept by
/// the edge bias), for the appendix writer.
pub fn removed_candidates(candidates: &[ScrubCandidate]) -> Vec<&ScrubCandidate> {
    candidates.iter().filter(|c| c.position != BlockPosition::Middle || c.confidence >= 0.95).collect()
}
