//! Chunks masked text nodes, asks a small model for a bounded list of TTS
//! rewrite suggestions per chunk, validates each suggestion against the
//! data-model invariants, and merges survivors into a deduplicated plan.

use crate::masking::sentinel_scan_re;
use mdp_config::DetectorConfig;
use mdp_domain::plan::{ItemRejection, Plan, Reason, ReplacementItem};
use mdp_domain::report::StageStats;
use mdp_llm::{extract_json_array, ChatClient, ChatMessage};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
struct RawItem {
    find: String,
    replace: String,
    reason: String,
}

fn sentence_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+\s*").unwrap())
}

/// Splits `text` into chunks of at most `max_chunk_size`, each chunk after
/// the first carrying up to `overlap` trailing characters of the previous
/// chunk, split on sentence boundaries so a chunk boundary never falls
/// mid-sentence when avoidable.
pub fn chunk_text(text: &str, max_chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.len() <= max_chunk_size {
        return vec![text.to_string()];
    }

    let mut sentences: Vec<&str> = Vec::new();
    let mut last = 0;
    for m in sentence_boundary_re().find_iter(text) {
        sentences.push(&text[last..m.end()]);
        last = m.end();
    }
    if last < text.len() {
        sentences.push(&text[last..]);
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in sentences {
        if !current.is_empty() && current.len() + sentence.len() > max_chunk_size {
            chunks.push(current.clone());
            current = overlap_tail(&current, overlap);
        }
        current.push_str(sentence);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Takes the trailing `overlap` characters of `chunk`, then widens the cut
/// backward to the start of any mask sentinel the raw character count would
/// otherwise have split in half.
fn overlap_tail(chunk: &str, overlap: usize) -> String {
    if overlap == 0 || chunk.is_empty() {
        return String::new();
    }
    let char_count = chunk.chars().count();
    let skip = char_count.saturating_sub(overlap);
    let mut start = chunk.char_indices().nth(skip).map(|(i, _)| i).unwrap_or(chunk.len());
    for m in sentinel_scan_re().find_iter(chunk) {
        if start > m.start() && start < m.end() {
            start = m.start();
        }
    }
    chunk[start..].to_string()
}

fn should_skip(chunk: &str) -> bool {
    let trimmed = chunk.trim();
    trimmed.is_empty() || trimmed.starts_with("http://") || trimmed.starts_with("https://") || trimmed == "//"
}

fn system_prompt(cfg: &DetectorConfig) -> String {
    format!(
        "You rewrite text for text-to-speech. You may only propose edits for these reasons: \
        tts_spaced (joins spaced-out letters), unicode_stylized (de-stylizes Unicode), \
        case_glitch (fixes shouting), simple_punct (normalizes punctuation). \
        Return a JSON array of at most {} objects shaped {{\"find\":...,\"replace\":...,\"reason\":...}}. \
        `find` must be a literal substring of TEXT. `replace` must be plain text, at most 10 characters \
        longer than `find`. An empty array is a valid answer.",
        cfg.json_max_items
    )
}

fn user_prompt(chunk: &str, cfg: &DetectorConfig) -> String {
    format!("LANG: {}\nMAX_ITEMS: {}\nTEXT:\n<<<\n{}\n>>>", cfg.locale, cfg.json_max_items, chunk)
}

/// Validates and normalizes one raw LLM item against `chunk`, counting
/// rejections by reason in `stats`.
fn validate_item(raw: RawItem, chunk: &str, stats: &mut StageStats) -> Option<ReplacementItem> {
    let Some(reason) = Reason::from_keyword(&raw.reason) else {
        stats.incr("rejections.schema");
        return None;
    };
    let item = ReplacementItem { find: raw.find, replace: raw.replace, reason };
    match item.validate_against(chunk) {
        Ok(()) => Some(item),
        Err(ItemRejection::NoMatch) => {
            stats.incr("rejections.no_match");
            None
        }
        Err(ItemRejection::ForbiddenChars) => {
            stats.incr("rejections.forbidden_chars");
            None
        }
        Err(ItemRejection::LengthDelta) => {
            stats.incr("rejections.length_delta");
            None
        }
        Err(_) => {
            stats.incr("rejections.schema");
            None
        }
    }
}

/// Runs the detector over every chunk of `text`, merging survivors into a
/// single deduplicated plan in first-seen order.
pub async fn detect(client: &ChatClient, text: &str, cfg: &DetectorConfig, stats: &mut StageStats) -> Plan {
    let mut plan = Plan::new();
    if !cfg.enabled {
        return plan;
    }

    for chunk in chunk_text(text, cfg.max_chunk_size, cfg.overlap_size) {
        if should_skip(&chunk) {
            stats.incr("chunks_skipped");
            continue;
        }
        stats.incr("chunks_attempted");

        let messages = vec![ChatMessage::system(system_prompt(cfg)), ChatMessage::user(user_prompt(&chunk, cfg))];
        let response = match client.complete(messages).await {
            Ok(r) => r,
            Err(e) if e.is_transport_failure() => {
                stats.incr("llm_transport_errors");
                continue;
            }
            Err(_) => {
                stats.incr("json_parse_errors");
                continue;
            }
        };

        let array = match extract_json_array(&response) {
            Ok(v) => v,
            Err(_) => {
                stats.incr("json_parse_errors");
                continue;
            }
        };

        let raw_items: Vec<RawItem> = match serde_json::from_value(array) {
            Ok(items) => items,
            Err(_) => {
                stats.incr("json_parse_errors");
                continue;
            }
        };

        let mut chunk_items = Vec::new();
        for raw in raw_items.into_iter().take(cfg.json_max_items) {
            if let Some(item) = validate_item(raw, &chunk, stats) {
                chunk_items.push(item);
            }
        }

        let growth: i64 = chunk_items.iter().map(|i| i.replace.len() as i64 - i.find.len() as i64).sum();
        if chunk.is_empty() || (growth as f64 / chunk.len().max(1) as f64) > mdp_domain::plan::MAX_SPAN_GROWTH_RATIO {
            stats.incr("rejections.length_delta");
            continue;
        }

        for item in chunk_items {
            if plan.push_dedup(item) {
                stats.incr("items_merged");
            } else {
                stats.incr("rejections.duplicate");
            }
        }
    }

    plan
}
