//! Optional per-span LLM line-editing pass, with guardrails that revert a
//! sub-span (or the whole file) rather than risk a meaning-changing edit.

use mdp_config::FixerConfig;
use mdp_domain::plan::FORBIDDEN_REPLACE_CHARS;
use mdp_domain::report::StageStats;
use mdp_llm::{ChatClient, ChatMessage, LlmError};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    EmptyOrNonText,
    ForbiddenTokens,
    GrowthLimit,
    Timeout,
    NonResponse,
    Exception,
}

const SYSTEM_PROMPT: &str = "Improve clarity and grammar without changing meaning, tone, or details. \
    Output the revised TEXT only. No markdown, no code, no JSON, no commentary.";

fn sentence_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+\s*").unwrap())
}

fn split_sub_spans(text: &str, max_chars: usize) -> Vec<String> {
    if text.len() <= max_chars {
        return vec![text.to_string()];
    }
    let mut parts: Vec<&str> = Vec::new();
    let mut last = 0;
    for m in sentence_boundary_re().find_iter(text) {
        parts.push(&text[last..m.end()]);
        last = m.end();
    }
    if last < text.len() {
        parts.push(&text[last..]);
    }
    if parts.len() <= 1 {
        return text.split_whitespace().collect::<Vec<_>>().chunks(20).map(|c| c.join(" ")).collect();
    }

    let mut out = Vec::new();
    let mut current = String::new();
    for part in parts {
        if !current.is_empty() && current.len() + part.len() > max_chars {
            out.push(std::mem::take(&mut current));
        }
        current.push_str(part);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn guard(before: &str, after: &str, node_max_growth_ratio: f64, forbid_markdown_tokens: bool) -> Result<(), RejectionReason> {
    let trimmed = after.trim();
    if trimmed.is_empty() {
        return Err(RejectionReason::EmptyOrNonText);
    }
    if forbid_markdown_tokens && after.chars().any(|c| FORBIDDEN_REPLACE_CHARS.contains(&c)) {
        return Err(RejectionReason::ForbiddenTokens);
    }
    if before.is_empty() {
        return Ok(());
    }
    let growth = (after.len() as f64 - before.len() as f64) / before.len() as f64;
    if growth > node_max_growth_ratio || growth < -0.5 {
        return Err(RejectionReason::GrowthLimit);
    }
    Ok(())
}

/// Runs the fixer over one text span, sub-span by sub-span, reverting any
/// sub-span whose output fails a guard. Returns the rewritten span and the
/// per-sub-span rejection reasons actually hit.
pub async fn fix_span(client: &ChatClient, span_text: &str, cfg: &FixerConfig, stats: &mut StageStats) -> String {
    if !cfg.enabled {
        return span_text.to_string();
    }

    let sub_spans = split_sub_spans(span_text, 600);
    let mut result = String::with_capacity(span_text.len());

    for sub_span in sub_spans {
        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(sub_span.clone())];
        let revised = match client.complete(messages).await {
            Ok(text) => text,
            Err(LlmError::Timeout(_)) => {
                stats.incr("rejections.timeout");
                result.push_str(&sub_span);
                continue;
            }
            Err(_) => {
                stats.incr("rejections.exception");
                result.push_str(&sub_span);
                continue;
            }
        };

        match guard(&sub_span, &revised, cfg.node_max_growth_ratio, cfg.forbid_markdown_tokens) {
            Ok(()) => {
                stats.incr("sub_spans_fixed");
                result.push_str(&revised);
            }
            Err(reason) => {
                stats.incr(rejection_key(reason));
                result.push_str(&sub_span);
            }
        }
    }

    if result.is_empty() {
        return span_text.to_string();
    }

    let file_growth = (result.len() as f64 - span_text.len() as f64) / span_text.len().max(1) as f64;
    if file_growth > cfg.file_max_growth_ratio {
        stats.incr("fixer_reverted_file_growth");
        return span_text.to_string();
    }

    result
}

fn rejection_key(reason: RejectionReason) -> &'static str {
    match reason {
        RejectionReason::EmptyOrNonText => "rejections.empty_or_non_text",
        RejectionReason::ForbiddenTokens => "rejections.forbidden_tokens",
        RejectionReason::GrowthLimit => "rejections.growth_limit",
        RejectionReason::Timeout => "rejections.timeout",
        RejectionReason::NonResponse => "rejections.non_response",
        RejectionReason::Exception => "rejections.exception",
    }
}
