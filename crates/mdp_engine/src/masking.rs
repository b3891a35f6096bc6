//! Markdown adapter: partitions a document into protected spans (code,
//! HTML, links, math) and editable text spans, substituting protected
//! spans with stable sentinels so every later stage only ever sees prose.
//!
//! Guarantees:
//! - Single-pass scan for protected-span extraction.
//! - Sentinel tokens are assumed absent from the original text; if the
//!   assumption fails, masking is skipped entirely (fail closed).
//! - Exact byte restoration on unmask.
//! - If a sentinel leaks or restoration count mismatches, unmask returns
//!   the original text unchanged (fail closed) rather than corrupt output.

use mdp_domain::mask::MaskTable;
use mdp_domain::types::{ProtectedKind, TextSpan};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

const SENTINEL_SCAN_PREFIX: &str = "{{MASK_";

/// Holds the masked text and the mask table built while producing it.
#[derive(Debug)]
pub struct MaskedText {
    pub masked: String,
    mask_table: MaskTable,
    original: String,
}

impl MaskedText {
    /// Apply a transformation to the masked text. The function receives the
    /// masked text (sentinels in place of protected regions) and must leave
    /// sentinels byte-for-byte intact.
    pub fn transform<F>(&mut self, f: F)
    where
        F: FnOnce(&str) -> String,
    {
        self.masked = f(&self.masked);
    }

    pub fn mask_table(&self) -> &MaskTable {
        &self.mask_table
    }

    /// Restores every sentinel with its original literal. Fails closed
    /// (returns the pre-mask original) if any sentinel's count in the
    /// current text differs from one, or if a stray sentinel-shaped token
    /// remains afterward.
    pub fn unmask(self) -> String {
        if self.mask_table.is_empty() {
            return self.masked;
        }
        unmask_with(&self.masked, &self.mask_table).unwrap_or(self.original)
    }

    pub fn into_parts(self) -> (String, MaskTable) {
        (self.masked, self.mask_table)
    }
}

/// Restores every sentinel in an arbitrary masked string using a mask
/// table built earlier in the pipeline. Used once the pipeline's evolving
/// text (post pre-pass/detect/apply/tie-break) needs to become the final
/// document; fails closed to the still-masked text on any anomaly.
pub fn unmask_text(masked: &str, table: &MaskTable) -> String {
    unmask_with(masked, table).unwrap_or_else(|| masked.to_string())
}

fn unmask_with(masked: &str, table: &MaskTable) -> Option<String> {
    let mut result = masked.to_string();
    for (sentinel, literal) in table.iter() {
        let count = result.matches(sentinel).count();
        if count != 1 {
            return None;
        }
        result = result.replacen(sentinel, literal, 1);
    }
    if result.contains(SENTINEL_SCAN_PREFIX) {
        return None;
    }
    Some(result)
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    kind: ProtectedKind,
}

fn code_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```.*?```").unwrap())
}

fn math_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\$\$.*?\$\$").unwrap())
}

fn inline_math_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$[^\$\n]+\$").unwrap())
}

fn autolink_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<https?://[^>\s]+>").unwrap())
}

fn html_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").unwrap())
}

fn image_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"!\[[^\]]*\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).unwrap())
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\[[^\]]*\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).unwrap())
}

/// Matches `` `...` `` runs where the opening/closing backtick counts agree,
/// via a manual scan rather than a backreference regex.
fn find_inline_code_spans(text: &str, out: &mut Vec<Candidate>) {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    while i < len {
        if bytes[i] == b'`' {
            let run_start = i;
            let mut run_len = 0;
            while i < len && bytes[i] == b'`' {
                run_len += 1;
                i += 1;
            }
            let fence = "`".repeat(run_len);
            if let Some(rel_end) = text[i..].find(&fence) {
                let close_start = i + rel_end;
                let close_end = close_start + fence.len();
                out.push(Candidate { start: run_start, end: close_end, kind: ProtectedKind::InlineCode });
                i = close_end;
            }
        } else {
            let ch_len = text[i..].chars().next().map(char::len_utf8).unwrap_or(1);
            i += ch_len;
        }
    }
}

/// Matches `<tag ...>...</tag>` / `<tag ... />` HTML blocks, case-insensitive,
/// non-nested (first matching close tag wins).
fn find_html_block_spans(text: &str, out: &mut Vec<Candidate>) {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    while i < len {
        if bytes[i] == b'<' && i + 1 < len && (bytes[i + 1].is_ascii_alphabetic()) {
            if let Some(end) = try_match_html_tag(text, i) {
                out.push(Candidate { start: i, end, kind: ProtectedKind::HtmlBlock });
                i = end;
                continue;
            }
        }
        let ch_len = text[i..].chars().next().map(char::len_utf8).unwrap_or(1);
        i += ch_len;
    }
}

fn try_match_html_tag(text: &str, start: usize) -> Option<usize> {
    let rest = &text[start + 1..];
    let tag_end = rest.find(|c: char| c.is_whitespace() || c == '>' || c == '/')?;
    let tag_name = &rest[..tag_end];
    if tag_name.is_empty() || !tag_name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let gt = rest.find('>')?;
    if rest[..gt].ends_with('/') {
        return Some(start + 1 + gt + 1);
    }
    let close_pattern = format!("</{}>", tag_name);
    let search_start = start + 1 + gt + 1;
    let search_text = &text[search_start..];
    let pos = find_case_insensitive(search_text, &close_pattern)?;
    Some(search_start + pos + close_pattern.len())
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (0..=(hay.len() - needle.len())).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

fn collect_candidates(text: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for m in code_fence_re().find_iter(text) {
        candidates.push(Candidate { start: m.start(), end: m.end(), kind: ProtectedKind::CodeFence });
    }
    find_inline_code_spans(text, &mut candidates);
    for m in html_comment_re().find_iter(text) {
        candidates.push(Candidate { start: m.start(), end: m.end(), kind: ProtectedKind::HtmlBlock });
    }
    find_html_block_spans(text, &mut candidates);
    for m in math_block_re().find_iter(text) {
        candidates.push(Candidate { start: m.start(), end: m.end(), kind: ProtectedKind::MathBlock });
    }
    for m in inline_math_re().find_iter(text) {
        candidates.push(Candidate { start: m.start(), end: m.end(), kind: ProtectedKind::InlineMath });
    }
    for m in autolink_re().find_iter(text) {
        candidates.push(Candidate { start: m.start(), end: m.end(), kind: ProtectedKind::Autolink });
    }
    for m in image_link_re().find_iter(text) {
        candidates.push(Candidate { start: m.start(), end: m.end(), kind: ProtectedKind::ImageUrl });
    }
    for m in link_re().find_iter(text) {
        candidates.push(Candidate { start: m.start(), end: m.end(), kind: ProtectedKind::LinkUrl });
    }
    candidates
}

/// Resolves overlapping candidates by earliest-start, longest-span-wins,
/// discarding anything nested inside an already-chosen span.
fn resolve_first_winner(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut chosen: Vec<Candidate> = Vec::with_capacity(candidates.len());
    let mut cursor = 0usize;
    for candidate in candidates {
        if candidate.start < cursor {
            continue;
        }
        cursor = candidate.end;
        chosen.push(candidate);
    }
    chosen
}

/// Builds the mask table and masked text for `text`. Fails closed (returns
/// the text unmasked, with an empty mask table) if the text already
/// contains a sentinel-shaped token, since masking could not then be
/// guaranteed collision-free.
pub fn mask(text: &str) -> MaskedText {
    if text.contains(SENTINEL_SCAN_PREFIX) {
        return MaskedText { masked: text.to_string(), mask_table: MaskTable::new(), original: text.to_string() };
    }

    let chosen = resolve_first_winner(collect_candidates(text));
    let mut table = MaskTable::new();
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for candidate in chosen {
        result.push_str(&text[cursor..candidate.start]);
        let literal = &text[candidate.start..candidate.end];
        let sentinel = table.insert(candidate.kind, literal);
        result.push_str(&sentinel);
        cursor = candidate.end;
    }
    result.push_str(&text[cursor..]);

    MaskedText { masked: result, mask_table: table, original: text.to_string() }
}

/// Convenience: mask, transform, unmask. Returns the original on any
/// masking/unmasking failure, never a corrupted hybrid.
pub fn with_masking<F>(text: &str, f: F) -> Cow<'_, str>
where
    F: FnOnce(&str) -> String,
{
    if text.is_empty() {
        return Cow::Borrowed(text);
    }
    let mut masked = mask(text);
    let result = if masked.mask_table.is_empty() {
        let out = f(text);
        masked.masked = out;
        masked.unmask()
    } else {
        masked.transform(f);
        masked.unmask()
    };
    if result == text {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(result)
    }
}

/// Extracts non-blank text spans from a masked document — the sole input
/// later stages (pre-pass, detector, fixer) are allowed to edit.
pub fn extract_text_spans(masked_doc: &str) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut cursor = 0usize;
    let mut in_span_start = 0usize;

    let sentinel_re = sentinel_scan_re();
    for m in sentinel_re.find_iter(masked_doc) {
        if m.start() > in_span_start {
            push_if_nonblank(&mut spans, masked_doc, in_span_start, m.start());
        }
        cursor = m.end();
        in_span_start = cursor;
    }
    if in_span_start < masked_doc.len() {
        push_if_nonblank(&mut spans, masked_doc, in_span_start, masked_doc.len());
    }
    spans
}

fn push_if_nonblank(spans: &mut Vec<TextSpan>, doc: &str, start: usize, end: usize) {
    let text = &doc[start..end];
    if !text.trim().is_empty() {
        spans.push(TextSpan { start, end, text: text.to_string() });
    }
}

pub(crate) fn sentinel_scan_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{MASK_[A-Z_]+_\d+\}\}").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_plain_text() {
        let text = "Hello, world! This is plain text.";
        let masked = mask(text);
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn roundtrip_code_fence() {
        let text = "Before\n```\nfn main() {}\n```\nAfter";
        let masked = mask(text);
        assert!(!masked.masked.contains("fn main"));
        assert_eq!(masked.mask_table().len(), 1);
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn roundtrip_inline_code() {
        let text = "Run `cargo test` to check.";
        let masked = mask(text);
        assert!(!masked.masked.contains("cargo test"));
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn roundtrip_html_comment() {
        let text = "Before <!-- hidden --> After";
        let masked = mask(text);
        assert!(!masked.masked.contains("hidden"));
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn roundtrip_html_block() {
        let text = "Before <span>kept</span> After";
        let masked = mask(text);
        assert!(!masked.masked.contains("kept"));
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn roundtrip_link_and_image() {
        let text = "See [docs](https://example.com/x) and ![alt](https://example.com/y.png \"title\").";
        let masked = mask(text);
        assert!(!masked.masked.contains("example.com"));
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn roundtrip_math() {
        let text = "Inline $x^2$ and block $$\\int_0^1 x dx$$ done.";
        let masked = mask(text);
        assert!(!masked.masked.contains("x^2"));
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn roundtrip_autolink() {
        let text = "Visit <https://example.com/page> now.";
        let masked = mask(text);
        assert!(!masked.masked.contains("example.com"));
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn nested_math_inside_code_fence_resolves_to_outer_span() {
        let text = "```\n$$ not math $$\n```";
        let masked = mask(text);
        assert_eq!(masked.mask_table().len(), 1);
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn transform_does_not_affect_protected_regions() {
        let text = "Replace THIS but not `THIS`.";
        let mut masked = mask(text);
        masked.transform(|t| t.replace("THIS", "THAT"));
        let result = masked.unmask();
        assert_eq!(result, "Replace THAT but not `THIS`.");
    }

    #[test]
    fn unmask_fails_closed_on_deleted_sentinel() {
        let text = "Before `code` After";
        let mut masked = mask(text);
        masked.transform(|_| "completely replaced".to_string());
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn unmask_fails_closed_on_duplicated_sentinel() {
        let text = "Before `code` After";
        let mut masked = mask(text);
        masked.transform(|t| format!("{t} {t}"));
        assert_eq!(masked.unmask(), text);
    }

    #[test]
    fn with_masking_no_protected_regions() {
        let text = "Simple plain text";
        let result = with_masking(text, |t| t.to_uppercase());
        assert_eq!(result.as_ref(), "SIMPLE PLAIN TEXT");
    }

    #[test]
    fn extract_text_spans_skips_sentinels_and_blanks() {
        let text = "Hello `code` world\n\n";
        let masked = mask(text);
        let spans = extract_text_spans(&masked.masked);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text.trim(), "Hello");
        assert_eq!(spans[1].text.trim(), "world");
    }

    #[test]
    fn extract_text_spans_on_doc_of_only_protected_content_is_empty() {
        let text = "`only code`";
        let masked = mask(text);
        let spans = extract_text_spans(&masked.masked);
        assert!(spans.is_empty());
    }

    #[test]
    fn utf8_is_preserved_across_roundtrip() {
        let text = "Café `code` naïve $x$ done";
        let masked = mask(text);
        assert_eq!(masked.unmask(), text);
    }
}
