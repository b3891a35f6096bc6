//! Scans prose for the three TTS hazard shapes the deterministic pre-pass
//! is meant to have already eliminated: spaced-out letters, shouted
//! non-acronym words, and stylized Unicode.

use mdp_domain::hazard::{merge_hazards, HazardReason, HazardSpan};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use unicode_categories::UnicodeCategories;

fn spaced_letters_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w([\s,\-]\w){3,}\b").unwrap())
}

/// Phonetic-extension code points, Unicode categories `Lm`/`Sk`, and names
/// containing `SMALL CAPITAL`/`MODIFIER LETTER` all flag small-caps and
/// modifier-letter styling the deterministic pre-pass cannot normalize
/// (most "LATIN LETTER SMALL CAPITAL X" glyphs are themselves category
/// `Ll`, so the ranges and category checks alone miss them — the name
/// check is load-bearing, not redundant).
fn is_stylized(c: char) -> bool {
    let cp = c as u32;
    let in_phonetic_extensions =
        (0x1D00..=0x1D7F).contains(&cp) || (0x1D80..=0x1DBF).contains(&cp) || (0x1E00..=0x1EFF).contains(&cp);
    if in_phonetic_extensions {
        return true;
    }
    if c.is_letter_modifier() || c.is_symbol_modifier() {
        return true;
    }
    match unicode_names2::name(c) {
        Some(name) => {
            let name = name.to_string();
            name.contains("SMALL CAPITAL") || name.contains("MODIFIER LETTER")
        }
        None => false,
    }
}

/// Detects spaced-letter runs, shouted non-acronym words (>=6 chars), and
/// stylized Unicode blocks, returning a merged, sorted span list.
pub fn detect_hazards(text: &str, acronym_whitelist: &HashSet<String>) -> Vec<HazardSpan> {
    let mut spans = Vec::new();

    for m in spaced_letters_re().find_iter(text) {
        spans.push(HazardSpan { start: m.start(), end: m.end(), reason: HazardReason::SpacedLetters });
    }

    for m in uppercase_word_re().find_iter(text) {
        let word = m.as_str();
        if word.len() >= 6 && !acronym_whitelist.contains(word) {
            spans.push(HazardSpan { start: m.start(), end: m.end(), reason: HazardReason::UppercaseNonAcronym });
        }
    }

    let mut run_start: Option<usize> = None;
    for (idx, c) in text.char_indices() {
        if is_stylized(c) {
            if run_start.is_none() {
                run_start = Some(idx);
            }
        } else if let Some(start) = run_start.take() {
            spans.push(HazardSpan { start, end: idx, reason: HazardReason::StylizedUnicode });
        }
    }
    if let Some(start) = run_start {
        spans.push(HazardSpan { start, end: text.len(), reason: HazardReason::StylizedUnicode });
    }

    merge_hazards(spans)
}

fn uppercase_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{6,}\b").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist() -> HashSet<String> {
        ["NASA".to_string()].into_iter().collect()
    }

    #[test]
    fn detects_spaced_letters() {
        let spans = detect_hazards("this is T H I S loud", &whitelist());
        assert!(spans.iter().any(|s| s.reason == HazardReason::SpacedLetters));
    }

    #[test]
    fn detects_long_shouting_words_but_not_acronyms() {
        let spans = detect_hazards("SCREAMING but NASA is fine", &whitelist());
        assert!(spans.iter().any(|s| s.reason == HazardReason::UppercaseNonAcronym));
        assert!(spans.iter().all(|s| &"SCREAMING but NASA is fine"[s.start..s.end] != "NASA"));
    }

    #[test]
    fn detects_stylized_unicode_block() {
        let spans = detect_hazards("normal \u{1D00}\u{1D01} text", &whitelist());
        assert!(spans.iter().any(|s| s.reason == HazardReason::StylizedUnicode));
    }

    #[test]
    fn detects_small_capital_letters_outside_phonetic_ranges() {
        // By My Resolve! — the small-capital glyphs here (U+028F, U+0299, U+0262,
        // U+029C, U+029F, U+0274) are category Ll, not Lm/Sk, and fall outside the
        // phonetic-extension code point ranges; only the Unicode name carries
        // "LATIN LETTER SMALL CAPITAL" for them.
        let spans = detect_hazards("B\u{028F} M\u{028F} R\u{0274}s\u{0274}\u{029F}v\u{0274}!", &whitelist());
        assert!(spans.iter().any(|s| s.reason == HazardReason::StylizedUnicode));
    }

    #[test]
    fn clean_text_has_no_hazards() {
        let spans = detect_hazards("Nothing unusual here at all.", &whitelist());
        assert!(spans.is_empty());
    }
}
