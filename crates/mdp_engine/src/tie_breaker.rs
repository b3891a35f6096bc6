//! Merges a later stage's rewrite into the current text one character-level
//! opcode at a time, vetoing any edit that would touch or reintroduce a
//! hazard, and logging every decision.

use crate::hazard_detector::detect_hazards;
use mdp_domain::decision::DecisionRecord;
use mdp_domain::hazard::HazardSpan;
use similar::{Algorithm, TextDiff};
use std::collections::HashSet;

pub trait DecisionSink {
    fn record(&mut self, record: DecisionRecord);
}

impl DecisionSink for Vec<DecisionRecord> {
    fn record(&mut self, record: DecisionRecord) {
        self.push(record);
    }
}

pub struct TieBreakerConfig<'a> {
    pub stage_name: &'a str,
    pub acronym_whitelist: &'a HashSet<String>,
}

/// Merges `stage_text` into `current` opcode by opcode, applying §4.10's
/// veto rules, and shifting `hazard_spans` after every accepted edit so the
/// mask stays aligned with the evolving text.
pub fn tie_break(
    current: &str,
    stage_text: &str,
    hazard_spans: &mut Vec<HazardSpan>,
    cfg: &TieBreakerConfig,
    sink: &mut dyn DecisionSink,
) -> String {
    if current == stage_text {
        return current.to_string();
    }

    let diff = TextDiff::configure().algorithm(Algorithm::Myers).diff_chars(current, stage_text);
    let mut result = String::with_capacity(stage_text.len());

    for op in diff.ops() {
        let old_range = op.old_range();
        let new_range = op.new_range();
        let before = &current[old_range.clone()];
        let after = &stage_text[new_range.clone()];

        if before == after {
            result.push_str(before);
            continue;
        }

        let decision = decide(before, after, old_range.start, old_range.end, hazard_spans, cfg);
        match decision {
            Decision::Apply => {
                let delta = after.len() as i64 - before.len() as i64;
                for span in hazard_spans.iter_mut() {
                    span.shift_after(old_range.end, delta);
                }
                result.push_str(after);
                sink.record(DecisionRecord::new(cfg.stage_name, "apply", before, after, (old_range.start, old_range.end)));
            }
            Decision::Skip(reason) => {
                result.push_str(before);
                sink.record(DecisionRecord::new(cfg.stage_name, reason, before, before, (old_range.start, old_range.end)));
            }
        }
    }

    result
}

enum Decision {
    Apply,
    Skip(&'static str),
}

fn decide(before: &str, after: &str, start: usize, end: usize, hazard_spans: &[HazardSpan], cfg: &TieBreakerConfig) -> Decision {
    if hazard_spans.iter().any(|h| h.overlaps(start, end)) {
        return Decision::Skip("protected_span");
    }

    if cfg.stage_name == "tts-fixer" {
        let is_shout = before.chars().all(|c| c.is_uppercase()) && !before.is_empty();
        if is_shout && cfg.acronym_whitelist.contains(before) {
            return Decision::Skip("preserve_acronym");
        }
        if is_shout && before.chars().count() <= 5 && !after.chars().all(|c| c.is_uppercase()) {
            return Decision::Skip("preserve_acronym");
        }
    }

    let after_hazards = detect_hazards(after, cfg.acronym_whitelist);
    if !after_hazards.is_empty() {
        return Decision::Skip("hazard_detected");
    }

    Decision::Apply
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg<'a>(whitelist: &'a HashSet<String>) -> TieBreakerConfig<'a> {
        TieBreakerConfig { stage_name: "grammar", acronym_whitelist: whitelist }
    }

    #[test]
    fn identical_inputs_are_a_noop() {
        let whitelist = HashSet::new();
        let mut hazards = Vec::new();
        let mut log = Vec::new();
        let out = tie_break("same text", "same text", &mut hazards, &cfg(&whitelist), &mut log);
        assert_eq!(out, "same text");
        assert!(log.is_empty());
    }

    #[test]
    fn applies_a_safe_edit() {
        let whitelist = HashSet::new();
        let mut hazards = Vec::new();
        let mut log = Vec::new();
        let out = tie_break("I recieve mail", "I receive mail", &mut hazards, &cfg(&whitelist), &mut log);
        assert_eq!(out, "I receive mail");
        assert!(log.iter().any(|r| r.rule == "apply"));
    }

    #[test]
    fn skips_edit_that_intersects_a_hazard_span() {
        let whitelist = HashSet::new();
        let mut hazards = vec![HazardSpan { start: 2, end: 9, reason: mdp_domain::hazard::HazardReason::SpacedLetters }];
        let mut log = Vec::new();
        let out = tie_break("T H I S is loud", "THIS stuff is loud", &mut hazards, &cfg(&whitelist), &mut log);
        assert!(out.contains("T H I S"));
        assert!(log.iter().any(|r| r.rule == "protected_span"));
    }

    #[test]
    fn skips_edit_that_reintroduces_a_hazard() {
        let whitelist = HashSet::new();
        let mut hazards = Vec::new();
        let mut log = Vec::new();
        let out = tie_break("fine here", "f i n e here", &mut hazards, &cfg(&whitelist), &mut log);
        assert_eq!(out, "fine here");
        assert!(log.iter().any(|r| r.rule == "hazard_detected"));
    }

    #[test]
    fn preserves_short_acronym_like_word_in_tts_fixer_stage() {
        let whitelist = HashSet::new();
        let mut hazards = Vec::new();
        let mut log = Vec::new();
        let fixer_cfg = TieBreakerConfig { stage_name: "tts-fixer", acronym_whitelist: &whitelist };
        let out = tie_break("say NASA now", "say Nasa now", &mut hazards, &fixer_cfg, &mut log);
        assert!(out.contains("NASA"));
    }
}
