//! Structural validator: seven hard stops applied to an (original, edited)
//! document pair. Any failure means the edit is rejected wholesale.

use mdp_domain::mask::MaskTable;
use std::collections::HashMap;

const MARKDOWN_TOKEN_GUARD_CHARS: &[char] = &['*', '_', '[', ']', '(', ')', '`', '~', '<', '>', ' ', '\t'];

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MaskParity { sentinel: String, before: usize, after: usize },
    BacktickParity { before: usize, after: usize },
    BracketBalance { bracket: char, before: i64, after: i64 },
    LinkSanity { before: usize, after: usize },
    FenceParity { before: usize, after: usize },
    MarkdownTokenGuard { token: char, before: usize, after: usize },
    LengthDeltaBudget { ratio: f64, max: f64 },
}

pub struct ValidatorConfig {
    pub max_file_growth_ratio: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { max_file_growth_ratio: 0.01 }
    }
}

fn count_char(text: &str, c: char) -> usize {
    text.matches(c).count()
}

fn bracket_balance(text: &str, open: char, close: char) -> Result<i64, ()> {
    let mut depth: i64 = 0;
    for c in text.chars() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth < 0 {
                return Err(());
            }
        }
    }
    Ok(depth)
}

fn check_mask_parity(original: &str, edited: &str, table: &MaskTable) -> Result<(), ValidationError> {
    for sentinel in table.sentinels() {
        let before = original.matches(sentinel).count();
        let after = edited.matches(sentinel).count();
        if before != after {
            return Err(ValidationError::MaskParity { sentinel: sentinel.to_string(), before, after });
        }
    }
    Ok(())
}

fn check_backtick_parity(original: &str, edited: &str) -> Result<(), ValidationError> {
    let before = count_char(original, '`');
    let after = count_char(edited, '`');
    if before != after || before % 2 != after % 2 {
        return Err(ValidationError::BacktickParity { before, after });
    }
    Ok(())
}

fn check_bracket_balance(original: &str, edited: &str) -> Result<(), ValidationError> {
    for (open, close) in [('[', ']'), ('(', ')'), ('{', '}')] {
        let before_count = count_char(original, open) + count_char(original, close);
        let after_count = count_char(edited, open) + count_char(edited, close);
        if before_count != after_count {
            return Err(ValidationError::BracketBalance { bracket: open, before: before_count as i64, after: after_count as i64 });
        }
        if bracket_balance(edited, open, close).is_err() {
            return Err(ValidationError::BracketBalance { bracket: open, before: 0, after: -1 });
        }
    }
    Ok(())
}

fn check_link_sanity(original: &str, edited: &str) -> Result<(), ValidationError> {
    let before = original.matches("](").count();
    let after = edited.matches("](").count();
    if before != after {
        return Err(ValidationError::LinkSanity { before, after });
    }
    Ok(())
}

fn check_fence_parity(original: &str, edited: &str) -> Result<(), ValidationError> {
    let before = original.matches("```").count();
    let after = edited.matches("```").count();
    if before != after || after % 2 != 0 {
        return Err(ValidationError::FenceParity { before, after });
    }
    Ok(())
}

fn check_markdown_token_guard(original: &str, edited: &str) -> Result<(), ValidationError> {
    let mut before_counts: HashMap<char, usize> = HashMap::new();
    let mut after_counts: HashMap<char, usize> = HashMap::new();
    for &token in MARKDOWN_TOKEN_GUARD_CHARS {
        before_counts.insert(token, count_char(original, token));
        after_counts.insert(token, count_char(edited, token));
    }
    for &token in MARKDOWN_TOKEN_GUARD_CHARS {
        let before = before_counts[&token];
        let after = after_counts[&token];
        if after > before {
            return Err(ValidationError::MarkdownTokenGuard { token, before, after });
        }
    }
    Ok(())
}

fn check_length_delta_budget(original: &str, edited: &str, cfg: &ValidatorConfig) -> Result<(), ValidationError> {
    if original.is_empty() {
        return Ok(());
    }
    let ratio = (edited.len() as f64 - original.len() as f64) / original.len() as f64;
    if ratio > cfg.max_file_growth_ratio {
        return Err(ValidationError::LengthDeltaBudget { ratio, max: cfg.max_file_growth_ratio });
    }
    Ok(())
}

/// Runs all seven hard stops in spec order, short-circuiting at the first
/// failure (matches the "all-or-nothing" contract: one failure rejects
/// the whole edit regardless of how many other checks would also fail).
pub fn validate(original: &str, edited: &str, table: &MaskTable, cfg: &ValidatorConfig) -> Result<(), ValidationError> {
    check_mask_parity(original, edited, table)?;
    check_backtick_parity(original, edited)?;
    check_bracket_balance(original, edited)?;
    check_link_sanity(original, edited)?;
    check_fence_parity(original, edited)?;
    check_markdown_token_guard(original, edited)?;
    check_length_delta_budget(original, edited, cfg)
}
