//! Deterministic Unicode/whitespace/hyphenation normalization, run once per
//! text span before any policy-driven rewriting happens.

use mdp_domain::report::StageStats;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy)]
pub enum NbspHandling {
    Space,
    Keep,
}

#[derive(Debug, Clone, Copy)]
pub enum QuotesPolicy {
    Straight,
    Keep,
}

#[derive(Debug, Clone, Copy)]
pub enum DashesPolicy {
    Em,
    En,
    Hyphen,
}

impl DashesPolicy {
    fn target(self) -> char {
        match self {
            Self::Em => '\u{2014}',
            Self::En => '\u{2013}',
            Self::Hyphen => '-',
        }
    }
}

pub struct PrepassBasicConfig {
    pub nbsp_handling: NbspHandling,
    pub quotes_policy: QuotesPolicy,
    pub dashes_policy: DashesPolicy,
}

impl Default for PrepassBasicConfig {
    fn default() -> Self {
        Self { nbsp_handling: NbspHandling::Space, quotes_policy: QuotesPolicy::Straight, dashes_policy: DashesPolicy::Em }
    }
}

/// Strip zero-width characters, bidi controls, and soft hyphens.
fn strip_invisible(text: &str) -> Cow<'_, str> {
    let has_any = text.chars().any(is_invisible);
    if !has_any {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.chars().filter(|c| !is_invisible(*c)).collect())
}

fn is_invisible(c: char) -> bool {
    matches!(c,
        '\u{200B}'..='\u{200D}' | '\u{FEFF}' | '\u{00AD}'
        | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}')
}

fn nbsp_to_space<'a>(text: &'a str, cfg: &PrepassBasicConfig) -> Cow<'a, str> {
    if !matches!(cfg.nbsp_handling, NbspHandling::Space) || !text.contains('\u{00A0}') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace('\u{00A0}', " "))
}

fn dash_family_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\u{2010}-\u{2015}\u{2212}]").unwrap())
}

/// Standardize ellipsis, curly quotes, and the dash family.
fn standardize_punctuation<'a>(text: &'a str, cfg: &PrepassBasicConfig) -> Cow<'a, str> {
    let mut out = text.replace('\u{2026}', "...");
    if matches!(cfg.quotes_policy, QuotesPolicy::Straight) {
        out = out.replace(['\u{201C}', '\u{201D}'], "\"").replace(['\u{2018}', '\u{2019}'], "'");
    }
    let target = cfg.dashes_policy.target();
    out = dash_family_re().replace_all(&out, target.to_string().as_str()).into_owned();
    if out == text {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(out)
    }
}

/// Join spaced-out letter runs: a run of >= 3 alphabetic characters
/// separated by `[\s.,]+` collapses to a single word. A run of only 2 or 3
/// letters separated purely by plain spaces is left alone.
fn join_spaced_letters(text: &str) -> Cow<'_, str> {
    let sep_re = spaced_letter_sep_re();
    let mut result = String::with_capacity(text.len());
    let mut changed = false;
    let mut last_end = 0usize;

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;
    while i < chars.len() {
        let (start, c) = chars[i];
        if c.is_alphabetic() {
            let mut letters = vec![c];
            let mut j = i + 1;
            let mut all_plain_space = true;
            let mut end = start + c.len_utf8();
            loop {
                // try to consume a separator run then a letter
                let sep_start = j;
                let mut sep_end = j;
                while sep_end < chars.len() && is_join_sep(chars[sep_end].1) {
                    if chars[sep_end].1 != ' ' {
                        all_plain_space = false;
                    }
                    sep_end += 1;
                }
                if sep_end == sep_start || sep_end >= chars.len() || !chars[sep_end].1.is_alphabetic() {
                    break;
                }
                letters.push(chars[sep_end].1);
                end = chars[sep_end].0 + chars[sep_end].1.len_utf8();
                j = sep_end + 1;
            }

            if letters.len() >= 3 && !(all_plain_space && letters.len() < 4) {
                result.push_str(&text[last_end..start]);
                for l in &letters {
                    result.push(*l);
                }
                last_end = end;
                changed = true;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    result.push_str(&text[last_end..]);
    let _ = sep_re;
    if changed {
        Cow::Owned(result)
    } else {
        Cow::Borrowed(text)
    }
}

fn is_join_sep(c: char) -> bool {
    c.is_whitespace() || c == '.' || c == ','
}

fn spaced_letter_sep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s.,]+").unwrap())
}

fn hyphenation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-zA-Z])-\n\s*([a-zA-Z])").unwrap())
}

/// Heal end-of-line hyphenation: `word-\n   cont` -> `wordcont`.
fn heal_hyphenation(text: &str) -> Cow<'_, str> {
    hyphenation_re().replace_all(text, "$1$2")
}

/// Runs every basic normalization operation in fixed order, bumping
/// `stats` counters named after each operation.
pub fn normalize(text: &str, cfg: &PrepassBasicConfig, stats: &mut StageStats) -> String {
    let step1 = strip_invisible(text);
    if matches!(step1, Cow::Owned(_)) {
        stats.incr("stripped_invisible");
    }
    let step2 = nbsp_to_space(&step1, cfg);
    if matches!(step2, Cow::Owned(_)) {
        stats.incr("nbsp_converted");
    }
    let step3 = standardize_punctuation(&step2, cfg);
    if matches!(step3, Cow::Owned(_)) {
        stats.incr("punctuation_standardized");
    }
    let step4 = join_spaced_letters(&step3);
    if matches!(step4, Cow::Owned(_)) {
        stats.incr("spaced_letters_joined");
    }
    let step5 = heal_hyphenation(&step4);
    if matches!(step5, Cow::Owned(_)) {
        stats.incr("hyphenation_healed");
    }
    step5.into_owned()
}
