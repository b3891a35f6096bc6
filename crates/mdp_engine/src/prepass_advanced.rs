//! Policy-driven casing, punctuation, units, ellipsis, quotes, and time
//! rewriting, run after the deterministic basic pre-pass.

use mdp_domain::report::StageStats;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunsPolicy {
    FirstOnly,
    FirstOfEach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EllipsisPolicy {
    ThreeDots,
    Unicode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceBeforeUnit {
    Normal,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStyle {
    PeriodAbbrev,
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceSpacing {
    Single,
    Double,
}

pub struct PrepassAdvancedConfig {
    pub shouting_min_len: usize,
    pub acronym_whitelist: HashSet<String>,
    pub protected_lexicon: HashSet<String>,
    pub runs_policy: RunsPolicy,
    pub ellipsis: EllipsisPolicy,
    pub sentence_spacing: SentenceSpacing,
    pub join_percent: bool,
    pub space_before_unit: SpaceBeforeUnit,
    pub time_style: TimeStyle,
    pub footnotes_enabled: bool,
}

impl Default for PrepassAdvancedConfig {
    fn default() -> Self {
        let acronym_whitelist = ["NASA", "API", "GPU", "HTML", "TTS", "JSON", "CPU", "URL", "HTTP"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let protected_lexicon = ["AAAAAA", "BLUH"].iter().map(|s| s.to_string()).collect();
        Self {
            shouting_min_len: 4,
            acronym_whitelist,
            protected_lexicon,
            runs_policy: RunsPolicy::FirstOfEach,
            ellipsis: EllipsisPolicy::ThreeDots,
            sentence_spacing: SentenceSpacing::Single,
            join_percent: true,
            space_before_unit: SpaceBeforeUnit::Normal,
            time_style: TimeStyle::PeriodAbbrev,
            footnotes_enabled: false,
        }
    }
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]+").unwrap())
}

fn apply_casing(text: &str, cfg: &PrepassAdvancedConfig, stats: &mut StageStats) -> String {
    let mut changed = false;
    let result = word_re()
        .replace_all(text, |caps: &Captures| {
            let word = &caps[0];
            let is_shout = word.len() >= cfg.shouting_min_len
                && word.chars().all(|c| c.is_ascii_uppercase())
                && !cfg.acronym_whitelist.contains(word)
                && !cfg.protected_lexicon.contains(word);
            if is_shout {
                changed = true;
                stats.incr("shouting_title_cased");
                title_case(word)
            } else {
                word.to_string()
            }
        })
        .into_owned();
    let _ = changed;
    result
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn punctuation_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[!?]{2,}").unwrap())
}

fn collapse_punctuation_runs(text: &str, cfg: &PrepassAdvancedConfig, stats: &mut StageStats) -> String {
    punctuation_run_re()
        .replace_all(text, |caps: &Captures| {
            let run = &caps[0];
            stats.incr("punctuation_runs_collapsed");
            match cfg.runs_policy {
                RunsPolicy::FirstOnly => run.chars().next().unwrap().to_string(),
                RunsPolicy::FirstOfEach => {
                    let mut seen = Vec::new();
                    for c in run.chars() {
                        if !seen.contains(&c) {
                            seen.push(c);
                        }
                    }
                    seen.into_iter().collect()
                }
            }
        })
        .into_owned()
}

fn dot_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{2,}").unwrap())
}

fn apply_ellipsis(text: &str, cfg: &PrepassAdvancedConfig, stats: &mut StageStats) -> String {
    match cfg.ellipsis {
        EllipsisPolicy::ThreeDots => {
            let out = text.replace('\u{2026}', "...");
            dot_run_re()
                .replace_all(&out, |_: &Captures| {
                    stats.incr("ellipsis_normalized");
                    "..."
                })
                .into_owned()
        }
        EllipsisPolicy::Unicode => dot_run_re()
            .replace_all(text, |caps: &Captures| {
                if caps[0].len() >= 3 {
                    stats.incr("ellipsis_normalized");
                    "\u{2026}".to_string()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned(),
    }
}

fn apply_quotes(text: &str) -> String {
    text.replace(['\u{201C}', '\u{201D}'], "\"").replace(['\u{2018}', '\u{2019}'], "'")
}

fn sentence_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([.!?;:])[ \t]{2,}").unwrap())
}

/// Matches a period followed by whitespace and an uppercase letter; the
/// letter is captured (not looked ahead past) so the plain `regex` crate
/// can express the "only before a new sentence" constraint without
/// lookaround support.
fn double_space_after_period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\.)([ \t]+)([A-Z])").unwrap())
}

fn space_before_punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+([.!?;:,])").unwrap())
}

fn normalize_sentence_spacing(text: &str, cfg: &PrepassAdvancedConfig, stats: &mut StageStats) -> String {
    let step1 = match cfg.sentence_spacing {
        SentenceSpacing::Single => sentence_space_re()
            .replace_all(text, |caps: &Captures| {
                stats.incr("sentence_spacing_collapsed");
                format!("{} ", &caps[1])
            })
            .into_owned(),
        SentenceSpacing::Double => double_space_after_period_re()
            .replace_all(text, |caps: &Captures| {
                if &caps[2] != "  " {
                    stats.incr("sentence_spacing_collapsed");
                }
                format!("{}  {}", &caps[1], &caps[3])
            })
            .into_owned(),
    };
    space_before_punct_re().replace_all(&step1, "$1").into_owned()
}

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d)\s+%").unwrap())
}

fn unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d)\s*(°C|°F|km|kg|ms|cm|mm|kb|mb|gb)\b").unwrap())
}

fn normalize_units(text: &str, cfg: &PrepassAdvancedConfig, stats: &mut StageStats) -> String {
    let mut out = text.to_string();
    if cfg.join_percent {
        out = percent_re()
            .replace_all(&out, |caps: &Captures| {
                stats.incr("percent_joined");
                format!("{}%", &caps[1])
            })
            .into_owned();
    }
    out = unit_re()
        .replace_all(&out, |caps: &Captures| {
            stats.incr("unit_spacing_normalized");
            match cfg.space_before_unit {
                SpaceBeforeUnit::Normal => format!("{} {}", &caps[1], &caps[2]),
                SpaceBeforeUnit::None => format!("{}{}", &caps[1], &caps[2]),
            }
        })
        .into_owned();
    out
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d{1,2}(?::\d{2})?)\s*(am|pm|a\.m\.|p\.m\.)").unwrap())
}

fn normalize_time(text: &str, cfg: &PrepassAdvancedConfig, stats: &mut StageStats) -> String {
    time_re()
        .replace_all(text, |caps: &Captures| {
            stats.incr("time_normalized");
            let is_pm = caps[2].to_lowercase().starts_with('p');
            let suffix = match (cfg.time_style, is_pm) {
                (TimeStyle::PeriodAbbrev, true) => "p.m.",
                (TimeStyle::PeriodAbbrev, false) => "a.m.",
                (TimeStyle::Upper, true) => "PM",
                (TimeStyle::Upper, false) => "AM",
                (TimeStyle::Lower, true) => "pm",
                (TimeStyle::Lower, false) => "am",
            };
            format!("{} {}", &caps[1], suffix)
        })
        .into_owned()
}

fn footnote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\[\^\d+\]|\[\d+\]|\(\d+\))(?!:)").unwrap())
}

fn strip_footnotes(text: &str, cfg: &PrepassAdvancedConfig, stats: &mut StageStats) -> String {
    if !cfg.footnotes_enabled {
        return text.to_string();
    }
    footnote_re()
        .replace_all(text, |_: &Captures| {
            stats.incr("footnotes_stripped");
            ""
        })
        .into_owned()
}

/// Runs every advanced policy operation in fixed order.
pub fn apply_policies(text: &str, cfg: &PrepassAdvancedConfig, stats: &mut StageStats) -> String {
    let t = apply_casing(text, cfg, stats);
    let t = collapse_punctuation_runs(&t, cfg, stats);
    let t = apply_ellipsis(&t, cfg, stats);
    let t = apply_quotes(&t);
    let t = normalize_sentence_spacing(&t, cfg, stats);
    let t = normalize_units(&t, cfg, stats);
    let t = normalize_time(&t, cfg, stats);
    strip_footnotes(&t, cfg, stats)
}
