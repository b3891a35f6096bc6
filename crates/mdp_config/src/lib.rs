//! Layered YAML configuration.
//!
//! Merge semantics are deliberately shallow: a top-level key present in the
//! user document entirely replaces the corresponding default, including
//! everything nested under it. This mirrors the behavior of the pipeline
//! this crate reimplements and is called out as a surprising compatibility
//! choice rather than an oversight — see the project's design notes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config file did not contain a YAML mapping at its root")]
    NotAMapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnicodeForm {
    Nfc,
    Nfkc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotesPolicy {
    Straight,
    Curly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashesPolicy {
    Em,
    En,
    Hyphen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NbspHandling {
    Space,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunsPolicy {
    FirstOnly,
    FirstOfEach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EllipsisPolicy {
    ThreeDots,
    Unicode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceBeforeUnit {
    Normal,
    None,
    Nbsp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeStyle {
    #[serde(rename = "p.m.")]
    PeriodStyle,
    #[serde(rename = "PM")]
    UpperNoPeriod,
    #[serde(rename = "pm")]
    LowerNoPeriod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PrepassAdvancedConfig {
    pub casing: CasingConfig,
    pub punctuation: PunctuationConfig,
    pub numbers_units: NumbersUnitsConfig,
    pub footnotes: FootnotesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasingConfig {
    pub enabled: bool,
    pub shouting_min_len: usize,
    pub acronym_whitelist: Vec<String>,
    pub protected_lexicon: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunctuationConfig {
    pub runs_policy: RunsPolicy,
    pub ellipsis: EllipsisPolicy,
    pub quotes: QuotesPolicy,
    pub sentence_spacing: SentenceSpacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceSpacing {
    Single,
    Double,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumbersUnitsConfig {
    pub join_percent: bool,
    pub space_before_unit: SpaceBeforeUnit,
    pub time_style: TimeStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootnotesConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubberCategories {
    pub authors_notes: bool,
    pub translators_notes: bool,
    pub editors_notes: bool,
    pub navigation: bool,
    pub promos_ads_social: bool,
    pub link_farms: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubberKeywords {
    pub navigation: Vec<String>,
    pub promos: Vec<String>,
    pub watermarks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubberWhitelist {
    pub headings_keep: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubberConfig {
    pub enabled: bool,
    pub categories: ScrubberCategories,
    pub keywords: ScrubberKeywords,
    pub whitelist: ScrubberWhitelist,
    pub edge_block_window: usize,
    pub min_chars_to_strip: usize,
    pub link_density_threshold: f64,
    pub move_to_appendix: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarAssistConfig {
    pub enabled: bool,
    pub api_base: String,
    pub language: String,
    pub safe_categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub enabled: bool,
    pub api_base: String,
    pub model: String,
    pub timeout_s: u64,
    pub retries: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub max_context_tokens: u32,
    pub max_output_chars: usize,
    pub max_chunk_size: usize,
    pub overlap_size: usize,
    pub json_max_items: usize,
    pub max_reason_chars: usize,
    pub allow_categories: Vec<String>,
    pub block_categories: Vec<String>,
    pub locale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyConfig {
    pub max_file_growth_ratio: f64,
    pub reject_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixerConfig {
    pub enabled: bool,
    pub api_base: String,
    pub model: String,
    pub max_output_tokens: u32,
    pub seed: Option<u64>,
    pub node_max_growth_ratio: f64,
    pub file_max_growth_ratio: f64,
    pub forbid_markdown_tokens: bool,
    pub locale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub unicode_form: UnicodeForm,
    pub normalize_punctuation: bool,
    pub quotes_policy: QuotesPolicy,
    pub dashes_policy: DashesPolicy,
    pub nbsp_handling: NbspHandling,
    pub prepass_advanced: PrepassAdvancedConfig,
    pub scrubber: ScrubberConfig,
    pub grammar_assist: GrammarAssistConfig,
    pub detector: DetectorConfig,
    pub apply: ApplyConfig,
    pub fixer: FixerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unicode_form: UnicodeForm::Nfkc,
            normalize_punctuation: true,
            quotes_policy: QuotesPolicy::Straight,
            dashes_policy: DashesPolicy::Em,
            nbsp_handling: NbspHandling::Space,
            prepass_advanced: PrepassAdvancedConfig {
                casing: CasingConfig {
                    enabled: true,
                    shouting_min_len: 4,
                    acronym_whitelist: vec![
                        "NASA", "API", "GPU", "CPU", "HTML", "TTS", "JSON", "URL", "HTTP", "HTTPS",
                    ]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                    protected_lexicon: Vec::new(),
                },
                punctuation: PunctuationConfig {
                    runs_policy: RunsPolicy::FirstOfEach,
                    ellipsis: EllipsisPolicy::ThreeDots,
                    quotes: QuotesPolicy::Straight,
                    sentence_spacing: SentenceSpacing::Single,
                },
                numbers_units: NumbersUnitsConfig {
                    join_percent: true,
                    space_before_unit: SpaceBeforeUnit::Normal,
                    time_style: TimeStyle::PeriodStyle,
                },
                footnotes: FootnotesConfig { enabled: false },
            },
            scrubber: ScrubberConfig {
                enabled: true,
                categories: ScrubberCategories {
                    authors_notes: true,
                    translators_notes: true,
                    editors_notes: true,
                    navigation: true,
                    promos_ads_social: true,
                    link_farms: true,
                },
                keywords: ScrubberKeywords {
                    navigation: vec!["next chapter", "previous chapter", "table of contents", "read more"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    promos: vec!["subscribe", "patreon", "follow us", "sponsored"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    watermarks: vec!["scanned by", "translated by", "proofread by"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                },
                whitelist: ScrubberWhitelist { headings_keep: Vec::new() },
                edge_block_window: 6,
                min_chars_to_strip: 12,
                link_density_threshold: 0.50,
                move_to_appendix: true,
            },
            grammar_assist: GrammarAssistConfig {
                enabled: false,
                api_base: "http://localhost:8081/v2".to_string(),
                language: "en-US".to_string(),
                safe_categories: vec!["TYPOS", "PUNCTUATION", "CASING", "SPACING", "SIMPLE_AGREEMENT"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
            detector: DetectorConfig {
                enabled: true,
                api_base: "http://localhost:8080/v1".to_string(),
                model: "local-small".to_string(),
                timeout_s: 8,
                retries: 1,
                temperature: 0.2,
                top_p: 0.9,
                max_context_tokens: 1024,
                max_output_chars: 2000,
                max_chunk_size: 600,
                overlap_size: 50,
                json_max_items: 16,
                max_reason_chars: 120,
                allow_categories: Vec::new(),
                block_categories: Vec::new(),
                locale: "en-US".to_string(),
            },
            apply: ApplyConfig { max_file_growth_ratio: 0.01, reject_dir: None },
            fixer: FixerConfig {
                enabled: false,
                api_base: "http://localhost:8080/v1".to_string(),
                model: "local-large".to_string(),
                max_output_tokens: 768,
                seed: Some(0),
                node_max_growth_ratio: 0.20,
                file_max_growth_ratio: 0.05,
                forbid_markdown_tokens: true,
                locale: "en-US".to_string(),
            },
        }
    }
}

/// Loads config, applying the shallow-merge semantics documented above. A
/// missing `path` simply returns the shipped defaults.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let default_value = serde_yaml::to_value(PipelineConfig::default())?;
    let Some(path) = path else {
        return Ok(serde_yaml::from_value(default_value)?);
    };
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
    let user_value: serde_yaml::Value = serde_yaml::from_str(&raw)?;
    let merged = shallow_merge(default_value, user_value)?;
    Ok(serde_yaml::from_value(merged)?)
}

fn shallow_merge(default: serde_yaml::Value, user: serde_yaml::Value) -> Result<serde_yaml::Value, ConfigError> {
    let serde_yaml::Value::Mapping(mut default_map) = default else {
        return Err(ConfigError::NotAMapping);
    };
    let serde_yaml::Value::Mapping(user_map) = user else {
        return Err(ConfigError::NotAMapping);
    };
    for (key, value) in user_map {
        default_map.insert(key, value);
    }
    Ok(serde_yaml::Value::Mapping(default_map))
}
