//! Orchestrates the full rewrite pipeline over one document: mask, pre-pass,
//! scrub, optional grammar assist, detect, apply, validate, optional fix,
//! tie-break, post-check, unmask, report.

use crate::{applier, detector, fixer, grammar_assist, hazard_detector, masking, prepass_advanced, prepass_basic, scrubber, tie_breaker, validator};
use mdp_config::PipelineConfig;
use mdp_domain::report::RunReport;
use mdp_llm::ChatClient;
use std::collections::HashSet;

pub struct PipelineOutcome {
    pub output_text: String,
    pub report: RunReport,
    pub appendix: Option<String>,
    pub decisions: Vec<mdp_domain::decision::DecisionRecord>,
    pub plan: mdp_domain::plan::Plan,
    /// `false` only when the final document still carries a hazard span;
    /// recoverable on its own (see `structurally_ok`).
    pub hazard_free: bool,
    /// `false` when the final document fails a §4.8 structural check
    /// against the original input; callers should treat this as fatal.
    pub structurally_ok: bool,
    pub post_check_ok: bool,
}

const STEPS: &[&str] = &[
    "mask", "prepass_basic", "prepass_advanced", "scrub", "grammar_assist",
    "detect", "apply", "validate", "fix", "tie_break", "post_check", "unmask",
];

/// Runs the full pipeline against `input` using already-constructed
/// detector/fixer clients (the caller owns their lifecycle since they may
/// point at the same or different model endpoints).
pub async fn run(
    input_file: &str,
    input: &str,
    cfg: &PipelineConfig,
    detector_client: Option<&ChatClient>,
    fixer_client: Option<&ChatClient>,
) -> PipelineOutcome {
    let mut report = RunReport::new(input_file, STEPS.iter().map(|s| s.to_string()).collect());
    let mut decisions = Vec::new();

    let masked = masking::mask(input);
    report.stage_mut("mask").set("spans_masked", masked.mask_table().len() as u64);

    let basic_cfg = prepass_basic::PrepassBasicConfig {
        nbsp_handling: match cfg.nbsp_handling {
            mdp_config::NbspHandling::Space => prepass_basic::NbspHandling::Space,
            mdp_config::NbspHandling::Keep => prepass_basic::NbspHandling::Keep,
        },
        quotes_policy: match cfg.quotes_policy {
            mdp_config::QuotesPolicy::Straight => prepass_basic::QuotesPolicy::Straight,
            mdp_config::QuotesPolicy::Curly => prepass_basic::QuotesPolicy::Keep,
        },
        dashes_policy: match cfg.dashes_policy {
            mdp_config::DashesPolicy::Em => prepass_basic::DashesPolicy::Em,
            mdp_config::DashesPolicy::En => prepass_basic::DashesPolicy::En,
            mdp_config::DashesPolicy::Hyphen => prepass_basic::DashesPolicy::Hyphen,
        },
    };
    let basic_text = prepass_basic::normalize(&masked.masked, &basic_cfg, report.stage_mut("prepass_basic"));

    let advanced_cfg = prepass_advanced::PrepassAdvancedConfig {
        shouting_min_len: cfg.prepass_advanced.casing.shouting_min_len,
        acronym_whitelist: cfg.prepass_advanced.casing.acronym_whitelist.iter().cloned().collect(),
        protected_lexicon: cfg.prepass_advanced.casing.protected_lexicon.iter().cloned().collect(),
        runs_policy: match cfg.prepass_advanced.punctuation.runs_policy {
            mdp_config::RunsPolicy::FirstOnly => prepass_advanced::RunsPolicy::FirstOnly,
            mdp_config::RunsPolicy::FirstOfEach => prepass_advanced::RunsPolicy::FirstOfEach,
        },
        ellipsis: match cfg.prepass_advanced.punctuation.ellipsis {
            mdp_config::EllipsisPolicy::ThreeDots => prepass_advanced::EllipsisPolicy::ThreeDots,
            mdp_config::EllipsisPolicy::Unicode => prepass_advanced::EllipsisPolicy::Unicode,
        },
        sentence_spacing: match cfg.prepass_advanced.punctuation.sentence_spacing {
            mdp_config::SentenceSpacing::Single => prepass_advanced::SentenceSpacing::Single,
            mdp_config::SentenceSpacing::Double => prepass_advanced::SentenceSpacing::Double,
        },
        join_percent: cfg.prepass_advanced.numbers_units.join_percent,
        space_before_unit: match cfg.prepass_advanced.numbers_units.space_before_unit {
            mdp_config::SpaceBeforeUnit::None => prepass_advanced::SpaceBeforeUnit::None,
            _ => prepass_advanced::SpaceBeforeUnit::Normal,
        },
        time_style: match cfg.prepass_advanced.numbers_units.time_style {
            mdp_config::TimeStyle::PeriodStyle => prepass_advanced::TimeStyle::PeriodAbbrev,
            mdp_config::TimeStyle::UpperNoPeriod => prepass_advanced::TimeStyle::Upper,
            mdp_config::TimeStyle::LowerNoPeriod => prepass_advanced::TimeStyle::Lower,
        },
        footnotes_enabled: cfg.prepass_advanced.footnotes.enabled,
    };
    let prepass_text = prepass_advanced::apply_policies(&basic_text, &advanced_cfg, report.stage_mut("prepass_advanced"));

    let (scrubbed_text, candidates) = scrubber::scrub(&prepass_text, &cfg.scrubber, report.stage_mut("scrub"));
    let appendix = if cfg.scrubber.move_to_appendix { crate::appendix::render_appendix(&candidates) } else { None };

    let acronym_whitelist: HashSet<String> = cfg.prepass_advanced.casing.acronym_whitelist.iter().cloned().collect();

    let mut current = scrubbed_text.clone();

    if cfg.grammar_assist.enabled {
        // The grammar collaborator is consulted strictly as an HTTP
        // service; a production caller injects suggestions fetched
        // out-of-band. Absent that, this stage is a documented no-op.
        let (grammar_text, reverted) = grammar_assist::assist(&current, Vec::new(), &cfg.grammar_assist, masked.mask_table(), report.stage_mut("grammar_assist"));
        if !reverted {
            let mut hazard_spans = Vec::new();
            let tb_cfg = tie_breaker::TieBreakerConfig { stage_name: "grammar", acronym_whitelist: &acronym_whitelist };
            current = tie_breaker::tie_break(&current, &grammar_text, &mut hazard_spans, &tb_cfg, &mut decisions);
        }
    }

    let mut plan = mdp_domain::plan::Plan::new();
    if let Some(client) = detector_client {
        plan = detector::detect(client, &current, &cfg.detector, report.stage_mut("detect")).await;
    }

    let nodes = vec![applier::ApplyNode { node_index: 0, text: current.clone() }];
    let applied = applier::apply(&nodes, &plan, report.stage_mut("apply"));
    let applied_text = applied.into_iter().next().map(|n| n.text).unwrap_or(current.clone());

    let validator_cfg = validator::ValidatorConfig { max_file_growth_ratio: cfg.apply.max_file_growth_ratio };
    current = match validator::validate(&current, &applied_text, masked.mask_table(), &validator_cfg) {
        Ok(()) => applied_text,
        Err(_) => {
            report.stage_mut("validate").incr("apply_reverted");
            current
        }
    };

    if let Some(client) = fixer_client {
        if cfg.fixer.enabled {
            let fixed_text = fixer::fix_span(client, &current, &cfg.fixer, report.stage_mut("fix")).await;
            let mut hazard_spans = hazard_detector::detect_hazards(&current, &acronym_whitelist);
            let tb_cfg = tie_breaker::TieBreakerConfig { stage_name: "tts-fixer", acronym_whitelist: &acronym_whitelist };
            current = tie_breaker::tie_break(&current, &fixed_text, &mut hazard_spans, &tb_cfg, &mut decisions);
        }
    }

    let final_hazards = hazard_detector::detect_hazards(&current, &acronym_whitelist);
    let output_text = masking::unmask_text(&current, masked.mask_table());
    let hazard_free = final_hazards.is_empty();
    let structurally_ok = validator::validate(input, &output_text, masked.mask_table(), &validator_cfg).is_ok();
    report.stage_mut("post_check").set("hazards_found", final_hazards.len() as u64);

    PipelineOutcome {
        output_text,
        report,
        appendix,
        decisions,
        plan,
        hazard_free,
        structurally_ok,
        post_check_ok: hazard_free && structurally_ok,
    }
}
