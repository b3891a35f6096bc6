use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use mdp_domain::report::StageStats;
use mdp_llm::{ChatClient, ChatClientConfig};
use mdp_storage::decision_log::DecisionLogger;
use mdp_storage::run_dir::RunArtifacts;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

const VALID_STEPS: &[&str] = &["mask", "prepass-basic", "prepass-advanced", "scrubber", "grammar", "detect", "apply", "fix"];

#[derive(Parser)]
#[command(name = "mdp")]
#[command(version, about = "Rewrites Markdown prose into a form safe for text-to-speech synthesis", long_about = None)]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Comma-separated stages to run, in order (mask,prepass-basic,prepass-advanced,scrubber,grammar,detect,apply,fix)
    #[arg(long, value_delimiter = ',')]
    steps: Option<Vec<String>>,

    /// Write the final document here
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// YAML config overriding the shipped defaults
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write the run report (JSON) here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write the detector's merged plan (JSON) here
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Print the detector's plan to stdout and exit without applying it
    #[arg(long)]
    print_plan: bool,

    /// Print a unified diff between input and output to stdout
    #[arg(long)]
    print_diff: bool,

    /// Print the bordered human-readable report to stdout
    #[arg(long)]
    report_pretty: bool,

    /// Run the pipeline but write no files
    #[arg(long)]
    dry_run: bool,

    /// Directory to write the rejected edit when structural validation fails
    #[arg(long)]
    reject_dir: Option<PathBuf>,

    /// Parent directory for run artifacts (default: ./.mdp-runs)
    #[arg(long)]
    runs_base: Option<PathBuf>,

    #[arg(short = 'v', long)]
    verbose: bool,
}

fn report_error(message: impl AsRef<str>) {
    eprintln!("{} {}", style("error:").red().bold(), message.as_ref());
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let _ = mdp_telemetry::init_telemetry(&mdp_telemetry::TelemetryConfig { level, ..Default::default() });

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(format!("{err:#}"));
            ExitCode::from(1)
        }
    }
}

fn validate_steps(steps: &[String]) -> Result<()> {
    for step in steps {
        if !VALID_STEPS.contains(&step.as_str()) {
            anyhow::bail!("unknown stage '{step}', expected one of {VALID_STEPS:?}");
        }
    }
    let position = |name: &str| steps.iter().position(|s| s == name);
    if let (Some(mask), Some(fix)) = (position("mask"), position("fix")) {
        if mask > fix {
            anyhow::bail!("stage order violates prerequisite: mask must precede fix");
        }
    }
    if let (Some(detect), Some(apply)) = (position("detect"), position("apply")) {
        if detect > apply {
            anyhow::bail!("stage order violates prerequisite: detect must precede apply");
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if let Some(steps) = &cli.steps {
        if let Err(err) = validate_steps(steps) {
            report_error(err.to_string());
            return Ok(ExitCode::from(1));
        }
    }

    let mut cfg = match mdp_config::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            report_error(format!("config error: {err}"));
            return Ok(ExitCode::from(1));
        }
    };

    if let Some(steps) = &cli.steps {
        cfg.grammar_assist.enabled = steps.iter().any(|s| s == "grammar");
        cfg.detector.enabled = steps.iter().any(|s| s == "detect");
        cfg.fixer.enabled = steps.iter().any(|s| s == "fix");
    }
    if let Some(dir) = &cli.reject_dir {
        cfg.apply.reject_dir = Some(dir.display().to_string());
    }

    let input_text = match std::fs::read_to_string(&cli.input) {
        Ok(text) => text,
        Err(err) => {
            report_error(format!("failed to read {}: {err}", cli.input.display()));
            return Ok(ExitCode::from(1));
        }
    };
    let input_file = cli.input.display().to_string();

    let detector_client = cfg.detector.enabled.then(|| {
        ChatClient::new(ChatClientConfig {
            api_base: cfg.detector.api_base.clone(),
            model: cfg.detector.model.clone(),
            timeout: Duration::from_secs(cfg.detector.timeout_s),
            retries: cfg.detector.retries,
            temperature: cfg.detector.temperature,
            top_p: cfg.detector.top_p,
            max_tokens: cfg.detector.max_output_chars as u32,
            seed: None,
        })
    });

    let fixer_client = cfg.fixer.enabled.then(|| {
        ChatClient::new(ChatClientConfig {
            api_base: cfg.fixer.api_base.clone(),
            model: cfg.fixer.model.clone(),
            timeout: Duration::from_secs(30),
            retries: 1,
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: cfg.fixer.max_output_tokens,
            seed: cfg.fixer.seed,
        })
    });

    if cli.print_plan {
        let masked = mdp_engine::masking::mask(&input_text);
        let mut stats = StageStats::default();
        let plan = match &detector_client {
            Some(client) => mdp_engine::detector::detect(client, &masked.masked, &cfg.detector, &mut stats).await,
            None => mdp_domain::plan::Plan::new(),
        };
        println!("{}", serde_json::to_string_pretty(&plan.items)?);
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = mdp_engine::pipeline::run(&input_file, &input_text, &cfg, detector_client.as_ref(), fixer_client.as_ref()).await;

    let transport_failed = outcome.report.statistics.values().any(|s| s.get("llm_transport_errors") > 0);
    if transport_failed {
        report_error("detector or fixer model unreachable after retries");
        return Ok(ExitCode::from(2));
    }

    if let Some(detect_stats) = outcome.report.statistics.get("detect") {
        let attempted = detect_stats.get("chunks_attempted");
        let parse_errors = detect_stats.get("json_parse_errors");
        if attempted > 0 && attempted == parse_errors {
            report_error("detector produced no usable plan: every chunk failed to parse as JSON");
            return Ok(ExitCode::from(4));
        }
    }

    if cli.print_diff {
        let ops = mdp_engine::diff_engine::compute_diff(&input_text, &outcome.output_text);
        println!("{}", mdp_engine::diff_engine::to_unified(&ops, 3));
    }

    if cli.report_pretty {
        println!("{}", mdp_engine::pretty_report::render(&outcome.report));
    }

    if !outcome.structurally_ok {
        report_error("post-check failed: final document does not pass structural validation against the input");
    } else if !outcome.hazard_free {
        report_error("post-check failed: hazard spans remain in the final document");
    }

    if cli.dry_run {
        return Ok(exit_code_for(&outcome));
    }

    if let Some(output_path) = &cli.output {
        std::fs::write(output_path, &outcome.output_text).with_context(|| format!("failed to write {}", output_path.display()))?;
    }

    if let Some(report_path) = &cli.report {
        let body = serde_json::to_vec_pretty(&outcome.report)?;
        std::fs::write(report_path, body).with_context(|| format!("failed to write {}", report_path.display()))?;
    }

    if let Some(plan_path) = &cli.plan {
        let body = serde_json::to_vec_pretty(&outcome.plan.items)?;
        std::fs::write(plan_path, body).with_context(|| format!("failed to write {}", plan_path.display()))?;
    }

    let runs_base = cli.runs_base.clone().unwrap_or_else(|| PathBuf::from(".mdp-runs"));
    let run_id = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
    let artifacts = RunArtifacts::create(&runs_base, &run_id).with_context(|| format!("failed to create run directory under {}", runs_base.display()))?;

    artifacts.write_text("output.md", &outcome.output_text)?;
    artifacts.write_json("plan.json", &outcome.plan.items)?;
    artifacts.write_json("report.json", &outcome.report)?;

    if let Some(appendix) = &outcome.appendix {
        artifacts.write_text("appendix.md", appendix)?;
    }

    {
        let mut logger = DecisionLogger::open(&artifacts.path("decision-log.ndjson"))?;
        for decision in &outcome.decisions {
            logger.append(decision)?;
        }
    }

    if !outcome.structurally_ok {
        artifacts.write_json("failed-chunks.json", &outcome.report.statistics)?;
        if let Some(reject_dir) = &cfg.apply.reject_dir {
            std::fs::create_dir_all(reject_dir).with_context(|| format!("failed to create {reject_dir}"))?;
            let reject_path = PathBuf::from(reject_dir).join(format!("{run_id}.md"));
            std::fs::write(&reject_path, &outcome.output_text)?;
        }
        return Ok(ExitCode::from(3));
    }
    if !outcome.hazard_free {
        artifacts.write_json("failed-chunks.json", &outcome.report.statistics)?;
    }

    Ok(exit_code_for(&outcome))
}

fn exit_code_for(outcome: &mdp_engine::pipeline::PipelineOutcome) -> ExitCode {
    if !outcome.structurally_ok {
        ExitCode::from(3)
    } else if outcome.post_check_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
