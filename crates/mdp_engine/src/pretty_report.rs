//! Renders a `RunReport` as bordered, key-value-aligned sections for
//! terminal output. Purely presentational: no decisions are made here.

use mdp_domain::report::RunReport;

const WIDTH: usize = 100;

fn border(title: &str) -> String {
    let dashes = WIDTH.saturating_sub(title.len() + 4);
    format!("-- {title} {}", "-".repeat(dashes))
}

fn truncate_path(path: &str) -> String {
    if path.len() <= WIDTH - 4 {
        path.to_string()
    } else {
        format!("...{}", &path[path.len() - (WIDTH - 7)..])
    }
}

/// Renders the Run Summary, Phase Statistics, and Artifacts sections. The
/// Rejections, File Growth, and Quality Flags sections are derived directly
/// from stage counters so they stay in sync with whatever stats stages
/// actually recorded, instead of a separate hand-maintained list.
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str(&border("Run Summary"));
    out.push('\n');
    out.push_str(&format!("  input:  {}\n", truncate_path(&report.input_file)));
    if let Some(output) = &report.output_file {
        out.push_str(&format!("  output: {}\n", truncate_path(output)));
    }
    out.push_str(&format!("  stages: {}\n\n", report.steps.join(" -> ")));

    out.push_str(&border("Phase Statistics"));
    out.push('\n');
    for (stage, stats) in &report.statistics {
        out.push_str(&format!("  [{stage}]\n"));
        for (key, value) in &stats.counters {
            out.push_str(&format!("    {key:<32} {value}\n"));
        }
    }
    out.push('\n');

    out.push_str(&border("Rejections"));
    out.push('\n');
    let mut any_rejection = false;
    for (stage, stats) in &report.statistics {
        for (key, value) in &stats.counters {
            if key.starts_with("rejections.") && *value > 0 {
                any_rejection = true;
                out.push_str(&format!("  {stage}.{key:<28} {value}\n"));
            }
        }
    }
    if !any_rejection {
        out.push_str("  none\n");
    }
    out.push('\n');

    out.push_str(&border("Quality Flags"));
    out.push('\n');
    let reverted: u64 = report.statistics.values().map(|s| s.get("fixer_reverted_file_growth") + s.get("grammar_pass_reverted")).sum();
    if reverted > 0 {
        out.push_str(&format!("  reverted passes: {reverted}\n"));
    } else {
        out.push_str("  none\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdp_domain::report::StageStats;

    #[test]
    fn renders_run_summary_and_stages() {
        let mut report = RunReport::new("book.md", vec!["mask".into(), "prepass_basic".into()]);
        report.output_file = Some("book.out.md".into());
        report.stage_mut("mask").incr("masks_created");
        let rendered = render(&report);
        assert!(rendered.contains("book.md"));
        assert!(rendered.contains("mask -> prepass_basic"));
        assert!(rendered.contains("masks_created"));
    }

    #[test]
    fn shows_none_when_no_rejections() {
        let report = RunReport::new("book.md", vec!["mask".into()]);
        let rendered = render(&report);
        assert!(rendered.contains("Rejections"));
        assert!(rendered.contains("none"));
    }

    #[test]
    fn surfaces_rejection_counters() {
        let mut report = RunReport::new("book.md", vec!["detect".into()]);
        let mut stats = StageStats::default();
        stats.incr("rejections.no_match");
        report.statistics.insert("detect".into(), stats);
        let rendered = render(&report);
        assert!(rendered.contains("detect.rejections.no_match"));
    }
}
