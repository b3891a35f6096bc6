//! Renders scrubbed boilerplate into an auditable Markdown appendix instead
//! of discarding it silently.

use crate::scrubber::{removed_candidates, ScrubCandidate};
use std::collections::BTreeMap;

/// Groups removed candidates by category (alphabetically by heading) and
/// renders one `##` section per category with one `###` subsection per
/// block. Returns `None` when nothing was removed.
pub fn render_appendix(candidates: &[ScrubCandidate]) -> Option<String> {
    let removed = removed_candidates(candidates);
    if removed.is_empty() {
        return None;
    }

    let mut by_category: BTreeMap<&'static str, Vec<&ScrubCandidate>> = BTreeMap::new();
    for candidate in removed {
        by_category.entry(candidate.category.heading()).or_default().push(candidate);
    }

    let mut out = String::from("# Removed Content Appendix\n\n");
    for (heading, blocks) in by_category {
        out.push_str(&format!("## {heading}\n\n"));
        for block in blocks {
            out.push_str(&format!("### Block {} ({:?})\n\n", block.block_id, block.position));
            out.push_str(&format!("{}\n\n", block.reason));
            out.push_str("```\n");
            out.push_str(&block.content);
            out.push_str("\n```\n\n");
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrubber::{BlockPosition, ScrubCategory};

    fn candidate(id: usize, category: ScrubCategory, position: BlockPosition) -> ScrubCandidate {
        ScrubCandidate { block_id: id, category, reason: "matched keyword".into(), content: "content here".into(), position, confidence: 0.9 }
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(render_appendix(&[]).is_none());
    }

    #[test]
    fn groups_by_category_alphabetically() {
        let candidates = vec![
            candidate(0, ScrubCategory::Navigation, BlockPosition::EdgeTop),
            candidate(1, ScrubCategory::AuthorsNote, BlockPosition::EdgeTop),
        ];
        let appendix = render_appendix(&candidates).unwrap();
        let authors_pos = appendix.find("Author's Notes").unwrap();
        let nav_pos = appendix.find("Navigation").unwrap();
        assert!(authors_pos < nav_pos);
    }

    #[test]
    fn middle_position_low_confidence_block_is_excluded() {
        let mut c = candidate(2, ScrubCategory::PromoAdSocial, BlockPosition::Middle);
        c.confidence = 0.8;
        let appendix = render_appendix(&[c]);
        assert!(appendix.is_none());
    }
}
