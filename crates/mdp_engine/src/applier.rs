//! Applies a detector plan to masked text nodes with maximal-munch,
//! non-overlapping, left-to-right semantics independent of plan order.

use mdp_domain::plan::{Match, Plan};
use mdp_domain::report::StageStats;

/// One editable text node, addressed by its position in the document.
pub struct ApplyNode {
    pub node_index: usize,
    pub text: String,
}

/// Scans `text` for every non-overlapping literal occurrence of `find`,
/// advancing by `find.len()` after each hit so a find never matches itself.
fn find_all_matches(node_index: usize, text: &str, plan: &Plan) -> Vec<Match> {
    let mut out = Vec::new();
    for item in &plan.items {
        if item.find.is_empty() {
            continue;
        }
        let mut start = 0usize;
        while let Some(rel) = text[start..].find(item.find.as_str()) {
            let offset = start + rel;
            out.push(Match {
                find: item.find.clone(),
                replace: item.replace.clone(),
                reason: item.reason,
                offset,
                length: item.find.len(),
                node_index,
            });
            start = offset + item.find.len();
        }
    }
    out
}

/// Applies `plan` to every node, returning the rewritten nodes and stats.
/// Idempotent: applying the same plan to the already-applied output
/// produces no further matches (every `find` that fired is now absent).
pub fn apply(nodes: &[ApplyNode], plan: &Plan, stats: &mut StageStats) -> Vec<ApplyNode> {
    let mut all_matches: Vec<Match> = nodes.iter().flat_map(|n| find_all_matches(n.node_index, &n.text, plan)).collect();
    all_matches.sort_by_key(Match::sort_key);

    let mut accepted_by_node: std::collections::HashMap<usize, Vec<Match>> = std::collections::HashMap::new();
    let mut cursor_by_node: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();

    for m in all_matches {
        let cursor = cursor_by_node.entry(m.node_index).or_insert(0);
        if m.offset < *cursor {
            stats.incr("replacements_skipped_overlap");
            continue;
        }
        *cursor = m.end();
        accepted_by_node.entry(m.node_index).or_default().push(m);
    }

    nodes
        .iter()
        .map(|node| {
            let accepted = accepted_by_node.get(&node.node_index);
            let Some(accepted) = accepted else {
                return ApplyNode { node_index: node.node_index, text: node.text.clone() };
            };
            let mut out = String::with_capacity(node.text.len());
            let mut cursor = 0usize;
            let mut delta: i64 = 0;
            for m in accepted {
                out.push_str(&node.text[cursor..m.offset]);
                out.push_str(&m.replace);
                cursor = m.end();
                delta += m.replace.len() as i64 - m.length as i64;
                stats.incr("replacements_applied");
            }
            out.push_str(&node.text[cursor..]);
            stats.bump("net_length_delta", delta.unsigned_abs());
            ApplyNode { node_index: node.node_index, text: out }
        })
        .collect()
}
