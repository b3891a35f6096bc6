//! Optional grammar pass backed by an HTTP collaborator (e.g. a local
//! LanguageTool server). Safe-category suggestions are applied in reverse
//! offset order; anything that breaks structural validation is reverted.

use crate::validator::{validate, ValidatorConfig};
use mdp_config::GrammarAssistConfig;
use mdp_domain::mask::MaskTable;
use mdp_domain::report::StageStats;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GrammarSuggestion {
    pub offset: usize,
    pub length: usize,
    pub replacement: String,
    pub category: String,
    #[allow(dead_code)]
    pub message: String,
}

#[async_trait::async_trait]
pub trait GrammarCollaborator: Send + Sync {
    async fn suggest(&self, text: &str, language: &str) -> Result<Vec<GrammarSuggestion>, String>;
}

/// Filters to safe categories, drops anything overlapping a sentinel, and
/// applies survivors right-to-left so earlier offsets stay valid. If the
/// result fails structural validation, the original text is returned and
/// `reverted` is set.
pub fn assist(
    text: &str,
    suggestions: Vec<GrammarSuggestion>,
    cfg: &GrammarAssistConfig,
    mask_table: &MaskTable,
    stats: &mut StageStats,
) -> (String, bool) {
    if !cfg.enabled {
        return (text.to_string(), false);
    }

    let mut accepted: Vec<GrammarSuggestion> = suggestions
        .into_iter()
        .filter(|s| cfg.safe_categories.iter().any(|c| c == &s.category))
        .filter(|s| !intersects_sentinel(text, s.offset, s.offset + s.length, mask_table))
        .collect();
    accepted.sort_by(|a, b| b.offset.cmp(&a.offset));

    let mut result = text.to_string();
    for suggestion in &accepted {
        if suggestion.offset + suggestion.length > result.len() {
            continue;
        }
        result.replace_range(suggestion.offset..suggestion.offset + suggestion.length, &suggestion.replacement);
        stats.incr("grammar_suggestions_applied");
    }

    if validate(text, &result, mask_table, &ValidatorConfig::default()).is_err() {
        stats.incr("grammar_pass_reverted");
        return (text.to_string(), true);
    }

    (result, false)
}

fn intersects_sentinel(text: &str, start: usize, end: usize, mask_table: &MaskTable) -> bool {
    mask_table.sentinels().any(|sentinel| {
        text.match_indices(sentinel).any(|(idx, _)| idx < end && start < idx + sentinel.len())
    })
}
