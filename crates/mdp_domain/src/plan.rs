//! Replacement items and plans: the contract between the Detector and the
//! Applier, and the thing persisted to `plan.json`.

use serde::{Deserialize, Serialize};

pub const FORBIDDEN_REPLACE_CHARS: &[char] = &['`', '*', '_', '[', ']', '(', ')', '~', '<', '>'];
pub const MAX_FIND_LEN: usize = 80;
pub const MAX_REPLACE_LEN: usize = 80;
pub const MAX_GROWTH_PER_ITEM: i64 = 10;
pub const MAX_ITEMS_PER_SPAN: usize = 16;
pub const MAX_SPAN_GROWTH_RATIO: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    TtsSpaced,
    UnicodeStylized,
    CaseGlitch,
    SimplePunct,
}

impl Reason {
    /// Lossy keyword-based normalization used at the detector's JSON
    /// boundary; anything it can't place is rejected by the caller, never
    /// passed through as an unknown variant (see Open Questions).
    pub fn from_keyword(raw: &str) -> Option<Self> {
        let lower = raw.to_ascii_lowercase();
        if lower.contains("space") || lower.contains("letter") {
            Some(Self::TtsSpaced)
        } else if lower.contains("unicode") || lower.contains("stylized") || lower.contains("accent") || lower.contains("small cap") {
            Some(Self::UnicodeStylized)
        } else if lower.contains("case") || lower.contains("caps") || lower.contains("shout") {
            Some(Self::CaseGlitch)
        } else if lower.contains("punct") {
            Some(Self::SimplePunct)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementItem {
    pub find: String,
    pub replace: String,
    pub reason: Reason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemRejection {
    Schema,
    ForbiddenChars,
    LengthDelta,
    NoMatch,
    Duplicate,
    Budget,
}

impl ReplacementItem {
    /// Validates an item against the invariants in the data model without
    /// consulting the span it will be applied to (see `validate_against`).
    pub fn validate_shape(&self) -> Result<(), ItemRejection> {
        if self.find.is_empty() || self.find.len() > MAX_FIND_LEN || self.find.contains('\n') {
            return Err(ItemRejection::Schema);
        }
        if self.replace.len() > MAX_REPLACE_LEN {
            return Err(ItemRejection::Schema);
        }
        if self.replace.chars().any(|c| FORBIDDEN_REPLACE_CHARS.contains(&c)) {
            return Err(ItemRejection::ForbiddenChars);
        }
        let delta = self.replace.len() as i64 - self.find.len() as i64;
        if delta > MAX_GROWTH_PER_ITEM {
            return Err(ItemRejection::LengthDelta);
        }
        Ok(())
    }

    pub fn validate_against(&self, span_text: &str) -> Result<(), ItemRejection> {
        self.validate_shape()?;
        if !span_text.contains(self.find.as_str()) {
            return Err(ItemRejection::NoMatch);
        }
        Ok(())
    }
}

/// An ordered, de-duplicated list of replacement items scoped to one text
/// span. De-duplication key is `(find, replace)`, first-seen order wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub items: Vec<ReplacementItem>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_dedup(&mut self, item: ReplacementItem) -> bool {
        if self.items.iter().any(|existing| existing.find == item.find && existing.replace == item.replace) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A concrete occurrence of a replacement item inside a text node, produced
/// by the applier's literal scan. Sort order `(node_index, offset, -length)`
/// is the maximal-munch discipline: at a shared offset the longest find wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub find: String,
    pub replace: String,
    pub reason: Reason,
    pub offset: usize,
    pub length: usize,
    pub node_index: usize,
}

impl Match {
    pub fn sort_key(&self) -> (usize, usize, std::cmp::Reverse<usize>) {
        (self.node_index, self.offset, std::cmp::Reverse(self.length))
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}
