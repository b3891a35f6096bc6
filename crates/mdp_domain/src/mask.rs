//! The mask table: an ordered sentinel -> literal map built once by the
//! markdown adapter and consulted read-only by every later stage.

use crate::types::ProtectedKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Insertion-ordered so serialization and parity checks never depend on
/// hash iteration order (a hard requirement called out for every
/// serialization boundary in this pipeline).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaskTable {
    sentinels: IndexMap<String, String>,
    #[serde(skip)]
    counters: [u32; 8],
}

fn kind_index(kind: ProtectedKind) -> usize {
    match kind {
        ProtectedKind::CodeFence => 0,
        ProtectedKind::InlineCode => 1,
        ProtectedKind::HtmlBlock => 2,
        ProtectedKind::LinkUrl => 3,
        ProtectedKind::ImageUrl => 4,
        ProtectedKind::Autolink => 5,
        ProtectedKind::MathBlock => 6,
        ProtectedKind::InlineMath => 7,
    }
}

impl MaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next sentinel for `kind` and records its literal.
    /// Per-kind counters start at 0 and increase in document order.
    pub fn insert(&mut self, kind: ProtectedKind, literal: impl Into<String>) -> String {
        let idx = kind_index(kind);
        let n = self.counters[idx];
        self.counters[idx] += 1;
        let sentinel = format!("{{{{MASK_{}_{}}}}}", kind.tag(), n);
        self.sentinels.insert(sentinel.clone(), literal.into());
        sentinel
    }

    pub fn literal(&self, sentinel: &str) -> Option<&str> {
        self.sentinels.get(sentinel).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sentinels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentinels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sentinels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn sentinels(&self) -> impl Iterator<Item = &str> {
        self.sentinels.keys().map(String::as_str)
    }
}
