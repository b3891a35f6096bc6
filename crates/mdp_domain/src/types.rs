//! Core span and document types shared by every pipeline stage.
//!
//! Spans never hold a pointer into the document they describe; they are
//! `(start, end)` byte offsets into the owning `Document::text`, kept valid
//! across stage boundaries without lifetime entanglement.

use serde::{Deserialize, Serialize};

/// A region of the masked document that must survive byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedSpan {
    pub start: usize,
    pub end: usize,
    pub kind: ProtectedKind,
    pub literal: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtectedKind {
    CodeFence,
    InlineCode,
    HtmlBlock,
    LinkUrl,
    ImageUrl,
    Autolink,
    MathBlock,
    InlineMath,
}

impl ProtectedKind {
    /// Stable token used inside sentinel strings; must never change shape
    /// once a mask table has been persisted, since the sentinel format is
    /// part of the plan/decision-log file contract.
    pub fn tag(self) -> &'static str {
        match self {
            Self::CodeFence => "CODE_FENCE",
            Self::InlineCode => "INLINE_CODE",
            Self::HtmlBlock => "HTML_BLOCK",
            Self::LinkUrl => "LINK_URL",
            Self::ImageUrl => "IMAGE_URL",
            Self::Autolink => "AUTOLINK",
            Self::MathBlock => "MATH_BLOCK",
            Self::InlineMath => "INLINE_MATH",
        }
    }
}

/// A region of the masked document open to editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextSpan {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A document partitioned into the two span kinds above. `spans` and
/// `text_spans` together tile `[0, text.len())`; callers reconstruct the
/// full document by walking both lists in start order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_kind_tags_are_stable() {
        assert_eq!(ProtectedKind::CodeFence.tag(), "CODE_FENCE");
        assert_eq!(ProtectedKind::InlineMath.tag(), "INLINE_MATH");
    }

    #[test]
    fn text_span_blank_detection() {
        let span = TextSpan { start: 0, end: 3, text: "   ".into() };
        assert!(span.is_blank());
        assert_eq!(span.len(), 3);
    }

    #[test]
    fn document_len_matches_text() {
        let doc = Document::new("hello world");
        assert_eq!(doc.len(), 11);
        assert!(!doc.is_empty());
    }
}
