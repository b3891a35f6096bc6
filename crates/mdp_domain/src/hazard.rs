//! Hazard spans flag TTS-unfriendly substrings that later merge stages must
//! never reintroduce once the deterministic pre-pass has cleaned them up.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardReason {
    SpacedLetters,
    UppercaseNonAcronym,
    StylizedUnicode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardSpan {
    pub start: usize,
    pub end: usize,
    pub reason: HazardReason,
}

impl HazardSpan {
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }

    /// Shifts this span's offsets to stay aligned with a text edit applied
    /// at or before its start, mirroring what the tie-breaker does after
    /// every accepted opcode.
    pub fn shift_after(&mut self, edit_end: usize, delta: i64) {
        if self.start >= edit_end {
            self.start = (self.start as i64 + delta).max(0) as usize;
            self.end = (self.end as i64 + delta).max(0) as usize;
        }
    }
}

/// Merges overlapping or touching spans, keeping the earliest reason when
/// two spans collapse into one (decision logging still records the
/// individual detections upstream of this merge).
pub fn merge_hazards(mut spans: Vec<HazardSpan>) -> Vec<HazardSpan> {
    spans.sort_by_key(|s| s.start);
    let mut merged: Vec<HazardSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = merged.last_mut() {
            if span.start <= last.end {
                last.end = last.end.max(span.end);
                continue;
            }
        }
        merged.push(span);
    }
    merged
}
