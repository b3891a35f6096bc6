//! One record per tie-breaker decision, serialized as a line of NDJSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub stage: String,
    pub rule: String,
    pub before: String,
    pub after: String,
    pub span: (usize, usize),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl DecisionRecord {
    pub fn new(stage: impl Into<String>, rule: impl Into<String>, before: impl Into<String>, after: impl Into<String>, span: (usize, usize)) -> Self {
        Self { stage: stage.into(), rule: rule.into(), before: before.into(), after: after.into(), span, metadata: None }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// One compact JSON object per line; callers append this directly to an
    /// append-only decision-log file handle.
    pub fn to_ndjson_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndjson_line_has_no_embedded_newline() {
        let record = DecisionRecord::new("tie-breaker", "skip:hazard_detected", "Flash", "F l a s h", (10, 15));
        let line = record.to_ndjson_line().unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("skip:hazard_detected"));
    }
}
