//! The per-run report: aggregated, insertion-ordered stage statistics with
//! no secrets and no hash-ordered maps at the serialization boundary.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageStats {
    pub counters: IndexMap<String, u64>,
}

impl StageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&mut self, key: &str) {
        self.bump(key, 1);
    }

    pub fn bump(&mut self, key: &str, by: u64) {
        *self.counters.entry(key.to_string()).or_insert(0) += by;
    }

    pub fn set(&mut self, key: &str, value: u64) {
        self.counters.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub input_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    pub steps: Vec<String>,
    pub statistics: IndexMap<String, StageStats>,
}

impl RunReport {
    pub fn new(input_file: impl Into<String>, steps: Vec<String>) -> Self {
        Self { input_file: input_file.into(), output_file: None, steps, statistics: IndexMap::new() }
    }

    pub fn stage_mut(&mut self, stage: &str) -> &mut StageStats {
        self.statistics.entry(stage.to_string()).or_default()
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
