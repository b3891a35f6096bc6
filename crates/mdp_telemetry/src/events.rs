use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub enum TelemetryEvent {
    RunStarted { input_file: String, steps: Vec<String>, timestamp: DateTime<Utc> },
    StageStarted { stage: String, timestamp: DateTime<Utc> },
    StageCompleted { stage: String, duration_ms: u64, timestamp: DateTime<Utc> },
    ModelCallMade { endpoint: String, status: u16, duration_ms: u64, timestamp: DateTime<Utc> },
    ValidationFailed { stage: String, rule: String, timestamp: DateTime<Utc> },
    Warning { message: String, timestamp: DateTime<Utc> },
    Error { message: String, context: String, timestamp: DateTime<Utc> },
    RunCompleted { exit_code: i32, elapsed_secs: f64, timestamp: DateTime<Utc> },
}

impl TelemetryEvent {
    pub fn run_started(input_file: impl Into<String>, steps: Vec<String>) -> Self {
        Self::RunStarted { input_file: input_file.into(), steps, timestamp: Utc::now() }
    }

    pub fn stage_started(stage: impl Into<String>) -> Self {
        Self::StageStarted { stage: stage.into(), timestamp: Utc::now() }
    }

    pub fn stage_completed(stage: impl Into<String>, duration_ms: u64) -> Self {
        Self::StageCompleted { stage: stage.into(), duration_ms, timestamp: Utc::now() }
    }

    pub fn run_completed(exit_code: i32, elapsed_secs: f64) -> Self {
        Self::RunCompleted { exit_code, elapsed_secs, timestamp: Utc::now() }
    }
}
