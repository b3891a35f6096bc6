pub mod events;
pub mod export;
pub mod setup;

pub use events::TelemetryEvent;
pub use export::{ExportFormat, export_log};
pub use setup::{TelemetryConfig, TelemetryError, init_telemetry};
