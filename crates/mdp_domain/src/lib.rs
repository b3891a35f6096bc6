pub mod decision;
pub mod diff;
pub mod hazard;
pub mod mask;
pub mod plan;
pub mod report;
pub mod types;
