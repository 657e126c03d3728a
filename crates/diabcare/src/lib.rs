//! Diabetes risk assessment and glycemic-index aware food recommendations.

pub mod catalog;
pub mod config;
pub mod error;
pub mod history;
pub mod prediction;
pub mod profile;
pub mod recommendation;
pub mod telemetry;
