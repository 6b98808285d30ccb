//! Smart Incident Service
//!
//! Records incidents and enriches them asynchronously with AI-derived
//! severity, category, summary and remediation advice. The enrichment
//! coordinator drives every incident to a terminal `ENRICHED` or `FAILED`
//! state under a per-attempt timeout with bounded, exponentially backed-off
//! retries.

pub mod api;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod metrics;
pub mod models;
pub mod state;

pub use error::{AppError, Result};
