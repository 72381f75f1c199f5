//! daily-research - unattended daily topic research pipeline
//!
//! Collects topic summaries for each configured category from an external
//! search agent, assembles a dated report, renders it to HTML and publishes
//! it to a static site, optionally notifying a chat webhook.

pub mod agent;
pub mod collect;
pub mod config;
pub mod domain;
pub mod error;
pub mod publish;
pub mod runner;

pub use error::{ResearchError, Result};
