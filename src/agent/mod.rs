//! Search agent boundary
//!
//! This module provides:
//! - SearchAgent trait for the external agent capability
//! - ClaudeCliAgent, which shells out to the `claude` CLI
//! - MockSearchAgent, a scripted fake for tests
//! - Prompt rendering and markdown topic parsing

pub mod claude;
pub mod client;
pub mod parser;
pub mod prompt;

pub use claude::ClaudeCliAgent;
pub use client::{MockResponse, MockSearchAgent, SearchAgent, SearchRequest};
pub use parser::parse_topics;
pub use prompt::{DEFAULT_PROMPT_TEMPLATE, PromptTemplate};
