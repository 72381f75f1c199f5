//! CLI module for daily-research - command-line interface and subcommands.
//!
//! Provides the production run, the render-only test mode and the
//! single-category console test mode.

pub mod commands;

pub use commands::Cli;
