//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: full pipeline (default)
//! - test-html: collect and render, no publish/notify
//! - test-collect: one category, printed to the console

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Daily research pipeline - collect, render, publish
#[derive(Parser, Debug)]
#[command(name = "daily-research")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Collect, render, commit/push and notify; skipped if today's report exists
    Run {
        /// Report date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Collect and render HTML without publishing or notifying
    TestHtml {
        /// Report date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Run one collection attempt for a single category and print it
    TestCollect {
        /// Category id, defaults to the first configured category
        #[arg(short = 'k', long)]
        category: Option<String>,
    },
}
