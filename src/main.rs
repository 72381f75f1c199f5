use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::io::{self, Write};
use std::sync::Arc;

use daily_research::agent::{ClaudeCliAgent, PromptTemplate};
use daily_research::collect::{CollectionJob, JobSettings, RetryController, RetryPolicy, TokioSleeper};
use daily_research::config::Config;
use daily_research::domain::{CollectionOutcome, DailyReport};
use daily_research::publish::{NoopNotifier, PublishMode, PublishOutcome, SitePublisher, SiteStore, notifier_from_env};
use daily_research::runner::{IdempotencyGate, RunOrchestrator, RunResult};

mod cli;

use cli::Cli;
use cli::commands::Commands;

/// Log sink that writes every record to the day's log file and to stderr.
struct TeeWriter {
    file: fs::File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn setup_logging(config: &Config, verbose: bool, today: NaiveDate) -> Result<()> {
    fs::create_dir_all(&config.logs_dir).context("Failed to create log directory")?;

    let log_file = config.logs_dir.join(format!("{}.log", today.format("%Y-%m-%d")));

    let target = Box::new(TeeWriter {
        file: fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    });

    let level = if verbose {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };

    let mut builder = env_logger::Builder::new();
    builder.parse_filters(level);
    // RUST_LOG still wins when set
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Build the collection job, rendering every category's prompt once so a
/// broken template fails startup instead of a category.
fn build_job(config: &Config, date: NaiveDate) -> Result<CollectionJob<ClaudeCliAgent>> {
    let agent = Arc::new(ClaudeCliAgent::new(config.agent.clone()));
    let prompt = PromptTemplate::from_config(config.prompt_template.as_deref()).context("Invalid prompt template")?;
    let job = CollectionJob::new(
        agent,
        prompt,
        JobSettings {
            topics_per_category: config.topics_per_category,
            timeout: config.agent_timeout(),
        },
    );
    for category in &config.categories {
        job.request(category, date)
            .with_context(|| format!("Prompt template failed to render for {}", category.id))?;
    }
    Ok(job)
}

async fn run_application(cli: &Cli, config: &Config, today: NaiveDate) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None => handle_run(config, today).await,
        Some(Commands::Run { date }) => handle_run(config, date.unwrap_or(today)).await,
        Some(Commands::TestHtml { date }) => handle_test_html(config, date.unwrap_or(today)).await,
        Some(Commands::TestCollect { category }) => handle_test_collect(config, category.as_deref(), today).await,
    }
}

async fn handle_run(config: &Config, date: NaiveDate) -> Result<()> {
    info!("Production run for {}", date);

    let notifier = notifier_from_env(config);
    let publisher = SitePublisher::from_config(config, PublishMode::Full, notifier).context("Failed to set up publisher")?;
    let orchestrator = RunOrchestrator::new(
        build_job(config, date)?,
        RetryController::new(RetryPolicy::from_config(config), Arc::new(TokioSleeper)),
        Arc::new(publisher),
        IdempotencyGate::ReportFile(SiteStore::new(&config.output_dir)),
    );

    let result = orchestrator.execute(&config.categories, date).await;
    print_result(&result);

    match result {
        RunResult::Completed {
            publish: PublishOutcome::Failed { stage, detail },
            ..
        } => eyre::bail!("Publish failed at {} stage: {}", stage, detail),
        _ => Ok(()),
    }
}

async fn handle_test_html(config: &Config, date: NaiveDate) -> Result<()> {
    info!("Render-only run for {}", date);

    let publisher = SitePublisher::from_config(config, PublishMode::RenderOnly, Box::new(NoopNotifier))
        .context("Failed to set up publisher")?;
    let orchestrator = RunOrchestrator::new(
        build_job(config, date)?,
        RetryController::new(RetryPolicy::from_config(config), Arc::new(TokioSleeper)),
        Arc::new(publisher),
        IdempotencyGate::Disabled,
    );

    let result = orchestrator.execute(&config.categories, date).await;
    print_result(&result);

    if let RunResult::Completed { publish, .. } = &result {
        match publish {
            PublishOutcome::Failed { stage, detail } => {
                // Nothing was published, so this is reported but not fatal
                println!("{} {} stage: {}", "Render failed:".red(), stage, detail);
            }
            other => {
                if let Some(path) = other.report_path() {
                    println!("{} {}", "Report generated:".green(), path.display());
                }
            }
        }
    }
    Ok(())
}

async fn handle_test_collect(config: &Config, category_id: Option<&str>, today: NaiveDate) -> Result<()> {
    let category = match category_id {
        Some(id) => config
            .category(id)
            .ok_or_else(|| eyre::eyre!("Unknown category: {}", id))?,
        None => config
            .categories
            .first()
            .ok_or_else(|| eyre::eyre!("No categories configured"))?,
    };
    info!("Test collection for {}", category.id);

    let job = build_job(config, today)?;
    let request = job.request(category, today).context("Failed to render prompt")?;
    let retry = RetryController::new(RetryPolicy::single(), Arc::new(TokioSleeper));
    println!("\n=== Test Collection: {} ===", category.id.cyan());

    match retry.run(&category.id, || job.attempt(&request)).await {
        CollectionOutcome::Success { topics, .. } => {
            println!("Parsed topics: {}", topics.len());
            for topic in &topics {
                let summary: String = topic.summary.chars().take(100).collect();
                println!("  - {}", topic.title.bold());
                println!("    {}...", summary);
                println!("    Source: {}", topic.source.as_deref().unwrap_or("-"));
            }
            Ok(())
        }
        CollectionOutcome::Failure { reason, detail, .. } => {
            println!("{} ({}) {}", "Failed:".red(), reason, detail);
            eyre::bail!("Test collection for {} failed", category.id)
        }
    }
}

fn print_result(result: &RunResult) {
    match result {
        RunResult::Skipped { date } => {
            println!("{} report for {} already exists", "Skipped:".yellow(), date);
        }
        RunResult::Completed { report, .. } => print_report(report),
    }
}

fn print_report(report: &DailyReport) {
    println!(
        "{} {} ({} topics)",
        "Report:".green(),
        report.date_key(),
        report.total_topics()
    );
    for entry in &report.entries {
        match &entry.outcome {
            CollectionOutcome::Success { topics, attempts } => println!(
                "  {} {}: {} topics ({} attempt(s))",
                "ok".green(),
                entry.category.name,
                topics.len(),
                attempts
            ),
            CollectionOutcome::Failure { reason, attempts, .. } => println!(
                "  {} {}: {} after {} attempt(s)",
                "failed".red(),
                entry.category.name,
                reason,
                attempts
            ),
        }
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Secrets such as the webhook URL may live in .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let today = Local::now().date_naive();
    setup_logging(&config, cli.is_verbose(), today).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);
    config.validate().context("Invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    // Run the main application logic
    runtime
        .block_on(run_application(&cli, &config, today))
        .context("Application failed")?;

    Ok(())
}
