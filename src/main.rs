// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, to stderr)
// 3. Wire the analyzer together: job store, link prober, orchestrator
// 4. Submit every URL, poll the jobs until they finish, print the reports
// 5. Exit with proper code (0 = all analyses succeeded, 1 = some failed,
//    2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;
use uuid::Uuid;

use cli::{Cli, Commands};
use web_analyzer::checker::HttpProber;
use web_analyzer::{AnalysisReport, AnalyzerConfig, InMemoryJobRepository, JobStatus, WebAnalyzer};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            urls,
            json,
            poll_interval_ms,
            settings,
        } => {
            handle_analyze(
                urls,
                json,
                Duration::from_millis(poll_interval_ms),
                settings.into_config(),
            )
            .await
        }
    }
}

// Logs go to stderr so --json output on stdout stays parseable
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,web_analyzer=debug"
    } else {
        "warn,web_analyzer=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// Handles the 'analyze' subcommand
async fn handle_analyze(
    urls: Vec<Url>,
    json: bool,
    poll_interval: Duration,
    config: AnalyzerConfig,
) -> Result<i32> {
    let analyzer = build_analyzer(config)?;

    let mut ids = Vec::with_capacity(urls.len());
    for url in &urls {
        let id = analyzer
            .analyze_website(url)
            .await
            .with_context(|| format!("Failed to submit {url}"))?;
        if !json {
            println!("🔍 Analyzing {} (job {})", url, id);
        }
        ids.push(id);
    }

    // Poll every job at once; `buffered` keeps reports in submission order
    let reports: Vec<Result<AnalysisReport>> = stream::iter(ids)
        .map(|id| {
            let analyzer = analyzer.clone();
            async move { wait_for_report(&analyzer, id, poll_interval).await }
        })
        .buffered(urls.len().max(1))
        .collect()
        .await;

    analyzer.shutdown().await;

    let reports = reports.into_iter().collect::<Result<Vec<_>>>()?;
    print_reports(&reports, json)?;

    let failed = reports
        .iter()
        .filter(|report| report.status == JobStatus::Failed)
        .count();

    Ok(if failed > 0 { 1 } else { 0 })
}

// Composition root: every component gets its collaborators and its log span here
fn build_analyzer(config: AnalyzerConfig) -> Result<WebAnalyzer> {
    let root = tracing::info_span!("web_analyzer");

    let repo = Arc::new(InMemoryJobRepository::new(tracing::info_span!(
        parent: &root,
        "job_store"
    )));
    let prober = Arc::new(
        HttpProber::new(&config, tracing::info_span!(parent: &root, "prober"))
            .context("Failed to create link prober")?,
    );

    WebAnalyzer::new(config, repo, prober, root).context("Failed to create analyzer")
}

async fn wait_for_report(
    analyzer: &WebAnalyzer,
    id: Uuid,
    poll_interval: Duration,
) -> Result<AnalysisReport> {
    loop {
        let report = analyzer
            .get_analyze_data(id)
            .await
            .with_context(|| format!("Failed to read job {id}"))?;

        if report.status.is_terminal() {
            return Ok(report);
        }

        tokio::time::sleep(poll_interval).await;
    }
}

// Prints the reports either as a table or JSON
fn print_reports(reports: &[AnalysisReport], json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(reports)?;
        println!("{}", json_output);
    } else {
        for report in reports {
            print_report(report);
        }
    }
    Ok(())
}

// Prints one report in a human-readable layout
fn print_report(report: &AnalysisReport) {
    println!();
    println!("{}", "=".repeat(80));
    println!("{:<18} {}", "URL", report.url);
    println!("{:<18} {}", "STATUS", format_status(report.status));

    if let Some(description) = &report.error_description {
        println!("{:<18} {}", "ERROR", description);
    }

    if report.status != JobStatus::Success {
        return;
    }

    println!("{:<18} {}", "HTML VERSION", report.html_version);
    println!("{:<18} {}", "TITLE", report.title);
    println!(
        "{:<18} {}",
        "LOGIN FORM",
        if report.has_login_form { "yes" } else { "no" }
    );

    let headings = report
        .headings
        .iter()
        .map(|(tag, count)| format!("{tag}: {count}"))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{:<18} {}", "HEADINGS", headings);

    let links = &report.links;
    println!();
    println!("📊 Links:");
    println!("   🏠 Internal: {}", links.internal);
    println!("   🌐 External: {}", links.external);
    println!("   ❌ Inaccessible: {}", links.inaccessible);

    if !links.inaccessible_details.is_empty() {
        println!();
        println!("{:<70} {:<10}", "INACCESSIBLE URL", "STATUS");
        println!("{}", "-".repeat(80));
        for detail in &links.inaccessible_details {
            // Truncate URL if too long for display
            let url_display = if detail.url.chars().count() > 67 {
                format!("{}...", detail.url.chars().take(67).collect::<String>())
            } else {
                detail.url.clone()
            };
            let status_display = if detail.status_code == 0 {
                "no reply".to_string()
            } else {
                detail.status_code.to_string()
            };
            println!("{:<70} {:<10}", url_display, status_display);
        }
    }
}

fn format_status(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "⏳ PENDING",
        JobStatus::Success => "✅ SUCCESS",
        JobStatus::Failed => "❌ FAILED",
    }
}
