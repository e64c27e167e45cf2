//! Kensa main entry point
//!
//! This is the command-line interface for the Kensa security posture scanner.

use anyhow::Context;
use clap::Parser;
use kensa::config::{load_config_with_hash, validate, Config};
use kensa::output::{render_summary, save_report};
use kensa::url::parse_target;
use kensa::{ErrorKind, Politeness, Scanner, SecurityReport, Strategy};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Kensa: a polite security posture scanner
///
/// Kensa scans a single URL while respecting robots.txt and rate limits,
/// and reports its security headers, security.txt, TLS issuer, framework
/// fingerprints, links and exposed emails.
#[derive(Parser, Debug)]
#[command(name = "kensa")]
#[command(version)]
#[command(about = "A polite security posture scanner", long_about = None)]
struct Cli {
    /// Target URL (a bare host is scanned over https)
    #[arg(value_name = "URL")]
    url: String,

    /// Render the page in a headless browser (requires the `browser` feature)
    #[arg(short, long)]
    dynamic: bool,

    /// Contact email announced in the User-Agent
    #[arg(short, long)]
    email: Option<String>,

    /// Report file name (default: generated from host, path and time)
    #[arg(short, long)]
    output: Option<String>,

    /// Directory reports are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip the robots.txt check (use responsibly)
    #[arg(long)]
    ignore_robots: bool,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum fetch attempts
    #[arg(long)]
    max_retries: Option<u32>,

    /// Skip the politeness delay (not for production use)
    #[arg(long)]
    no_delay: bool,

    /// Print the JSON report instead of the formatted summary
    #[arg(long)]
    json_only: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Unexpected error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = build_config(&cli)?;
    let target = parse_target(&cli.url).with_context(|| format!("Invalid target '{}'", cli.url))?;

    let mut politeness = config.politeness();
    if cli.no_delay {
        tracing::warn!("Politeness delay disabled");
        politeness = Politeness {
            backoff: politeness.backoff,
            ..Politeness::without_delay()
        };
    }

    let request = config
        .scan_request(target)
        .with_context(|| format!("Invalid target '{}'", cli.url))?;
    if !cli.json_only {
        print_header(&request);
    }

    // Ctrl-C cancels the in-flight scan
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted by user, cancelling scan");
            trigger.cancel();
        }
    });

    let scanner = Scanner::new(politeness).with_cancellation(cancel);
    let report = scanner.run(request).await;

    if report.error_kind == Some(ErrorKind::Cancelled) {
        eprintln!("\nInterrupted by user");
        return Ok(ExitCode::from(130));
    }

    if report.is_error() {
        display(&report, cli.json_only)?;
        return Ok(ExitCode::FAILURE);
    }

    let path = save_report(
        &report,
        Path::new(&config.output.directory),
        cli.output.as_deref(),
    )
    .context("Failed to save report")?;

    display(&report, cli.json_only)?;
    if !cli.json_only {
        println!("Full report saved to: {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

/// Loads the config file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(email) = &cli.email {
        config.scanner.contact_email = email.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.scanner.timeout_secs = timeout;
    }
    if let Some(max_retries) = cli.max_retries {
        config.scanner.max_retries = max_retries;
    }
    if cli.ignore_robots {
        config.scanner.respect_robots = false;
    }
    if cli.dynamic {
        config.scanner.strategy = Strategy::Rendered;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }

    validate(&config).context("Invalid settings")?;
    Ok(config)
}

fn print_header(request: &kensa::ScanRequest) {
    println!("{}", "=".repeat(70));
    println!("KENSA SECURITY POSTURE SCAN");
    println!("{}", "=".repeat(70));
    println!("Target URL: {}", request.target());
    println!(
        "Mode: {}",
        match request.strategy() {
            Strategy::Static => "Static (HTTP)",
            Strategy::Rendered => "Rendered (headless browser)",
        }
    );
    println!("Respecting robots.txt: {}", request.respect_robots());
    println!("{}\n", "=".repeat(70));
}

fn display(report: &SecurityReport, json_only: bool) -> anyhow::Result<()> {
    if json_only {
        println!("{}", report.to_json_pretty()?);
    } else {
        println!("{}", render_summary(report));
    }
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that `--json-only` output stays machine-readable.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kensa=info,warn"),
            1 => EnvFilter::new("kensa=debug,info"),
            2 => EnvFilter::new("kensa=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
