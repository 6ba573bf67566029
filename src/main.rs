//! ContentFlow CLI Entry Point
//!
//! Runs the pipeline once (for cron and timers) or serves the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Run once for the configured default source
//! contentflow
//!
//! # Run once for a source, 3 items, publishing only news
//! contentflow acct1 3 news
//!
//! # Synthetic content, nothing fetched from disk
//! contentflow --demo acct1
//!
//! # Serve the HTTP API
//! contentflow --serve --bind 0.0.0.0:8000
//! ```
//!
//! Exit codes: 0 all steps succeeded, 1 some steps failed, 2 the run
//! failed or the request was rejected.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use log::{error, info};

use contentflow::execution::{invoke_once, oneshot::EXIT_FAILED, WorkflowExecutor};
use contentflow::monitoring::render_timeline;
use contentflow::server::{self, AppState};
use contentflow::workflow::{RunRecord, StatusStore, StepStatus};
use contentflow::{Settings, APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    positional: Vec<String>,
    serve: bool,
    bind: Option<String>,
    config_path: Option<PathBuf>,
    demo: bool,
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Content Pipeline Workflow Executor");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: contentflow [OPTIONS] [SOURCE] [COUNT] [TYPE]");
    println!();
    println!("Arguments:");
    println!("  [SOURCE]            Source identifier (default: configured source)");
    println!("  [COUNT]             Number of items to fetch (default: configured count)");
    println!("  [TYPE]              Publish only this content type (name or code 1-6)");
    println!();
    println!("Options:");
    println!("  --serve             Serve the HTTP API instead of running once");
    println!("  --bind ADDR         Listen address for --serve");
    println!("  --config PATH       Settings file (default: contentflow.yaml if present)");
    println!("  --demo              Use synthetic content instead of the data directory");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Content types:");
    println!("  1 general  2 promotional  3 news  4 personal  5 retweet  6 thread");
    println!();
    println!("Examples:");
    println!("  contentflow acct1 3");
    println!("  contentflow --demo acct1 5 news");
    println!("  contentflow --serve --bind 0.0.0.0:8000");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--serve" => {
                config.serve = true;
            }
            "--demo" => {
                config.demo = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--bind" => {
                i += 1;
                if i >= args.len() {
                    return Err("--bind requires an address argument".to_string());
                }
                config.bind = Some(args[i].clone());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("--config requires a path argument".to_string());
                }
                config.config_path = Some(PathBuf::from(&args[i]));
            }
            arg if arg.starts_with("--") => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if config.positional.len() == 3 {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.positional.push(arg.clone());
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Prints one line per recorded step.
fn print_run_summary(record: &RunRecord) {
    println!();
    println!("Run {} ({})", record.run_id, record.request.source_identifier);

    if let Some(ref reason) = record.failure_reason {
        println!("  {} {}", "aborted:".red().bold(), reason);
    }

    for step in &record.steps {
        let status = match step.status {
            StepStatus::Success => step.status.to_string().green(),
            StepStatus::Failed => step.status.to_string().red(),
            StepStatus::TimedOut => step.status.to_string().yellow(),
            StepStatus::Skipped => step.status.to_string().dimmed(),
        };

        let detail = step.error_message.as_deref().unwrap_or("");
        println!(
            "  {:10} {:>9} {:>7} ms  {}",
            step.step_name.as_str(),
            status,
            step.duration_ms,
            detail
        );
    }

    let overall = record.overall_status.to_string();
    let overall = match record.overall_status {
        contentflow::RunStatus::Completed => overall.green().bold(),
        contentflow::RunStatus::CompletedWithErrors => overall.yellow().bold(),
        _ => overall.red().bold(),
    };
    println!();
    println!("Overall: {}", overall);
}

/// Main application entry point. Returns the process exit code.
fn run() -> Result<u8, Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    // Setup logging
    setup_logging(config.verbose);

    // Print banner
    print_banner();

    // Load settings
    let mut settings = Settings::load(config.config_path.as_deref())?;
    if config.demo {
        settings.demo_mode = true;
    }
    if settings.demo_mode {
        info!("Mode: DEMO (synthetic content)");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let store = Arc::new(StatusStore::new());
    let executor = WorkflowExecutor::new(
        Arc::clone(&store),
        settings.collaborators(),
        settings.executor_options(),
    );

    if config.serve {
        let addr = config
            .bind
            .clone()
            .unwrap_or_else(|| settings.bind_address.clone());
        let state = AppState::new(executor, settings);

        runtime.block_on(server::serve(state, &addr))?;
        info!("{} runs tracked at shutdown", store.len());
        return Ok(0);
    }

    let invocation = runtime.block_on(invoke_once(&executor, &settings, &config.positional));

    match invocation.record {
        Some(ref record) => {
            print_run_summary(record);
            print!("{}", render_timeline(record));
        }
        None => error!("No run was started"),
    }

    Ok(invocation.exit_code)
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_FAILED)
        }
    }
}
