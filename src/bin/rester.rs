//! Rester command line entry point.
//!
//! Loads a suite file, runs it once or in a loop, prints a summary and exits
//! with a non-zero status if any request failed.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use rester::config::{get_config, load_config_file};
use rester::executor::{ExecutionConfig, NativeClient};
use rester::pipeline::{ConsoleReporter, Pipeline, StandardLogSink, Summary};
use rester::suite::{Suite, SuiteError};
use rester::VariableContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "rester", version, about = "Runs declarative HTTP API test suites")]
struct Cli {
    /// A Restfile
    filename: PathBuf,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Do not validate SSL certificates
    #[arg(long)]
    insecure: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show latency statistics
    #[arg(short, long)]
    stats: bool,

    /// Number of iterations to loop for (implies `--loop 0`)
    #[arg(short, long)]
    count: Option<u64>,

    /// Duration in seconds to loop for (implies `--loop 0`)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Keep executing the file every <LOOP> seconds
    #[arg(short = 'l', long = "loop")]
    r#loop: Option<f64>,

    /// Working directory for relative paths in the Restfile
    #[arg(short, long)]
    workdir: Option<PathBuf>,

    /// JSON settings file with a "rester" section
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Iterations {
    Count(u64),
    Until(Duration),
    Forever,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LoopParameters {
    iterations: Iterations,
    delay: Duration,
}

impl LoopParameters {
    /// Returns `None` when the run should not loop at all.
    ///
    /// # Errors
    ///
    /// Returns a message naming the flag when a number of seconds does not
    /// fit in a `Duration`.
    fn from_cli(
        count: Option<u64>,
        duration: Option<f64>,
        delay: Option<f64>,
    ) -> Result<Option<Self>, String> {
        let delay = seconds("loop", delay.unwrap_or(0.0))?;
        let iterations = match (count, duration) {
            (Some(count), _) => Iterations::Count(count),
            (None, Some(limit)) => Iterations::Until(seconds("duration", limit)?),
            (None, None) if delay > Duration::ZERO => Iterations::Forever,
            (None, None) => return Ok(None),
        };
        Ok(Some(Self { iterations, delay }))
    }

    fn should_continue(&self, completed: u64, elapsed: Duration) -> bool {
        match self.iterations {
            Iterations::Count(count) => completed < count,
            Iterations::Until(limit) => elapsed < limit,
            Iterations::Forever => true,
        }
    }
}

/// Negative values count as zero.
fn seconds(flag: &str, value: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(value.max(0.0))
        .map_err(|_| format!("invalid value '{}' for '--{}': too large", value, flag))
}

fn work_dir(cli_workdir: Option<&Path>, restfile: &Path) -> PathBuf {
    if let Some(dir) = cli_workdir {
        return dir.to_path_buf();
    }
    if let Some(dir) = get_config().work_dir {
        return dir;
    }
    match restfile.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn execution_config(cli: &Cli) -> ExecutionConfig {
    let mut config = ExecutionConfig::from_global_config();
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout.max(1);
    }
    if cli.insecure {
        config.validate_certificate = false;
    }
    config
}

fn read_suite(cli: &Cli, work_dir: &Path) -> Result<Suite, SuiteError> {
    if cli.verbose {
        println!("Restfile path: {}", cli.filename.display());
        println!("Working directory: {}\n", work_dir.display());
    }
    let suite = Suite::load(&cli.filename)?;
    if cli.verbose && !suite.variables.is_empty() {
        println!("Defined variables:");
        for name in suite.variables.keys() {
            println!("  - {}", name);
        }
        println!();
    }
    Ok(suite)
}

async fn run(
    cli: &Cli,
    suite: &Suite,
    pipeline: &Pipeline,
    loop_parameters: Option<LoopParameters>,
) -> Summary {
    let mut reporter = ConsoleReporter::stdout(cli.verbose);
    if cli.stats {
        reporter = reporter.with_stats();
    }

    let environment: std::collections::HashMap<String, String> = std::env::vars().collect();
    let filename = cli.filename.display().to_string();

    let Some(loop_parameters) = loop_parameters else {
        println!("🚀  Resting {} ...\n", filename);
        let report = pipeline
            .run(&suite.requests, suite.context(environment), &mut reporter, true)
            .await;
        let summary = report.summary();
        println!("{}", summary);
        return summary;
    };

    if cli.count.is_some() && cli.duration.is_some() {
        println!("⚠️  Both count and duration specified, using count.\n");
    }
    println!("Running every {} seconds ...\n", loop_parameters.delay.as_secs_f64());

    let started = Instant::now();
    let mut grand_total = Summary::default();
    let mut seed: Option<VariableContext> = None;
    let mut completed = 0;

    while loop_parameters.should_continue(completed, started.elapsed()) {
        if completed > 0 {
            tokio::time::sleep(loop_parameters.delay).await;
        }
        println!("🚀  Resting {} ...\n", filename);

        let run_setup = seed.is_none();
        let context = seed
            .clone()
            .unwrap_or_else(|| suite.context(environment.clone()));
        let report = pipeline
            .run(&suite.requests, context, &mut reporter, run_setup)
            .await;

        if run_setup {
            seed = Some(report.context.retain_captures(&suite.setup_names()));
        }

        let summary = report.summary();
        grand_total.add(&summary);
        println!("{}\n", summary);
        println!("TOTAL: {}\n", grand_total);
        completed += 1;
    }

    grand_total
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let loop_parameters = match LoopParameters::from_cli(cli.count, cli.duration, cli.r#loop) {
        Ok(parameters) => parameters,
        Err(message) => Cli::command().error(ErrorKind::ValueValidation, message).exit(),
    };

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Some(path) = &cli.config {
        if let Err(e) = load_config_file(path) {
            eprintln!("❌  {}", e);
            std::process::exit(1);
        }
    }

    let work_dir = work_dir(cli.workdir.as_deref(), &cli.filename);
    let suite = match read_suite(&cli, &work_dir) {
        Ok(suite) => suite,
        Err(SuiteError::NoRequests) => {
            eprintln!("⚠️  no requests defined in {}!", cli.filename.display());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("❌  {}", e);
            std::process::exit(1);
        }
    };

    let config = execution_config(&cli);
    if cli.verbose {
        println!("Request timeout: {}s\n", config.timeout_secs);
    }

    let pipeline = Pipeline::new(Arc::new(NativeClient::new()), config)
        .with_log_sink(Arc::new(StandardLogSink::new(work_dir)));

    let exit_code = tokio::select! {
        summary = run(&cli, &suite, &pipeline, loop_parameters) => summary.exit_code(),
        _ = shutdown_signal() => {
            println!("\nInterrupted by user, terminating ...");
            0
        }
    };

    std::process::exit(exit_code);
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}
