use anyhow::Result;
use awscensus::aws::auth::{CredentialSource, SessionError};
use awscensus::aws::client::{format_aws_error, AwsSession};
use awscensus::aws::regions::get_region_registry;
use awscensus::census::CensusEngine;
use awscensus::config::Config;
use awscensus::report::write_report;
use awscensus::resource::get_counters;
use clap::{Parser, ValueEnum};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Count AWS resources across every supported region
#[derive(Parser, Debug)]
#[command(name = "awscensus", version, about, long_about = None)]
struct Args {
    /// AWS Access Key. Otherwise will use the standard credentials path for the AWS CLI.
    #[arg(long)]
    access: Option<String>,

    /// AWS Secret Key
    #[arg(long)]
    secret: Option<String>,

    /// If you have multiple credential profiles, use this option to specify one.
    #[arg(long)]
    profile: Option<String>,

    /// Only count resources in this region (repeatable)
    #[arg(long = "region", value_name = "REGION")]
    regions: Vec<String>,

    /// Log level for debugging
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }

    /// CLI flag, then config file, then off
    fn resolve(cli: Option<LogLevel>, config: &Config) -> LogLevel {
        cli.or_else(|| {
            config
                .log_level
                .as_deref()
                .and_then(|level| LogLevel::from_str(level, true).ok())
        })
        .unwrap_or(LogLevel::Off)
    }
}

/// `RUST_LOG` directives take precedence over the resolved level
fn log_filter(level: LogLevel, rust_log: Option<&str>) -> Option<EnvFilter> {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return Some(filter),
            Err(e) => eprintln!("Ignoring invalid RUST_LOG {:?}: {}", directives, e),
        }
    }
    level
        .to_tracing_level()
        .map(|tracing_level| {
            EnvFilter::default().add_directive(LevelFilter::from_level(tracing_level).into())
        })
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(level, rust_log.as_deref())?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Could not open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("awscensus started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("awscensus").join("awscensus.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".awscensus").join("awscensus.log");
    }
    PathBuf::from("awscensus.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = Config::load();

    let _log_guard = setup_logging(LogLevel::resolve(args.log_level, &config));

    match run(&args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Census failed: {:#}", err);
            match err.downcast_ref::<SessionError>() {
                Some(session_err) => eprintln!("{}", session_err),
                None => eprintln!("Error: {}", format_aws_error(&err)),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    let profile = config.effective_profile(args.profile.as_deref());

    if args.access.is_some() {
        println!("Access Key specified");
    }
    let source = CredentialSource::from_options(
        args.access.as_deref(),
        args.secret.as_deref(),
        profile.as_deref(),
    )?;

    println!("Establishing AWS session using {}...", source.describe());
    let session = AwsSession::establish(&source).await?;
    println!("Current account ID: {}", session.account_id());

    let allowlist = config.effective_regions(&args.regions);
    if !allowlist.is_empty() {
        tracing::info!("Restricting census to regions: {:?}", allowlist);
    }
    let regions = get_region_registry().clone().with_allowlist(allowlist)?;

    println!("Counting resources across regions. This will take a few minutes...");
    println!();

    let backend = session.backend();
    let engine = CensusEngine::new(&backend, &regions, session.account_id());
    let census = engine.run(get_counters()).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&census, &mut out)?;

    Ok(())
}
