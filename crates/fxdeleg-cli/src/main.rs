//! fxdeleg CLI: validate and explain delegation event files.

use clap::{Parser, Subcommand, ValueEnum};
use fxdeleg_core::config::{TelemetryConfig, TelemetryOverlay};
use fxdeleg_core::hash::hash_serde;
use fxdeleg_telemetry::{
    parse_yaml_events, DelegationEvent, DelegationTracker, EventFile, RecordingTracker,
    TracingTracker,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fxdeleg")]
#[command(about = "Explain why formula constructs were or were not delegated", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that an event file parses and every name resolves
    Validate {
        /// Path to the events YAML file
        #[arg(short, long)]
        events: PathBuf,
    },

    /// Print one telemetry descriptor per event
    Explain {
        /// Path to the events YAML file
        #[arg(short, long)]
        events: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Drop successful delegations (overrides config)
        #[arg(long)]
        no_successful: bool,

        /// Drop repeated descriptors (overrides config)
        #[arg(long)]
        dedupe: bool,

        /// Keep at most this many events (overrides config)
        #[arg(long)]
        max_events: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();
    let env_config = TelemetryConfig::from_env();

    match cli.command {
        Commands::Validate { events } => match validate_events(&events, env_config) {
            Ok(n) => println!("✓ {} events are valid", n),
            Err(e) => {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Explain {
            events,
            format,
            no_successful,
            dedupe,
            max_events,
        } => {
            let overrides = Overrides {
                no_successful,
                dedupe,
                max_events,
            };
            if let Err(e) = explain_events(&events, env_config, &overrides, format) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// CLI flags; each only ever tightens what the config allows.
#[derive(Debug, Default)]
struct Overrides {
    no_successful: bool,
    dedupe: bool,
    max_events: Option<usize>,
}

/// Env defaults < file `config:` block < CLI flags, merged field by field.
fn resolve_config(
    mut cfg: TelemetryConfig,
    file: Option<&TelemetryOverlay>,
    overrides: &Overrides,
) -> TelemetryConfig {
    if let Some(overlay) = file {
        overlay.apply(&mut cfg);
    }
    if overrides.no_successful {
        cfg.emit_successful = false;
    }
    if overrides.dedupe {
        cfg.dedupe = true;
    }
    if let Some(max) = overrides.max_events {
        cfg.max_events = Some(max);
    }
    cfg
}

/// Parse an event file and settle the effective config. Logging starts only
/// once the file's `log_level` is known.
fn load_events(
    yaml: &str,
    env_config: TelemetryConfig,
    overrides: &Overrides,
) -> Result<(EventFile, TelemetryConfig), Box<dyn std::error::Error>> {
    let file = parse_yaml_events(yaml)?;
    let config = resolve_config(env_config, file.config.as_ref(), overrides);
    config.validate()?;
    Ok((file, config))
}

fn validate_events(
    path: &PathBuf,
    env_config: TelemetryConfig,
) -> Result<usize, Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(path)?;
    let (file, config) = load_events(&yaml_content, env_config, &Overrides::default())?;
    init_tracing(&config.log_level);
    let events = file.events()?;
    tracing::debug!(path = %path.display(), events = events.len(), "validated event file");
    Ok(events.len())
}

fn explain_events(
    path: &PathBuf,
    env_config: TelemetryConfig,
    overrides: &Overrides,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(path)?;
    let (file, config) = load_events(&yaml_content, env_config, overrides)?;
    init_tracing(&config.log_level);

    let recorder = RecordingTracker::new(config.clone());
    let logger = TracingTracker::new(config);
    for event in file.events()? {
        logger.set_status(event.clone());
        recorder.set_status(event);
    }

    let events = recorder.events();
    for event in &events {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(event)?),
            OutputFormat::Text => println!("{}", render_text(event)),
        }
    }

    if format == OutputFormat::Text {
        println!();
        println!("Summary (fxdeleg {})", fxdeleg_core::VERSION);
        println!("==================");
        for (status, n) in recorder.counts() {
            println!("  {:<32} {}", status, n);
        }
        println!("  {:<32} {}", "dropped", recorder.dropped());
        println!("  Digest: {}", hash_serde(&events)?);
    }

    Ok(())
}

fn render_text(event: &DelegationEvent) -> String {
    format!(
        "{:<32} info={:?} data_source={}",
        event.status,
        event.info.info(),
        event.info.data_source_name().unwrap_or("-")
    )
}
