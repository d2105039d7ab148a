use std::path::PathBuf;

use clap::Parser;
use swerve_zenoh_runtime::config::RuntimeConfig;
use swerve_zenoh_runtime::kinematics::ZeroCurvature;
use tracing_subscriber::EnvFilter;

/// Predictive swerve drive runtime
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// JSON config file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report chord speed instead of zero when |alpha| <= EPSILON (rad)
    #[arg(long, value_name = "EPSILON")]
    chord_fallback: Option<f64>,

    /// Print the resolved config as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(cli: &Cli) -> Result<RuntimeConfig, swerve_zenoh_runtime::config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };
    if let Some(epsilon) = cli.chord_fallback {
        config.zero_curvature = ZeroCurvature::ChordFallback { epsilon };
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init(); // installs the subscriber globally

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    };

    if cli.print_config {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = swerve_zenoh_runtime::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
