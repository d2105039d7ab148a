// Arc preview: step the predictive solver offline and print module commands
//
// Usage: cargo run --example arc_preview -- --vx 0.5 --omega 1.0 --steps 10
//
// The chassis is assumed to follow the command exactly, so each step's
// estimated pose becomes the next step's current pose.

use clap::Parser;
use swerve_zenoh_runtime::config::RuntimeConfig;
use swerve_zenoh_runtime::kinematics::{
    ChassisSpeeds, Pose2d, PredictiveSwerveKinematics, SwerveModuleState, ZeroCurvature,
};

#[derive(Parser, Debug)]
#[command(about = "Print predicted swerve module commands over a few cycles")]
struct Args {
    /// Field-frame x velocity (m/s)
    #[arg(long, default_value_t = 0.5, allow_hyphen_values = true)]
    vx: f64,

    /// Field-frame y velocity (m/s)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    vy: f64,

    /// Angular velocity (rad/s)
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    omega: f64,

    /// Number of 20 ms cycles
    #[arg(long, default_value_t = 10)]
    steps: usize,

    /// Enable chord fallback with this epsilon (rad)
    #[arg(long)]
    chord_fallback: Option<f64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = RuntimeConfig::default();
    let mut kinematics = PredictiveSwerveKinematics::new(config.module_offsets());
    if let Some(epsilon) = args.chord_fallback {
        kinematics = kinematics.with_zero_curvature(ZeroCurvature::ChordFallback { epsilon });
    }

    let speeds = ChassisSpeeds::new(args.vx, args.vy, args.omega);
    let mut pose = Pose2d::default();
    let mut states = vec![SwerveModuleState::default(); kinematics.module_count()];

    println!("Module offsets:");
    for (i, offset) in kinematics.module_offsets().iter().enumerate() {
        println!("  [{}] {}", i, offset);
    }
    println!("Command: {}", speeds);
    println!();

    for step in 1..=args.steps {
        states = match kinematics.to_module_states(speeds, pose, &states) {
            Ok(next) => next,
            Err(e) => {
                eprintln!("Step {}: {}", step, e);
                return;
            }
        };
        pose = PredictiveSwerveKinematics::estimate_pose(speeds, pose);

        println!("Step {:>3}: pose {}", step, pose);
        for (i, state) in states.iter().enumerate() {
            println!("    [{}] {}", i, state);
        }
    }
}
