// 50 Hz loop with watchdog
// Each tick turns the latest chassis command and pose into module commands.
// The runtime owns module continuity: what it publishes this tick is fed back
// to the solver as the previous states next tick. Whenever a command can't be
// trusted it publishes zero speed with every module holding its heading.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::{LOOP_HZ, RuntimeConfig};
use crate::kinematics::{
    ChassisSpeeds, Pose2d, PredictiveSwerveKinematics, SwerveModuleState,
};
use crate::messages::{ChassisCommand, ModuleActuation, PoseUpdate, RuntimeHealth};

pub struct Runtime {
    kinematics: PredictiveSwerveKinematics,
    prev_states: Vec<SwerveModuleState>,
    latest_cmd: Option<ChassisCommand>,
    cmd_received_at: Instant,
    latest_pose: Option<Pose2d>,
    pose_received_at: Instant,
    cmd_timeout: Duration,
    pose_timeout: Duration,
    health: RuntimeHealth,
}

impl Runtime {
    pub fn new(config: &RuntimeConfig) -> Self {
        let kinematics = PredictiveSwerveKinematics::new(config.module_offsets())
            .with_zero_curvature(config.zero_curvature);
        let prev_states = vec![SwerveModuleState::default(); kinematics.module_count()];
        Self {
            kinematics,
            prev_states,
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            latest_pose: None,
            pose_received_at: Instant::now(),
            cmd_timeout: config.cmd_timeout(),
            pose_timeout: config.pose_timeout(),
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn prev_states(&self) -> &[SwerveModuleState] {
        &self.prev_states
    }

    /// Process incoming command
    pub fn on_command(&mut self, cmd: ChassisCommand) {
        debug!("Received command: {:?}", &cmd);
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = Instant::now();
    }

    /// Process incoming pose
    pub fn on_pose(&mut self, pose: PoseUpdate) {
        debug!("Received pose: {:?}", &pose);
        self.latest_pose = Some(Pose2d::from(&pose));
        self.pose_received_at = Instant::now();
    }

    /// Compute actuation based on watchdog state
    pub fn compute_actuation(&mut self) -> ModuleActuation {
        let cmd_age = self.cmd_received_at.elapsed();
        let speeds = match self.latest_cmd {
            Some(ref cmd) if cmd_age <= self.cmd_timeout => ChassisSpeeds::from(cmd),
            _ => {
                // Watchdog triggered (or no command ever received) - stop the robot
                if self.health != RuntimeHealth::CmdStale && self.latest_cmd.is_some() {
                    warn!("Command stale ({:?} old), stopping robot", cmd_age);
                }
                return self.hold(RuntimeHealth::CmdStale);
            }
        };

        let pose_age = self.pose_received_at.elapsed();
        let pose = match self.latest_pose {
            Some(pose) if pose_age <= self.pose_timeout => pose,
            _ => {
                if self.health != RuntimeHealth::PoseStale {
                    warn!("No fresh pose ({:?} since last), holding modules", pose_age);
                }
                return self.hold(RuntimeHealth::PoseStale);
            }
        };

        match self.kinematics.to_module_states(speeds, pose, &self.prev_states) {
            Ok(states) => {
                if self.health != RuntimeHealth::Ok {
                    info!("Commands fresh, driving");
                }
                self.health = RuntimeHealth::Ok;
                let actuation = ModuleActuation::from(&states[..]);
                self.prev_states = states;
                actuation
            }
            Err(e) => {
                warn!("Kinematics fault: {}", e);
                self.hold(RuntimeHealth::KinematicsFault)
            }
        }
    }

    /// Zero speed, headings held; also becomes next tick's previous state
    fn hold(&mut self, health: RuntimeHealth) -> ModuleActuation {
        self.health = health;
        self.prev_states = PredictiveSwerveKinematics::hold_states(&self.prev_states);
        ModuleActuation::from(&self.prev_states[..])
    }

    /// Stop command for shutdown
    pub fn stop(&mut self) -> ModuleActuation {
        let health = self.health;
        let actuation = self.hold(health);
        info!("Holding {} modules at zero speed", actuation.modules.len());
        actuation
    }
}

pub async fn run(config: RuntimeConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let sub_cmd = session.declare_subscriber(config.topic_cmd.as_str()).await?;
    let sub_pose = session.declare_subscriber(config.topic_pose.as_str()).await?;
    let pub_actuation = session.declare_publisher(config.topic_modules.as_str()).await?;
    let pub_health = session.declare_publisher(config.topic_health.as_str()).await?;

    let mut runtime = Runtime::new(&config);
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Runtime started: {}Hz loop, {} modules, {}ms command / {}ms pose watchdog",
        LOOP_HZ,
        config.module_offsets.len(),
        config.cmd_timeout_ms,
        config.pose_timeout_ms
    );
    info!("Subscribed to: {}, {}", config.topic_cmd, config.topic_pose);
    info!("Publishing to: {}, {}", config.topic_modules, config.topic_health);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                let actuation_json = serde_json::to_string(&runtime.stop())?;
                pub_actuation.put(actuation_json).await?;
                return Ok(());
            }
        }

        // 1. Drain all pending commands and poses (non-blocking), keep latest
        while let Ok(Some(sample)) = sub_cmd.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<ChassisCommand>(&payload) {
                Ok(cmd) => runtime.on_command(cmd),
                Err(e) => warn!("Failed to parse command: {}", e),
            }
        }
        while let Ok(Some(sample)) = sub_pose.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<PoseUpdate>(&payload) {
                Ok(pose) => runtime.on_pose(pose),
                Err(e) => warn!("Failed to parse pose: {}", e),
            }
        }

        // 2. Compute actuation (includes watchdog logic)
        let actuation = runtime.compute_actuation();

        // 3. Publish actuation
        let actuation_json = serde_json::to_string(&actuation)?;
        pub_actuation.put(actuation_json).await?;

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health)?;
        pub_health.put(health_json).await?;
    }
}
