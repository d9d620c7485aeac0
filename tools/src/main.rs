use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ground_probe::SurfaceWorld;
use locomotion_controller::{DirectInputAdapter, LocomotionController, RawInput};
use locomotion_fsm::{ConfigError, JumpProfile, LocomotionConfig, MAX_JUMP_COUNT};
use rapier3d::math::Isometry;
use rapier3d::prelude::{vector, ColliderBuilder};
use tracing_subscriber::EnvFilter;

mod script;

use script::SimScript;

const EXIT_SUCCESS: i32 = 0;
const EXIT_USAGE: i32 = 2;
const EXIT_CONFIG: i32 = 10;
const EXIT_SCRIPT: i32 = 11;

#[derive(Parser)]
#[command(name = "tools", version, about = "Locomotion tools CLI")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the per-stage jump velocities and gravities.
    Profile {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Validate a tuning file.
    Check {
        #[arg(long, value_name = "PATH")]
        config: PathBuf,
    },
    Simulate(SimulateArgs),
}

#[derive(Parser)]
struct SimulateArgs {
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Ticks to idle when no script is given.
    #[arg(long)]
    ticks: Option<u32>,

    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Print every Nth tick.
    #[arg(long, default_value_t = 1)]
    every: u32,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let exit_code = match cli.command {
        Commands::Profile { config } => run_profile(config.as_deref()),
        Commands::Check { config } => run_check(&config),
        Commands::Simulate(args) => run_simulate(args),
    };
    std::process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<LocomotionConfig, i32> {
    let Some(path) = path else {
        return Ok(LocomotionConfig::default());
    };
    match LocomotionConfig::load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::Invalid(errors)) => {
            for error in errors {
                eprintln!("{}: {}", path.display(), error);
            }
            Err(EXIT_CONFIG)
        }
        Err(err) => {
            eprintln!("{}", err);
            Err(EXIT_CONFIG)
        }
    }
}

fn run_profile(config: Option<&Path>) -> i32 {
    let config = match load_config(config) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let profile = JumpProfile::from_config(&config);
    println!("{:>5} {:>12} {:>12}", "stage", "velocity", "gravity");
    println!("{:>5} {:>12} {:>12.4}", 0, "-", profile.gravity(0));
    for stage in 1..=MAX_JUMP_COUNT {
        println!(
            "{:>5} {:>12.4} {:>12.4}",
            stage,
            profile.initial_velocity(stage),
            profile.gravity(stage)
        );
    }
    EXIT_SUCCESS
}

fn run_check(path: &Path) -> i32 {
    let config = match LocomotionConfig::read(path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return EXIT_CONFIG;
        }
    };
    let validation = config.validate();
    for warning in &validation.warnings {
        println!("warning: {}", warning);
    }
    for error in &validation.errors {
        println!("error: {}", error);
    }
    if validation.is_ok() {
        println!("{}: ok", path.display());
        EXIT_SUCCESS
    } else {
        EXIT_CONFIG
    }
}

fn run_simulate(args: SimulateArgs) -> i32 {
    if !args.dt.is_finite() || args.dt <= 0.0 {
        eprintln!("--dt must be > 0");
        return EXIT_USAGE;
    }
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let script = match load_script(args.script.as_deref(), args.ticks.unwrap_or(60)) {
        Ok(script) => script,
        Err(code) => return code,
    };

    let mut world = SurfaceWorld::new();
    let extent = script.floor_half_extent;
    world.insert_walkable(
        ColliderBuilder::cuboid(extent, 1.0, extent)
            .translation(vector![0.0, -1.0, 0.0])
            .build(),
    );
    world.refresh();

    let [x, y, z] = script.start;
    let mut controller = LocomotionController::new(
        DirectInputAdapter,
        config,
        script.half_height,
        Isometry::translation(x, y, z),
    );

    tracing::info!(ticks = script.total_ticks(), dt = args.dt, "simulation start");
    println!(
        "{:>6} {:>9} {:>5} {:>9} {:>9} {:>9} {:>5} flags",
        "tick", "root", "sub", "x", "y", "z", "jumps"
    );
    let every = args.every.max(1);
    for (tick, step) in script.ticks().enumerate() {
        let frame = controller.tick(
            &world,
            RawInput {
                move_x: step.move_axis[0],
                move_y: step.move_axis[1],
                run: step.run,
                jump: step.jump,
            },
            args.dt,
        );
        if tick as u32 % every != 0 {
            continue;
        }
        let locomotion = frame.locomotion;
        let sub = locomotion
            .substate
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "-".to_string());
        let flags = &locomotion.animation;
        let position = frame.position.translation;
        println!(
            "{:>6} {:>9} {:>5} {:>9.3} {:>9.3} {:>9.3} {:>5} {}{}{}{}",
            tick,
            locomotion.root.to_string(),
            sub,
            position.x,
            position.y,
            position.z,
            locomotion.jump_count,
            if flags.walking { "W" } else { "." },
            if flags.running { "R" } else { "." },
            if flags.jumping { "J" } else { "." },
            if flags.falling { "F" } else { "." },
        );
    }
    EXIT_SUCCESS
}

fn load_script(path: Option<&Path>, idle_ticks: u32) -> Result<SimScript, i32> {
    let Some(path) = path else {
        return Ok(SimScript::idle(idle_ticks));
    };
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("failed to read {}: {}", path.display(), err);
            return Err(EXIT_SCRIPT);
        }
    };
    let script = match SimScript::parse_toml(&text) {
        Ok(script) => script,
        Err(err) => {
            eprintln!("script parse failed: {}", err);
            return Err(EXIT_SCRIPT);
        }
    };
    let errors = script.validate();
    if !errors.is_empty() {
        for error in errors {
            eprintln!("{}: {}", path.display(), error);
        }
        return Err(EXIT_SCRIPT);
    }
    Ok(script)
}
