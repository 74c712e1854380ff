//! strider CLI - run locomotion scenarios headlessly

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use strider::config::{MotorConfig, ScenarioConfig};
use strider::sim::input::{InputSource, IntentBuffer, WanderInput};
use strider::sim::motor::TracingDiagnostics;
use strider::sim::{CharacterTelemetry, SimServer, SimSession};

#[derive(Parser)]
#[command(name = "strider")]
#[command(about = "Headless character locomotion simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file for a fixed number of ticks
    Run {
        /// Path to a scenario TOML file
        path: PathBuf,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "300")]
        ticks: u64,
        /// Simulation rate in Hz
        #[arg(long, default_value = "60")]
        tick_rate: u64,
        /// Emit telemetry every N ticks
        #[arg(long, default_value = "10")]
        every: u64,
        /// Emit telemetry as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },
    /// Drive a single character with randomly steered intent in real time
    Wander {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Simulation rate in Hz
        #[arg(long, default_value = "60")]
        tick_rate: u64,
        /// Wander seed (same seed, same walk)
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            path,
            ticks,
            tick_rate,
            every,
            json,
        } => run_scenario(path, ticks, tick_rate, every, json),
        Commands::Wander {
            ticks,
            tick_rate,
            seed,
        } => run_wander(ticks, tick_rate, seed),
    }
}

fn run_scenario(path: PathBuf, ticks: u64, tick_rate: u64, every: u64, json: bool) {
    let scenario = match ScenarioConfig::from_file(&path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let mut session = match SimSession::from_scenario(&scenario) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    for character in &mut session.characters {
        let label = character.id().to_string();
        character
            .motor
            .set_diagnostics(Box::new(TracingDiagnostics { label }));
    }

    println!("Scenario '{}' for {} ticks at {} Hz", scenario.name, ticks, tick_rate);

    let server = SimServer::new(tick_rate);
    let id = server.insert_session(session);
    let handle = server.session(id).expect("session was just inserted");

    let dt = 1.0 / tick_rate.max(1) as f32;
    let every = every.max(1);
    for tick in 0..ticks {
        server.tick_all(dt);
        if tick % every == 0 || tick + 1 == ticks {
            emit_telemetry(&handle.read().telemetry(), json);
        }
    }
}

fn run_wander(ticks: u64, tick_rate: u64, seed: u64) {
    let mut session = SimSession::new();
    session
        .physics
        .add_static_box([0.0, -0.5, 0.0], [200.0, 1.0, 200.0]);

    let (tx, buffer) = IntentBuffer::channel();
    session
        .spawn_character(
            [0.0, 1.1, 0.0],
            strider::sim::constants::physics::CHARACTER_RADIUS,
            strider::sim::constants::physics::CHARACTER_HEIGHT,
            MotorConfig::default(),
            Some(Box::new(buffer)),
            true,
        )
        .expect("default motor config is valid");

    let server = SimServer::new(tick_rate);
    let id = server.insert_session(session);
    let handle = server.session(id).expect("session was just inserted");

    // Producer thread feeds the intent mailbox while the server paces the
    // simulation; the mailbox keeps the last intent when the producer lags.
    let tick_duration = Duration::from_millis(1000 / tick_rate.max(1));
    let producer = thread::spawn(move || {
        let mut wander = WanderInput::new(seed);
        let dt = 1.0 / tick_rate.max(1) as f32;
        for _ in 0..ticks {
            if tx.send(wander.sample(dt)).is_err() {
                break;
            }
            thread::sleep(tick_duration);
        }
    });

    println!("Wandering for {} ticks at {} Hz (seed {})", ticks, tick_rate, seed);
    server.run_for(ticks);
    producer.join().expect("producer thread panicked");

    emit_telemetry(&handle.read().telemetry(), false);
}

fn emit_telemetry(snapshots: &[CharacterTelemetry], json: bool) {
    for snapshot in snapshots {
        if json {
            match serde_json::to_string(snapshot) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("telemetry serialization failed: {}", e),
            }
        } else {
            println!(
                "tick {:5}  {}  pos=({:7.2},{:6.2},{:7.2})  yaw={:6.2}  speed={:5.2}  vvel={:6.2}  grounded={}",
                snapshot.tick,
                snapshot.character,
                snapshot.position[0],
                snapshot.position[1],
                snapshot.position[2],
                snapshot.yaw,
                snapshot.horizontal_speed,
                snapshot.vertical_velocity,
                snapshot.grounded,
            );
        }
    }
}
