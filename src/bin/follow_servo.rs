//! follow-servo: replay a scripted session through the servo loop.
//!
//! Frames, detections, tracker output and operator clicks come from a
//! JSON-lines scenario; commands go to a serial port, stdout, or nowhere.

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, ValueEnum};
use log::error;

use follow_servo::control::{Actuator, WriterLink};
use follow_servo::integration::ExitReason;
use follow_servo::render::LogRenderer;
use follow_servo::replay::{Scenario, ScenarioSource, ScriptedDetector, ScriptedTracker};
use follow_servo::{
    EventQueue, KalmanTracker, RunSummary, ServoConfig, ServoLoop, ServoPipeline,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TrackerKind {
    /// Use the tracker boxes written in the scenario
    Scripted,
    /// Kalman prediction associated with the scenario's detections
    Kalman,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Click-to-follow visual servo controller", long_about = None)]
struct Args {
    /// Scenario file (JSON lines, one frame per line)
    #[arg(short, long)]
    scenario: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device for the actuator (overrides the config)
    #[arg(short, long)]
    port: Option<String>,

    /// Write actuator commands to stdout instead of a serial port
    #[arg(long, conflicts_with = "port")]
    stdout: bool,

    /// Tracker collaborator
    #[arg(long, value_enum, default_value_t = TrackerKind::Scripted)]
    tracker: TrackerKind,

    /// Do not mirror frames before detection
    #[arg(long)]
    no_mirror: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(summary) => {
            print_summary(&summary);
            match summary.exit {
                ExitReason::SourceFailed(_) => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            }
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> follow_servo::Result<RunSummary> {
    let mut config = match &args.config {
        Some(path) => ServoConfig::load(path)?,
        None => ServoConfig::default(),
    };
    if args.port.is_some() {
        config.actuator.port = args.port.clone();
    }
    if args.no_mirror {
        config.capture.mirror = false;
    }

    let scenario = Rc::new(Scenario::load(&args.scenario)?);
    log::info!(
        "loaded {} frames from {}",
        scenario.len(),
        args.scenario.display()
    );

    let actuator = if args.stdout {
        Actuator::new(Box::new(WriterLink::new(std::io::stdout(), "stdout")))
    } else {
        Actuator::from_config(&config.actuator)
    };

    let events = EventQueue::new();
    let source = ScenarioSource::new(scenario.clone(), events.sender());
    let mut servo_loop =
        ServoLoop::new(source, LogRenderer::default(), events).mirror(config.capture.mirror);
    let detector = ScriptedDetector::new(scenario.clone());

    let summary = match args.tracker {
        TrackerKind::Scripted => {
            let script = scenario.clone();
            let mut pipeline = ServoPipeline::new(
                detector,
                move || ScriptedTracker::new(script.clone()),
                &config,
                actuator,
            );
            servo_loop.run(&mut pipeline)
        }
        TrackerKind::Kalman => {
            let script = scenario.clone();
            let tracker_config = config.tracker;
            let mut pipeline = ServoPipeline::new(
                detector,
                move || KalmanTracker::new(ScriptedDetector::new(script.clone()), tracker_config),
                &config,
                actuator,
            );
            servo_loop.run(&mut pipeline)
        }
    };
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    eprintln!("frames:       {}", summary.frames);
    eprintln!("acquisitions: {}", summary.acquisitions);
    eprintln!("losses:       {}", summary.losses);
    eprintln!("commands:     {} sent, {} dropped", summary.commands_sent, summary.commands_dropped);
    eprintln!("final mode:   {:?}", summary.final_mode);
    eprintln!("exit:         {:?}", summary.exit);
}
