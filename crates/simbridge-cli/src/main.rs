//! `simbridge` – runs a simulated camera bridge against an in-process bus.
//!
//! 1. Loads the configuration from the path given as first argument, or
//!    `~/.simbridge/config.toml` (written with defaults when absent).
//! 2. Creates the bus, a simulated camera and its [`CameraPlugin`].
//! 3. Subscribes to every `monitor` topic so the bridge sees demand.
//! 4. Steps the simulation until the configured step count is reached or
//!    Ctrl-C is pressed, then prints a summary.

mod config;

use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use simbridge_hal::{RecognitionObject, SimCamera};
use simbridge_middleware::{EventBus, TopicReceiver};
use simbridge_runtime::{CameraPlugin, SensorParameters, StampSource, StepReport};
use simbridge_types::BridgeError;

use config::Config;

#[derive(Debug, Default)]
struct Summary {
    steps: u64,
    active_steps: u64,
    images: u64,
    recognitions: u64,
    camera_infos: u64,
    delivered: BTreeMap<String, u64>,
}

impl Summary {
    fn record(&mut self, report: &StepReport) {
        self.steps += 1;
        self.active_steps += u64::from(report.ran);
        self.images += u64::from(report.image_published);
        self.recognitions += u64::from(report.recognitions_published);
        self.camera_infos += u64::from(report.camera_info_published);
    }
}

fn main() -> ExitCode {
    let _guard = simbridge_runtime::init_tracing("simbridge");

    print_banner();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::config_path);
    let cfg = match config::load_from(&path) {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok(None) => {
            let cfg = Config::default();
            match config::save_to(&cfg, &path) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    path.display().to_string().bold()
                ),
                Err(e) => println!("{}: {e}", "Error saving config".red()),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {e}", "Config error".red());
            println!("  Using default configuration.");
            Config::default()
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the bridge …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }

    match run(&cfg, &shutdown) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}: {e}", "Bridge error".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &Config, shutdown: &AtomicBool) -> Result<Summary, BridgeError> {
    let bus = EventBus::new();
    let params = SensorParameters::from_map(&cfg.camera.plugin_parameters())?;

    let mut camera = SimCamera::new(
        cfg.camera.name.as_str(),
        cfg.camera.width,
        cfg.camera.height,
        cfg.camera.fov,
    );
    if cfg.camera.recognition {
        camera = camera.with_recognition();
    }
    camera.set_objects(cfg.objects.iter().map(RecognitionObject::from).collect());

    let stamp_source = if cfg.use_sim_time {
        StampSource::Simulation
    } else {
        StampSource::Wall
    };
    let mut plugin = CameraPlugin::new(camera, &bus, params, cfg.basic_timestep_ms, stamp_source)?;

    let mut monitors: Vec<TopicReceiver> = cfg
        .monitor
        .iter()
        .map(|topic| bus.subscribe(topic))
        .collect();
    println!(
        "  Bridging {} on {}",
        plugin.parameters().name.bold(),
        bus.topics().join(", ").dimmed()
    );
    info!(monitors = monitors.len(), steps = cfg.steps, "bridge running");

    let step = Duration::from_millis(u64::from(cfg.basic_timestep_ms));
    let mut summary = Summary::default();
    let mut tick: u64 = 0;
    while !shutdown.load(Ordering::SeqCst) && (cfg.steps == 0 || tick < cfg.steps) {
        let sim_time = (tick * u64::from(cfg.basic_timestep_ms)) as f64 / 1000.0;
        plugin.device_mut().render_pattern(tick as u8);
        let report = plugin.step(sim_time);
        summary.record(&report);

        for rx in &mut monitors {
            let mut delivered = 0;
            while rx.try_recv().is_ok() {
                delivered += 1;
            }
            *summary.delivered.entry(rx.topic().to_string()).or_default() += delivered;
        }

        tick += 1;
        if cfg.realtime {
            std::thread::sleep(step);
        }
    }

    Ok(summary)
}

fn print_banner() {
    println!();
    println!("{}", "  simbridge".bold().cyan());
    println!(
        "  {} {}",
        "Simulated camera bridge".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!();
}

fn print_summary(summary: &Summary) {
    println!();
    println!("{}", "  Session summary".bold());
    println!("    steps            {} ({} active)", summary.steps, summary.active_steps);
    println!("    images           {}", summary.images);
    println!("    recognitions     {}", summary.recognitions);
    println!("    camera_info      {}", summary.camera_infos);
    for (topic, count) in &summary.delivered {
        println!("    {} {}", format!("{topic:<16}").dimmed(), count);
    }
    println!();
}
