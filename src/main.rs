//! LedManager daemon: main entry point.
//!
//! Hexagonal architecture with a single dispatch thread.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SysfsLedAdapter / SimulatedLeds   PersistedGroups<FileStorage>│
//! │  (PhysicalLedPort)                 (GroupStorePort)            │
//! │  LogEventSink (EventSink)          JsonConfigFile (ConfigPort) │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          LedService (group façade)                     │    │
//! │  │  Manager (arbitration) · IdentifyFanout (overrides)    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  stdin reader ──▶ request queue ──▶ Dispatcher (one thread)    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::SyncSender;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use ledmanager::adapters::config_file::JsonConfigFile;
use ledmanager::adapters::group_store::PersistedGroups;
use ledmanager::adapters::log_sink::LogEventSink;
use ledmanager::adapters::sim_led::SimulatedLeds;
use ledmanager::adapters::storage::FileStorage;
use ledmanager::adapters::sysfs_led::SysfsLedAdapter;
use ledmanager::app::commands::GroupCommand;
use ledmanager::app::overrides::IdentifyFanout;
use ledmanager::app::ports::{ConfigPort, PhysicalLedPort};
use ledmanager::app::service::LedService;
use ledmanager::config::{DEFAULT_CONFIG_PATH, LedBackend, ManagerConfig};
use ledmanager::dispatch::{self, Dispatcher, Request};
use ledmanager::layout::Layout;

#[derive(Parser, Debug)]
#[command(version, about = "LED group arbitration daemon")]
struct Args {
    /// Daemon configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ── 1. Configuration and logging ──────────────────────────
    let config = JsonConfigFile::new(&args.config)
        .load()
        .with_context(|| format!("loading {}", args.config.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level)).init();
    info!("LedManager v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Static layout and overrides ────────────────────────
    let layout = Layout::from_file(&config.layout_path)
        .with_context(|| format!("loading layout {}", config.layout_path.display()))?;

    let mut fanout = IdentifyFanout::new();
    let registrations: Vec<_> = config
        .overrides
        .iter()
        .map(|o| (o.group.clone(), fanout.add(o.target())))
        .collect();
    let mut service = LedService::with_overrides(layout, fanout);
    for (group, id) in registrations {
        service
            .register_override(&group, id)
            .with_context(|| format!("registering override for {group}"))?;
    }

    // ── 3. Persistence ────────────────────────────────────────
    let store = PersistedGroups::new(FileStorage::new(&config.storage_dir));

    // ── 4. Physical LEDs, replay, serve ───────────────────────
    match &config.led_backend {
        LedBackend::Sysfs { root } => {
            let leds = SysfsLedAdapter::new(root);
            serve(&config, Dispatcher::new(service, store, leds, LogEventSink::new()))
        }
        LedBackend::Simulated => {
            warn!("Simulated LED backend: no physical LEDs will change");
            let leds = SimulatedLeds::from_layout(service.layout());
            serve(&config, Dispatcher::new(service, store, leds, LogEventSink::new()))
        }
    }
}

fn serve<L: PhysicalLedPort>(
    config: &ManagerConfig,
    mut dispatcher: Dispatcher<IdentifyFanout, PersistedGroups<FileStorage>, L, LogEventSink>,
) -> Result<()> {
    let report = dispatcher.start();
    for (group, reason) in &report.skipped {
        warn!("Not restored: {} ({})", group, reason);
    }

    let (tx, rx) = dispatch::queue(config.queue_depth);
    let reader = thread::Builder::new()
        .name("requests".into())
        .spawn(move || read_requests(&tx))
        .context("spawning request reader")?;

    let processed = dispatcher.run(&rx);
    info!("Dispatcher stopped after {} request(s)", processed);

    if reader.join().is_err() {
        warn!("request reader panicked");
    }
    Ok(())
}

/// Feed stdin lines into the queue, one request at a time, and print
/// each reply.  EOF shuts the dispatcher down.
fn read_requests(tx: &SyncSender<Request>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        let command: GroupCommand = match line.parse() {
            Ok(c) => c,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };

        let group = command.group().to_owned();
        let (request, reply) = Request::with_reply(command);
        if tx.send(request).is_err() {
            return;
        }
        match reply.recv() {
            Ok(Ok(value)) => println!("{group} asserted={value}"),
            Ok(Err(e)) => println!("error: {e}"),
            Err(_) => return,
        }
    }
    let _ = tx.send(Request::Shutdown);
}
