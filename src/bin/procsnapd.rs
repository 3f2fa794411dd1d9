//! procsnapd - CPU usage sampling daemon.
//!
//! Logs a one-time host summary, then samples aggregate CPU counters at a
//! fixed interval and reports each delta as a log line or a JSON line on
//! stdout until interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use serde::Serialize;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use procsnap::collector::{Collector, FileSystem, RealFs, SysInfoSource};
use procsnap::config::{DEFAULT_MTAB_PATH, DEFAULT_PROC_PATH, ProcConfig};
use procsnap::model::Cpu;
use procsnap::rates::cpu_busy_percent;
use procsnap::sampler::{Backpressure, SamplerConfig};

/// How often the main loop checks for the shutdown signal.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// CPU usage sampling daemon.
#[derive(Parser)]
#[command(name = "procsnapd", about = "CPU usage sampling daemon", version)]
struct Args {
    /// Sampling interval in seconds.
    #[arg(short, long, default_value = "1")]
    interval: u64,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = DEFAULT_PROC_PATH)]
    proc_path: String,

    /// Path to the mount table.
    #[arg(long, default_value = DEFAULT_MTAB_PATH)]
    mtab_path: String,

    /// Discard samples instead of waiting when output falls behind.
    #[arg(long)]
    drop_samples: bool,

    /// Print each sample as a JSON line on stdout.
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// One reported CPU delta.
#[derive(Serialize)]
struct CpuSample {
    /// Unix time of the report, in milliseconds.
    timestamp: u64,
    delta: Cpu,
    busy_percent: Option<f64>,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["procsnapd", "procsnap"] {
        if let Ok(directive) = format!("{}={}", target, level).parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Describes the host for the startup log line.
fn describe_host<F: FileSystem + SysInfoSource + Clone>(collector: &Collector<F>) -> String {
    let mut parts: Vec<String> = Vec::new();

    match collector.cpu_list() {
        Ok(cpus) => parts.push(format!("{} cpus", cpus.list.len())),
        Err(e) => warn!("Cannot read per-core counters: {}", e),
    }
    match collector.mem() {
        Ok(mem) => parts.push(format!("{} MiB memory", mem.total / (1024 * 1024))),
        Err(e) => warn!("Cannot read memory: {}", e),
    }
    match collector.swap() {
        Ok(swap) => parts.push(format!("{} MiB swap", swap.total / (1024 * 1024))),
        Err(e) => debug!("Cannot read swap: {}", e),
    }
    match collector.file_systems() {
        Ok(mounts) => parts.push(format!("{} mounts", mounts.list.len())),
        Err(e) => warn!("Cannot read mount table: {}", e),
    }
    match collector.net_interfaces() {
        Ok(ifaces) => parts.push(format!("{} interfaces", ifaces.list.len())),
        Err(e) => warn!("Cannot read network interfaces: {}", e),
    }
    match collector.proc_list() {
        Ok(procs) => parts.push(format!("{} processes", procs.list.len())),
        Err(e) => warn!("Cannot enumerate processes: {}", e),
    }
    match collector.uptime() {
        Ok(uptime) => parts.push(format!("up {:.0}s", uptime.length)),
        Err(e) => debug!("Cannot read uptime: {}", e),
    }

    parts.join(", ")
}

fn report(delta: Cpu, json: bool) {
    let busy = cpu_busy_percent(&delta);

    if json {
        let sample = CpuSample {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            delta,
            busy_percent: busy,
        };
        match serde_json::to_string(&sample) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("Failed to serialize sample: {}", e),
        }
        return;
    }

    match busy {
        Some(busy) => info!(
            "cpu {:.1}% busy (user={} sys={} idle={} wait={} ticks)",
            busy, delta.user, delta.sys, delta.idle, delta.wait
        ),
        None => debug!("No CPU ticks elapsed"),
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    info!("procsnapd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}s, proc={}, mtab={}, drop_samples={}",
        args.interval, args.proc_path, args.mtab_path, args.drop_samples
    );

    if args.interval == 0 {
        error!("Interval must be at least 1 second");
        std::process::exit(2);
    }

    let fs = RealFs::new();
    let config = ProcConfig::new(&args.proc_path)
        .with_mtab_path(&args.mtab_path)
        .discover(&fs);
    let collector = Collector::new(fs, config);

    info!("Host: {}", describe_host(&collector));

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let backpressure = if args.drop_samples {
        Backpressure::Drop
    } else {
        Backpressure::Block
    };
    let sampler_config =
        SamplerConfig::new(Duration::from_secs(args.interval)).with_backpressure(backpressure);

    let (stream, handle) = match collector.collect_cpu_stats_with(sampler_config) {
        Ok(started) => started,
        Err(e) => {
            error!("Failed to start CPU sampler: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting sampling loop");

    let mut sample_count: u64 = 0;
    while running.load(Ordering::SeqCst) {
        match stream.recv_timeout(SHUTDOWN_POLL) {
            Ok(delta) => {
                sample_count += 1;
                report(delta, args.json);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                error!("CPU sampler stopped unexpectedly");
                break;
            }
        }
    }

    // Graceful shutdown
    info!("Shutting down...");
    handle.stop();
    info!("Shutdown complete after {} samples", sample_count);
}
