//! Platform probe entry point.
//!
//! Exercises each primitive on the live host and reports the result,
//! for bring-up and for checking timer behaviour on a new board.

mod report;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use hal_common::config::PlatformConfig;
use hal_common::metrics::LatencyMetrics;
use hal_platform::{capabilities, LinuxPlatform, Platform, COUNTER_SOURCE};
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::report::{
    CapsReport, CyclesReport, JitterReport, RandomReport, SleepReport, UptimeReport,
};

/// Percentiles reported by `jitter`.
const JITTER_PERCENTILES: [f64; 4] = [50.0, 90.0, 99.0, 99.9];

/// Upper bound on `random --len`.
const MAX_RANDOM_LEN: usize = 1 << 20;

/// Samples retained by `jitter`; later iterations rotate through the ring.
const MAX_JITTER_SAMPLES: usize = 100_000;

/// Platform probe command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "hal-probe",
    about = "Exercise the HAL platform primitives on this host",
    version,
    long_about = None
)]
struct Args {
    /// Path to a platform configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "warn", global = true)]
    log_level: String,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Milliseconds since boot.
    Uptime,

    /// Sample the hardware cycle counter.
    Cycles {
        /// Number of samples, 1 ms apart.
        #[arg(long, short = 'n', default_value = "5")]
        samples: usize,
    },

    /// Sleep once and report the measured duration.
    #[command(group(ArgGroup::new("duration").required(true).args(["ms", "us"])))]
    Sleep {
        /// Milliseconds to sleep.
        #[arg(long)]
        ms: Option<u32>,
        /// Microseconds to wait.
        #[arg(long)]
        us: Option<u32>,
    },

    /// Print random bytes as hex.
    Random {
        /// Number of bytes.
        #[arg(long, default_value = "16")]
        len: usize,
    },

    /// Measure sleep overshoot over many iterations.
    Jitter {
        /// Requested wait per iteration, in microseconds.
        #[arg(long, default_value = "1000")]
        interval_us: u32,
        /// Number of iterations.
        #[arg(long, default_value = "1000")]
        iterations: u32,
        /// Overshoot above which an iteration is counted, in microseconds.
        #[arg(long, default_value = "100")]
        threshold_us: u64,
    },

    /// Report host capabilities.
    Caps,

    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting HAL probe");

    let config = PlatformConfig::resolve(args.config.as_deref())
        .context("Failed to load platform configuration")?;
    debug!(?config, "Configuration loaded");

    let platform = LinuxPlatform::new(config);
    run(&args.command, &platform, args.json)
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!("hal_probe={level},hal_platform={level},hal_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: &Command, platform: &LinuxPlatform, json: bool) -> Result<()> {
    match command {
        Command::Uptime => {
            let uptime_ms = platform.uptime_ms().context("Failed to read uptime")?;
            emit(&UptimeReport { uptime_ms }, json)
        }
        Command::Cycles { samples } => emit(&sample_cycles(platform, *samples)?, json),
        Command::Sleep { ms, us } => {
            let requested = match (ms, us) {
                (Some(ms), _) => Duration::from_millis(u64::from(*ms)),
                (None, Some(us)) => Duration::from_micros(u64::from(*us)),
                (None, None) => bail!("either --ms or --us is required"),
            };
            let start = Instant::now();
            match (ms, us) {
                (Some(ms), _) => platform.ms_sleep(*ms),
                (None, Some(us)) => platform.us_wait(*us),
                (None, None) => {}
            }
            let actual = start.elapsed();
            emit(
                &SleepReport {
                    requested_ns: saturating_nanos(requested),
                    actual_ns: saturating_nanos(actual),
                },
                json,
            )
        }
        Command::Random { len } => {
            if *len > MAX_RANDOM_LEN {
                bail!("--len must be at most {MAX_RANDOM_LEN}");
            }
            let mut buf = vec![0u8; *len];
            platform
                .fill_random(&mut buf)
                .context("Failed to read random bytes")?;
            emit(&RandomReport::new(&buf), json)
        }
        Command::Jitter {
            interval_us,
            iterations,
            threshold_us,
        } => emit(
            &measure_jitter(platform, *interval_us, *iterations, *threshold_us),
            json,
        ),
        Command::Caps => emit(&CapsReport(capabilities::probe()), json),
        Command::Config => {
            let toml = platform
                .config()
                .to_toml()
                .context("Failed to serialize configuration")?;
            print!("{toml}");
            Ok(())
        }
    }
}

/// Read the counter `samples` times, 1 ms apart.
fn sample_cycles(platform: &LinuxPlatform, samples: usize) -> Result<CyclesReport> {
    if samples == 0 {
        bail!("--samples must be at least 1");
    }

    let mut readings = Vec::with_capacity(samples);
    for i in 0..samples {
        if i > 0 {
            platform.ms_sleep(1);
        }
        readings.push(platform.cycle_count());
    }

    let deltas: Vec<u64> = readings
        .windows(2)
        .map(|w| w[0].wrapping_delta(w[1]))
        .collect();

    let frequency_hz = match platform.cycle_clock() {
        Ok(clock) => Some(clock.frequency_hz()),
        Err(e) => {
            warn!(error = %e, "counter calibration failed");
            None
        }
    };

    let converted = match deltas.first() {
        Some(&delta) => Some(platform.cycles_to_ns(delta).with_context(|| {
            format!(
                "Failed to convert cycles ({:?})",
                platform.config().cycles.conversion
            )
        })?),
        None => None,
    };

    Ok(CyclesReport {
        source: COUNTER_SOURCE,
        samples: readings.iter().map(|c| c.0).collect(),
        deltas,
        frequency_hz,
        converted,
    })
}

/// Wait `interval_us` repeatedly and record how far each wait overshoots.
fn measure_jitter(
    platform: &LinuxPlatform,
    interval_us: u32,
    iterations: u32,
    threshold_us: u64,
) -> JitterReport {
    let requested = Duration::from_micros(u64::from(interval_us));
    let capacity = jitter_capacity(iterations);
    let mut metrics = LatencyMetrics::new(capacity, Duration::from_micros(threshold_us));

    info!(interval_us, iterations, "Measuring sleep jitter");
    for _ in 0..iterations {
        let start = Instant::now();
        platform.us_wait(interval_us);
        metrics.record(start.elapsed().saturating_sub(requested));
    }

    JitterReport {
        interval_us,
        overshoot: metrics.snapshot(),
        percentiles: metrics
            .percentiles(&JITTER_PERCENTILES)
            .into_iter()
            .map(|(p, d)| (p, saturating_nanos(d)))
            .collect(),
    }
}

/// Ring buffer size for `iterations` samples.
fn jitter_capacity(iterations: u32) -> usize {
    usize::try_from(iterations)
        .unwrap_or(usize::MAX)
        .min(MAX_JITTER_SAMPLES)
}

fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

fn emit<T: Serialize + Display>(report: &T, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to encode JSON")?
        );
    } else {
        print!("{report}");
    }
    Ok(())
}
