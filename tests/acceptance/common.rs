//! Common utilities for acceptance tests.

#![allow(dead_code)] // Not every test module uses every helper

use std::io::Write;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

/// Generous ceiling for how late a short sleep may return on a busy host.
pub const SCHED_SLACK: Duration = Duration::from_millis(250);

/// Run `f` and return how long it took.
pub fn timed<F: FnOnce()>(f: F) -> Duration {
    let start = Instant::now();
    f();
    start.elapsed()
}

/// Write `contents` to a temporary TOML file.
pub fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp config");
    file
}

/// Fraction of set bits in `bytes`.
#[allow(clippy::cast_precision_loss)]
pub fn bit_density(bytes: &[u8]) -> f64 {
    let ones: u32 = bytes.iter().map(|b| b.count_ones()).sum();
    f64::from(ones) / (bytes.len() * 8) as f64
}
