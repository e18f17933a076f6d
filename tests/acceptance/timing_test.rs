//! Sleep, wait and uptime behaviour.

use super::common::{timed, SCHED_SLACK};
use hal_common::config::SleepConfig;
use hal_platform::{ms_sleep, sleep_for, uptime_ms, us_wait, LinuxPlatform, Platform};
use std::time::Duration;

#[test]
fn test_ms_sleep_lower_bound() {
    for ms in [0, 1, 5, 20] {
        let elapsed = timed(|| ms_sleep(ms));
        assert!(
            elapsed >= Duration::from_millis(u64::from(ms)),
            "ms_sleep({ms}) returned after {elapsed:?}"
        );
        assert!(elapsed < Duration::from_millis(u64::from(ms)) + SCHED_SLACK);
    }
}

#[test]
fn test_us_wait_lower_bound() {
    for us in [0, 1, 10, 100, 1_000, 10_000] {
        let elapsed = timed(|| us_wait(us));
        assert!(
            elapsed >= Duration::from_micros(u64::from(us)),
            "us_wait({us}) returned after {elapsed:?}"
        );
    }
}

#[test]
fn test_sleep_with_resume_disabled() {
    let config = SleepConfig {
        resume_on_interrupt: false,
    };
    let elapsed = timed(|| sleep_for(Duration::from_millis(3), &config));
    assert!(elapsed >= Duration::from_millis(3));
}

#[test]
fn test_concurrent_sleeps() {
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| timed(|| ms_sleep(10))))
        .collect();
    for handle in handles {
        let elapsed = handle.join().unwrap();
        assert!(elapsed >= Duration::from_millis(10));
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_uptime_monotonic() {
    let first = uptime_ms().unwrap();
    ms_sleep(1_100);
    let second = uptime_ms().unwrap();
    assert!(second >= first);
    // One second of real time must show up at whole-second granularity.
    assert!(second >= first + 1_000, "uptime {first} -> {second}");
}

#[cfg(target_os = "linux")]
#[test]
fn test_uptime_matches_proc() {
    let proc_uptime = std::fs::read_to_string("/proc/uptime").unwrap();
    let secs: f64 = proc_uptime
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap();
    let ms = LinuxPlatform::default().uptime_ms().unwrap();
    #[allow(clippy::cast_precision_loss)]
    let diff = (ms as f64 / 1000.0 - secs).abs();
    assert!(diff < 5.0, "sysinfo {ms} ms vs /proc/uptime {secs} s");
}
