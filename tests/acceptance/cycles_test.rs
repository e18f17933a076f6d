//! Cycle counter monotonicity and conversion.

use super::common::config_file;
use hal_common::config::{CycleConversion, PlatformConfig};
use hal_platform::{clock_ticks_per_second, cycles, us_wait, CycleClock, LinuxPlatform, Platform};
use std::time::{Duration, Instant};

#[test]
fn test_consecutive_reads_monotonic() {
    let mut previous = cycles::now();
    for _ in 0..10_000 {
        let current = cycles::now();
        // A backwards step would show up as an enormous wrapped delta.
        assert!(previous.wrapping_delta(current) < u64::MAX / 2);
        previous = current;
    }
}

#[test]
fn test_counter_advances_across_wait() {
    let platform = LinuxPlatform::default();
    let start = platform.cycle_count();
    us_wait(1_000);
    let end = platform.cycle_count();
    assert!(start.wrapping_delta(end) > 0);
}

#[test]
fn test_clock_ticks_conversion_ignores_input() {
    let platform = LinuxPlatform::default();
    let ticks = clock_ticks_per_second();
    for cycles in [0, 1, 999, 1 << 40, u64::MAX] {
        assert_eq!(platform.cycles_to_ns(cycles).unwrap(), ticks);
    }
}

#[test]
fn test_calibrated_conversion_tracks_wall_clock() {
    let clock = CycleClock::calibrate(Duration::from_millis(20)).unwrap();

    let wall = Instant::now();
    let start = cycles::now();
    us_wait(20_000);
    let end = cycles::now();
    let wall = wall.elapsed();

    let measured = clock.elapsed(start, end);
    let diff = if measured > wall {
        measured - wall
    } else {
        wall - measured
    };
    assert!(
        diff < wall / 4,
        "counter says {measured:?}, wall clock says {wall:?}"
    );
}

#[test]
fn test_calibrated_conversion_is_monotone() {
    let clock = CycleClock::calibrate(Duration::from_millis(5)).unwrap();
    let mut last = 0;
    for cycles in (0..1_000_000u64).step_by(997) {
        let ns = clock.cycles_to_ns(cycles);
        assert!(ns >= last);
        last = ns;
    }
    let one_second = clock.cycles_to_ns(clock.frequency_hz());
    assert_eq!(one_second, 1_000_000_000);
}

#[test]
fn test_calibrated_mode_from_config_file() {
    let file = config_file(
        r#"
        [cycles]
        conversion = "calibrated"
        calibration_window = "5ms"
        "#,
    );
    let config = PlatformConfig::resolve(Some(file.path())).unwrap();
    assert_eq!(config.cycles.conversion, CycleConversion::Calibrated);

    let platform = LinuxPlatform::new(config);
    let hz = platform.cycle_clock().unwrap().frequency_hz();
    let ns = platform.cycles_to_ns(hz).unwrap();
    assert_eq!(ns, 1_000_000_000);
}
