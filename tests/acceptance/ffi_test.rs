//! The exported C interface, called as a C HAL would.

use hal_ffi::{
    swiftHal_randomGet, swifthal_hwcycle_get, swifthal_hwcycle_to_ns, swifthal_ms_sleep,
    swifthal_random_fill, swifthal_uptime_get, swifthal_us_wait,
};
use hal_platform::clock_ticks_per_second;
use std::time::{Duration, Instant};

#[test]
fn test_c_sleep_and_wait() {
    let start = Instant::now();
    swifthal_ms_sleep(3);
    swifthal_us_wait(2_000);
    assert!(start.elapsed() >= Duration::from_millis(5));
}

#[cfg(target_os = "linux")]
#[test]
fn test_c_uptime_convention() {
    let ms = swifthal_uptime_get();
    assert!(ms >= 0, "uptime returned error {ms}");
    assert_eq!(ms % 1000, 0);
}

#[test]
fn test_c_hwcycle_wraps_mod_32_bits() {
    let first = swifthal_hwcycle_get();
    swifthal_us_wait(50);
    let second = swifthal_hwcycle_get();
    let delta = second.wrapping_sub(first);
    assert!(delta > 0 && delta < u32::MAX / 2);
}

#[test]
fn test_c_hwcycle_to_ns_returns_clock_ticks() {
    // Holds unless a deployment config under HAL_CONFIG_PATH or /etc/hal
    // selects calibrated conversion.
    if std::env::var_os("HAL_CONFIG_PATH").is_some()
        || std::path::Path::new("/etc/hal/platform.toml").exists()
    {
        return;
    }
    let ticks = u32::try_from(clock_ticks_per_second()).unwrap();
    for cycles in [0, 1, 1_000_000, u32::MAX] {
        assert_eq!(swifthal_hwcycle_to_ns(cycles), ticks);
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_c_random() {
    let mut a = [0u8; 16];
    let mut b = [0u8; 16];
    unsafe {
        swiftHal_randomGet(a.as_mut_ptr(), 16);
        assert_eq!(swifthal_random_fill(b.as_mut_ptr(), 16), 0);
    }
    assert_ne!(a, b);
}

#[test]
fn test_c_random_null_buffer() {
    let rc = unsafe { swifthal_random_fill(std::ptr::null_mut(), 8) };
    assert_eq!(rc, -libc::EINVAL);
}
