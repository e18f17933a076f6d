//! Entropy smoke checks.

use super::common::bit_density;
use hal_common::config::{RandomConfig, RandomMode};
use hal_platform::{fill_random, random_bytes, LinuxPlatform, Platform, SimulatedPlatform};

#[cfg(target_os = "linux")]
#[test]
fn test_two_fills_differ() {
    for len in [16usize, 32, 257, 4096] {
        let mut a = vec![0u8; len];
        let mut b = vec![0u8; len];
        fill_random(&mut a, &RandomConfig::default()).unwrap();
        fill_random(&mut b, &RandomConfig::default()).unwrap();
        assert_ne!(a, b, "two {len}-byte fills were identical");
        assert!(a.iter().any(|&x| x != 0));
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_bit_density() {
    let bytes: [u8; 4096] = random_bytes().unwrap();
    let density = bit_density(&bytes);
    assert!((0.45..0.55).contains(&density), "bit density {density}");
}

#[cfg(target_os = "linux")]
#[test]
fn test_nonblocking_fill() {
    let config = RandomConfig {
        mode: RandomMode::Fill,
        nonblocking: true,
    };
    let mut buf = [0u8; 128];
    assert_eq!(fill_random(&mut buf, &config).unwrap(), 128);
}

#[test]
fn test_empty_fill_is_noop() {
    let platform = LinuxPlatform::default();
    assert_eq!(platform.fill_random(&mut []).unwrap(), 0);
}

#[test]
fn test_simulated_stream_is_reproducible() {
    let mut first = [0u8; 64];
    let mut second = [0u8; 64];
    SimulatedPlatform::new(7).fill_random(&mut first).unwrap();
    SimulatedPlatform::new(7).fill_random(&mut second).unwrap();
    assert_eq!(first, second);
    assert!(bit_density(&first) > 0.3);
}
