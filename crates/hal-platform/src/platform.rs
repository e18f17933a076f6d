//! The platform seam a HAL programs against.

use crate::cycles::{self, CycleClock};
use crate::{random, sleep, uptime};
use hal_common::config::{CycleConversion, PlatformConfig};
use hal_common::error::HalResult;
use hal_common::time::CycleCount;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// Platform primitives abstraction.
///
/// Every method is synchronous and runs on the calling thread. Implementations
/// hold no state between calls beyond what they need to answer them
/// (e.g. a calibrated counter frequency).
pub trait Platform: Send + Sync {
    /// Suspend the calling thread for at least `duration`.
    fn sleep(&self, duration: Duration);

    /// Suspend for at least `ms` milliseconds.
    ///
    /// Converted to microseconds and handed to [`Platform::sleep`].
    fn ms_sleep(&self, ms: u32) {
        self.sleep(Duration::from_micros(u64::from(ms) * 1000));
    }

    /// Suspend for at least `us` microseconds.
    fn us_wait(&self, us: u32) {
        self.sleep(Duration::from_micros(u64::from(us)));
    }

    /// Milliseconds since boot.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the uptime cannot be read.
    fn uptime_ms(&self) -> HalResult<u64>;

    /// Sample the free-running cycle counter.
    fn cycle_count(&self) -> CycleCount;

    /// Convert a cycle count to nanoseconds according to the configured
    /// [`CycleConversion`].
    ///
    /// # Errors
    ///
    /// Returns an error if calibration is required and fails.
    fn cycles_to_ns(&self, cycles: u64) -> HalResult<u64>;

    /// Fill `buf` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the entropy source fails or under-delivers.
    fn fill_random(&self, buf: &mut [u8]) -> HalResult<usize>;
}

/// The host OS platform.
#[derive(Debug, Default)]
pub struct LinuxPlatform {
    config: PlatformConfig,
    clock: OnceLock<CycleClock>,
}

impl LinuxPlatform {
    /// Create a platform using the given configuration.
    #[must_use]
    pub fn new(config: PlatformConfig) -> Self {
        Self {
            config,
            clock: OnceLock::new(),
        }
    }

    /// Create a platform with a known counter frequency, skipping calibration.
    #[must_use]
    pub fn with_cycle_clock(config: PlatformConfig, clock: CycleClock) -> Self {
        let platform = Self::new(config);
        let _ = platform.clock.set(clock);
        platform
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Counter clock, calibrated on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if calibration fails.
    pub fn cycle_clock(&self) -> HalResult<CycleClock> {
        if let Some(clock) = self.clock.get() {
            return Ok(*clock);
        }
        let clock = CycleClock::calibrate(self.config.cycles.calibration_window)?;
        // A concurrent caller may have won the race; either result is valid.
        let _ = self.clock.set(clock);
        Ok(self.clock.get().copied().unwrap_or(clock))
    }
}

impl Platform for LinuxPlatform {
    fn sleep(&self, duration: Duration) {
        sleep::sleep_for(duration, &self.config.sleep);
    }

    fn uptime_ms(&self) -> HalResult<u64> {
        uptime::uptime_ms()
    }

    fn cycle_count(&self) -> CycleCount {
        cycles::now()
    }

    fn cycles_to_ns(&self, cycles: u64) -> HalResult<u64> {
        match self.config.cycles.conversion {
            CycleConversion::ClockTicks => Ok(cycles::cycles_to_ns_clock_ticks(cycles)),
            CycleConversion::Calibrated => {
                let ns = self.cycle_clock()?.cycles_to_ns(cycles);
                debug!(cycles, ns, "converted cycles");
                Ok(ns)
            }
        }
    }

    fn fill_random(&self, buf: &mut [u8]) -> HalResult<usize> {
        random::fill_random(buf, &self.config.random)
    }
}
