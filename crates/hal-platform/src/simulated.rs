//! Simulated platform for testing HAL code without real time passing.
//!
//! Time is virtual: sleeps return immediately after advancing the clock,
//! and the cycle counter is derived from the virtual clock.

use crate::platform::Platform;
use hal_common::config::CycleConversion;
use hal_common::error::{HalError, HalResult};
use hal_common::time::CycleCount;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Deterministic in-memory platform.
#[derive(Debug)]
pub struct SimulatedPlatform {
    state: Mutex<SimState>,
    frequency_hz: u64,
    clock_ticks: u64,
    conversion: CycleConversion,
}

#[derive(Debug)]
struct SimState {
    /// Virtual time since boot.
    now: Duration,
    /// xorshift64* state, never zero.
    rng: u64,
    /// Errno returned by the next uptime queries, if set.
    uptime_error: Option<i32>,
}

impl SimulatedPlatform {
    /// Default counter frequency (1 GHz, one cycle per nanosecond).
    pub const DEFAULT_FREQUENCY_HZ: u64 = 1_000_000_000;

    /// Clock tick rate reported by the clock-ticks conversion.
    pub const DEFAULT_CLOCK_TICKS: u64 = 100;

    /// xorshift has a fixed point at zero; a zero seed is replaced by this.
    const ZERO_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

    /// Create a simulated platform with a random stream seeded from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            state: Mutex::new(SimState {
                now: Duration::ZERO,
                rng: if seed == 0 { Self::ZERO_SEED } else { seed },
                uptime_error: None,
            }),
            frequency_hz: Self::DEFAULT_FREQUENCY_HZ,
            clock_ticks: Self::DEFAULT_CLOCK_TICKS,
            conversion: CycleConversion::ClockTicks,
        }
    }

    /// Set the simulated counter frequency. Zero is treated as 1 Hz.
    #[must_use]
    pub fn with_frequency(mut self, frequency_hz: u64) -> Self {
        self.frequency_hz = frequency_hz.max(1);
        self
    }

    /// Select the cycle conversion strategy.
    #[must_use]
    pub fn with_conversion(mut self, conversion: CycleConversion) -> Self {
        self.conversion = conversion;
        self
    }

    /// Start the virtual clock at `uptime` instead of zero.
    #[must_use]
    pub fn with_uptime(self, uptime: Duration) -> Self {
        self.lock().now = uptime;
        self
    }

    /// Move virtual time forward.
    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.now = state.now.saturating_add(by);
    }

    /// Current virtual time since boot.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.lock().now
    }

    /// Make subsequent uptime queries fail with `errno`, or succeed again with `None`.
    pub fn set_uptime_error(&self, errno: Option<i32>) {
        self.lock().uptime_error = errno;
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new(Self::ZERO_SEED)
    }
}

impl SimState {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.rng;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

impl Platform for SimulatedPlatform {
    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }

    fn uptime_ms(&self) -> HalResult<u64> {
        let state = self.lock();
        if let Some(code) = state.uptime_error {
            return Err(HalError::Os {
                op: "sysinfo",
                code,
            });
        }
        // Whole seconds, like sysinfo.
        Ok(state.now.as_secs().saturating_mul(1000))
    }

    fn cycle_count(&self) -> CycleCount {
        let ns = self.lock().now.as_nanos();
        #[allow(clippy::cast_possible_truncation)]
        let cycles = (ns * u128::from(self.frequency_hz) / 1_000_000_000) as u64;
        CycleCount(cycles)
    }

    fn cycles_to_ns(&self, cycles: u64) -> HalResult<u64> {
        match self.conversion {
            CycleConversion::ClockTicks => Ok(self.clock_ticks),
            CycleConversion::Calibrated => {
                let ns = u128::from(cycles) * 1_000_000_000 / u128::from(self.frequency_hz);
                Ok(u64::try_from(ns).unwrap_or(u64::MAX))
            }
        }
    }

    fn fill_random(&self, buf: &mut [u8]) -> HalResult<usize> {
        let mut state = self.lock();
        for chunk in buf.chunks_mut(8) {
            let bytes = state.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
        Ok(buf.len())
    }
}
