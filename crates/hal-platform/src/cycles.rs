//! Hardware cycle counter.
//!
//! The counter register is chosen at build time:
//! - x86_64: time-stamp counter (`rdtsc`)
//! - aarch64: virtual counter (`cntvct_el0`)
//!
//! Raw reads are not normalized. Use [`CycleClock`] to turn deltas into time.

use hal_common::error::{HalError, HalResult};
use hal_common::time::CycleCount;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("read_cycle_counter() has no counter register for this target architecture");

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Name of the counter register read by [`read_cycle_counter`].
#[cfg(target_arch = "x86_64")]
pub const COUNTER_SOURCE: &str = "rdtsc";

/// Name of the counter register read by [`read_cycle_counter`].
#[cfg(target_arch = "aarch64")]
pub const COUNTER_SOURCE: &str = "cntvct_el0";

/// Read the free-running hardware counter.
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn read_cycle_counter() -> u64 {
    let lo: u32;
    let hi: u32;
    // SAFETY: rdtsc only reads the time-stamp counter into eax:edx.
    unsafe {
        core::arch::asm!(
            "rdtsc",
            out("eax") lo,
            out("edx") hi,
            options(nomem, nostack, preserves_flags)
        );
    }
    (u64::from(hi) << 32) | u64::from(lo)
}

/// Read the free-running hardware counter.
#[cfg(target_arch = "aarch64")]
#[inline]
pub fn read_cycle_counter() -> u64 {
    let val: u64;
    // SAFETY: cntvct_el0 is readable from EL0 on Linux.
    unsafe {
        core::arch::asm!(
            "mrs {}, cntvct_el0",
            out(reg) val,
            options(nomem, nostack, preserves_flags)
        );
    }
    val
}

/// Counter frequency as programmed by firmware.
#[cfg(target_arch = "aarch64")]
fn counter_frequency_register() -> u64 {
    let val: u64;
    // SAFETY: cntfrq_el0 is readable from EL0 on Linux.
    unsafe {
        core::arch::asm!(
            "mrs {}, cntfrq_el0",
            out(reg) val,
            options(nomem, nostack, preserves_flags)
        );
    }
    val
}

/// Current counter value as a [`CycleCount`].
#[inline]
pub fn now() -> CycleCount {
    CycleCount(read_cycle_counter())
}

/// OS scheduler clock ticks per second (`sysconf(_SC_CLK_TCK)`).
///
/// Returns 0 if the OS does not report a value.
pub fn clock_ticks_per_second() -> u64 {
    // SAFETY: sysconf has no preconditions.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    u64::try_from(ticks).unwrap_or_else(|_| {
        warn!(ticks, "sysconf(_SC_CLK_TCK) failed");
        0
    })
}

/// Cycle conversion as observed by existing C callers.
///
/// The input is ignored and the OS clock tick rate is returned unchanged.
/// [`CycleClock::cycles_to_ns`] performs the real conversion.
pub fn cycles_to_ns_clock_ticks(_cycles: u64) -> u64 {
    clock_ticks_per_second()
}

/// Converts counter deltas to wall time using a known counter frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CycleClock {
    frequency_hz: u64,
}

impl CycleClock {
    /// Build from a known counter frequency.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::Calibration`] if `frequency_hz` is zero.
    pub fn from_frequency(frequency_hz: u64) -> HalResult<Self> {
        if frequency_hz == 0 {
            return Err(HalError::Calibration(
                "counter frequency must be non-zero".into(),
            ));
        }
        Ok(Self { frequency_hz })
    }

    /// Determine the counter frequency.
    ///
    /// On aarch64 the architectural frequency register is used when it is
    /// programmed; otherwise the counter is sampled against the monotonic
    /// clock for `window`.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::Calibration`] if the counter does not advance.
    pub fn calibrate(window: Duration) -> HalResult<Self> {
        #[cfg(target_arch = "aarch64")]
        {
            let hz = counter_frequency_register();
            if hz != 0 {
                info!(frequency_hz = hz, "counter frequency from cntfrq_el0");
                return Self::from_frequency(hz);
            }
            warn!("cntfrq_el0 reads zero, measuring counter frequency");
        }

        Self::measure(window)
    }

    /// Measure the counter frequency against the monotonic clock.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::Calibration`] if the counter or the clock does not advance.
    pub fn measure(window: Duration) -> HalResult<Self> {
        debug!(?window, source = COUNTER_SOURCE, "measuring counter frequency");

        let start_time = Instant::now();
        let start = now();
        while start_time.elapsed() < window {
            std::hint::spin_loop();
        }
        let end = now();
        let elapsed = start_time.elapsed();

        let cycles = start.wrapping_delta(end);
        let elapsed_ns = elapsed.as_nanos();
        if cycles == 0 || elapsed_ns == 0 {
            return Err(HalError::Calibration(format!(
                "counter advanced {cycles} cycles in {elapsed:?}"
            )));
        }

        let hz = u64::try_from(u128::from(cycles) * NANOS_PER_SEC / elapsed_ns)
            .map_err(|_| HalError::Calibration("counter frequency overflows u64".into()))?;
        info!(frequency_hz = hz, ?elapsed, "counter frequency measured");
        Self::from_frequency(hz)
    }

    /// Counter frequency in Hz.
    #[must_use]
    pub fn frequency_hz(&self) -> u64 {
        self.frequency_hz
    }

    /// Convert a cycle count to nanoseconds, saturating at `u64::MAX`.
    #[must_use]
    pub fn cycles_to_ns(&self, cycles: u64) -> u64 {
        let ns = u128::from(cycles) * NANOS_PER_SEC / u128::from(self.frequency_hz);
        u64::try_from(ns).unwrap_or(u64::MAX)
    }

    /// Convert nanoseconds to a cycle count, saturating at `u64::MAX`.
    #[must_use]
    pub fn ns_to_cycles(&self, ns: u64) -> u64 {
        let cycles = u128::from(ns) * u128::from(self.frequency_hz) / NANOS_PER_SEC;
        u64::try_from(cycles).unwrap_or(u64::MAX)
    }

    /// Wall time between two samples taken on the same core.
    #[must_use]
    pub fn elapsed(&self, start: CycleCount, end: CycleCount) -> Duration {
        Duration::from_nanos(self.cycles_to_ns(start.wrapping_delta(end)))
    }
}
