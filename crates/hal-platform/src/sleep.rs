//! Thread suspension.
//!
//! Sleeps are measured against an absolute `CLOCK_MONOTONIC` deadline so
//! that resuming after a signal never shortens or stretches the total.

use hal_common::config::SleepConfig;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Suspend the calling thread for at least `ms` milliseconds.
///
/// Converted to microseconds and handed to the microsecond primitive.
pub fn ms_sleep(ms: u32) {
    sleep_us(u64::from(ms) * 1000, &SleepConfig::default());
}

/// Suspend the calling thread for at least `us` microseconds.
pub fn us_wait(us: u32) {
    sleep_us(u64::from(us), &SleepConfig::default());
}

/// Microsecond sleep with explicit configuration.
pub fn sleep_us(us: u64, config: &SleepConfig) {
    sleep_for(Duration::from_micros(us), config);
}

/// Suspend the calling thread for `duration`.
///
/// OS failures are logged and the call returns; there is nothing useful
/// a caller could do with them.
#[cfg(target_os = "linux")]
pub fn sleep_for(duration: Duration, config: &SleepConfig) {
    use nix::time::{clock_gettime, ClockId};

    if duration.is_zero() {
        return;
    }

    let now = match clock_gettime(ClockId::CLOCK_MONOTONIC) {
        Ok(ts) => Duration::from(ts),
        Err(e) => {
            warn!(error = %e, "clock_gettime failed, falling back to relative sleep");
            std::thread::sleep(duration);
            return;
        }
    };

    let deadline = to_timespec(now.saturating_add(duration));
    trace!(?duration, "sleeping");

    loop {
        // SAFETY: `deadline` is a valid timespec and the remainder pointer may be
        // null for absolute sleeps.
        let rc = unsafe {
            libc::clock_nanosleep(
                libc::CLOCK_MONOTONIC,
                libc::TIMER_ABSTIME,
                &deadline,
                std::ptr::null_mut(),
            )
        };

        match rc {
            0 => return,
            libc::EINTR if config.resume_on_interrupt => {
                trace!("sleep interrupted by signal, resuming");
            }
            libc::EINTR => {
                debug!(?duration, "sleep interrupted by signal, returning early");
                return;
            }
            code => {
                warn!(code, ?duration, "clock_nanosleep failed");
                return;
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn sleep_for(duration: Duration, _config: &SleepConfig) {
    std::thread::sleep(duration);
}

#[cfg(target_os = "linux")]
#[allow(clippy::cast_possible_wrap, clippy::cast_lossless)]
fn to_timespec(d: Duration) -> libc::timespec {
    libc::timespec {
        tv_sec: libc::time_t::try_from(d.as_secs()).unwrap_or(libc::time_t::MAX),
        tv_nsec: d.subsec_nanos() as libc::c_long,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_ms_sleep_blocks_at_least_requested() {
        let start = Instant::now();
        ms_sleep(20);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_us_wait_blocks_at_least_requested() {
        for us in [1, 50, 500, 2_000] {
            let start = Instant::now();
            us_wait(us);
            assert!(
                start.elapsed() >= Duration::from_micros(u64::from(us)),
                "us_wait({us}) returned early"
            );
        }
    }

    #[test]
    fn test_zero_sleep_returns() {
        let start = Instant::now();
        ms_sleep(0);
        us_wait(0);
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[cfg(target_os = "linux")]
    extern "C" fn ignore_signal(_: libc::c_int) {}

    /// Sleep 300 ms on a worker thread and hit it with SIGUSR1 after 50 ms.
    #[cfg(target_os = "linux")]
    fn interrupted_sleep(resume_on_interrupt: bool) -> Duration {
        use std::os::unix::thread::JoinHandleExt;

        // SAFETY: installs a handler that does nothing; sa_flags = 0 so
        // clock_nanosleep is not restarted by the kernel and sees EINTR.
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = ignore_signal as usize;
            action.sa_flags = 0;
            libc::sigemptyset(&mut action.sa_mask);
            assert_eq!(
                libc::sigaction(libc::SIGUSR1, &action, std::ptr::null_mut()),
                0
            );
        }

        let config = SleepConfig {
            resume_on_interrupt,
        };
        let worker = std::thread::spawn(move || {
            let start = Instant::now();
            sleep_for(Duration::from_millis(300), &config);
            start.elapsed()
        });

        std::thread::sleep(Duration::from_millis(50));
        // SAFETY: the worker thread is still joinable, so its pthread_t is valid.
        let rc = unsafe { libc::pthread_kill(worker.as_pthread_t(), libc::SIGUSR1) };
        assert_eq!(rc, 0);

        worker.join().unwrap()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_signal_during_sleep() {
        // Both cases in one test so the handler is installed once.
        let resumed = interrupted_sleep(true);
        assert!(
            resumed >= Duration::from_millis(300),
            "resumed sleep returned after {resumed:?}"
        );

        let early = interrupted_sleep(false);
        assert!(
            early < Duration::from_millis(300),
            "interrupted sleep ran the full {early:?}"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_to_timespec() {
        let ts = to_timespec(Duration::new(3, 250_000_000));
        assert_eq!(ts.tv_sec, 3);
        assert_eq!(ts.tv_nsec, 250_000_000);
    }
}
