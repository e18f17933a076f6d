//! Time since boot.

use hal_common::error::{HalError, HalResult};
use std::time::Duration;
use tracing::warn;

/// Read system uptime from `sysinfo(2)`.
///
/// The kernel reports whole seconds.
///
/// # Errors
///
/// Returns [`HalError::Os`] carrying the `errno` if `sysinfo` fails.
#[cfg(target_os = "linux")]
pub fn uptime() -> HalResult<Duration> {
    let mut info = std::mem::MaybeUninit::<libc::sysinfo>::zeroed();

    // SAFETY: `info` points to writable storage sized for `struct sysinfo`.
    if unsafe { libc::sysinfo(info.as_mut_ptr()) } < 0 {
        let err = HalError::last_os_error("sysinfo");
        warn!(error = %err, "uptime query failed");
        return Err(err);
    }

    // SAFETY: sysinfo returned success, so the struct is initialized.
    let info = unsafe { info.assume_init() };
    let secs = u64::try_from(info.uptime).map_err(|_| HalError::Os {
        op: "sysinfo",
        code: libc::EOVERFLOW,
    })?;
    Ok(Duration::from_secs(secs))
}

#[cfg(not(target_os = "linux"))]
pub fn uptime() -> HalResult<Duration> {
    Err(HalError::Unsupported("sysinfo"))
}

/// Milliseconds since boot.
///
/// # Errors
///
/// Propagates the failure from [`uptime`].
pub fn uptime_ms() -> HalResult<u64> {
    uptime().map(|d| d.as_secs().saturating_mul(1000))
}
