//! Host capability report.

use crate::cycles::{clock_ticks_per_second, COUNTER_SOURCE};
use serde::Serialize;
use tracing::debug;

/// What the running host offers to the platform layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformCapabilities {
    /// Target architecture the crate was built for.
    pub arch: &'static str,
    /// Counter register backing the cycle counter.
    pub counter_source: &'static str,
    /// `sysconf(_SC_CLK_TCK)`.
    pub clock_ticks_per_second: u64,
    /// System page size in bytes.
    pub page_size: usize,
    /// Whether the `getrandom` syscall is implemented by the kernel.
    pub getrandom: bool,
    /// Whether `sysinfo` reports uptime.
    pub uptime: bool,
}

/// Probe the current host.
pub fn probe() -> PlatformCapabilities {
    let caps = PlatformCapabilities {
        arch: std::env::consts::ARCH,
        counter_source: COUNTER_SOURCE,
        clock_ticks_per_second: clock_ticks_per_second(),
        page_size: page_size(),
        getrandom: has_getrandom(),
        uptime: crate::uptime::uptime().is_ok(),
    };
    debug!(?caps, "platform capabilities probed");
    caps
}

/// Get system page size.
fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(size).unwrap_or(4096)
}

/// Zero-length probe: `ENOSYS` means the kernel predates the syscall,
/// `EAGAIN` only means the pool is still initializing.
#[cfg(target_os = "linux")]
fn has_getrandom() -> bool {
    // SAFETY: a zero-length request never dereferences the buffer pointer.
    let ret = unsafe { libc::getrandom(std::ptr::null_mut(), 0, libc::GRND_NONBLOCK) };
    ret >= 0 || std::io::Error::last_os_error().raw_os_error() != Some(libc::ENOSYS)
}

#[cfg(not(target_os = "linux"))]
fn has_getrandom() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size() {
        let ps = page_size();
        assert!(ps > 0);
        assert!(ps.is_power_of_two());
    }

    #[test]
    fn test_probe() {
        let caps = probe();
        assert_eq!(caps.arch, std::env::consts::ARCH);
        assert_eq!(caps.counter_source, COUNTER_SOURCE);
        assert!(caps.clock_ticks_per_second > 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_probe_linux() {
        let caps = probe();
        assert!(caps.getrandom);
        assert!(caps.uptime);
    }
}
