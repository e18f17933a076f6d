//! C ABI for the platform primitives.
//!
//! Symbol names and signatures match `include/hal_platform.h`. Errors cross
//! the boundary as negated `errno` values; entry points returning `void`
//! can only log their failures.
//!
//! Configuration is resolved once, on first use, through
//! [`PlatformConfig::resolve`]. An unreadable config file falls back to the
//! built-in defaults.

use hal_common::config::PlatformConfig;
use hal_platform::cycles;
use hal_platform::{LinuxPlatform, Platform};
use std::ffi::{c_int, c_longlong, c_uchar, c_uint};
use std::sync::OnceLock;
use tracing::{error, warn};

static_assertions::assert_eq_size!(c_uint, u32);
static_assertions::assert_eq_size!(c_longlong, i64);

static PLATFORM: OnceLock<LinuxPlatform> = OnceLock::new();

fn platform() -> &'static LinuxPlatform {
    PLATFORM.get_or_init(|| {
        let config = PlatformConfig::resolve(None).unwrap_or_else(|e| {
            warn!(error = %e, "failed to load platform config, using defaults");
            PlatformConfig::default()
        });
        LinuxPlatform::new(config)
    })
}

/// Suspend the calling thread for at least `ms` milliseconds.
#[no_mangle]
pub extern "C" fn swifthal_ms_sleep(ms: c_int) {
    platform().ms_sleep(u32::try_from(ms).unwrap_or(0));
}

/// Suspend the calling thread for at least `us` microseconds.
#[no_mangle]
pub extern "C" fn swifthal_us_wait(us: c_uint) {
    platform().us_wait(us);
}

/// Milliseconds since boot, or `-errno` on failure.
#[no_mangle]
pub extern "C" fn swifthal_uptime_get() -> c_longlong {
    match platform().uptime_ms() {
        Ok(ms) => c_longlong::try_from(ms).unwrap_or(c_longlong::MAX),
        Err(e) => c_longlong::from(e.to_negated_code()),
    }
}

/// Low 32 bits of the hardware cycle counter.
#[no_mangle]
pub extern "C" fn swifthal_hwcycle_get() -> c_uint {
    cycles::now().low_u32()
}

/// Cycle conversion per the configured strategy, saturating at `UINT_MAX`.
///
/// Returns 0 if calibration fails.
#[no_mangle]
pub extern "C" fn swifthal_hwcycle_to_ns(cycles: c_uint) -> c_uint {
    match platform().cycles_to_ns(u64::from(cycles)) {
        Ok(ns) => c_uint::try_from(ns).unwrap_or(c_uint::MAX),
        Err(e) => {
            error!(error = %e, "cycle conversion failed");
            0
        }
    }
}

/// Fill `length` bytes of `buf` with random bytes. Failures are logged.
///
/// # Safety
///
/// `buf` must be valid for writes of `length` bytes, or `length` must be `<= 0`.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn swiftHal_randomGet(buf: *mut c_uchar, length: c_int) {
    // SAFETY: forwarded caller contract.
    let rc = unsafe { swifthal_random_fill(buf, length) };
    if rc < 0 {
        error!(errno = -rc, length, "random fill failed");
    }
}

/// Fill `length` bytes of `buf` with random bytes.
///
/// Returns 0 on success or `-errno` on failure; `-EINVAL` for a null
/// buffer with a positive length.
///
/// # Safety
///
/// `buf` must be valid for writes of `length` bytes, or `length` must be `<= 0`.
#[no_mangle]
pub unsafe extern "C" fn swifthal_random_fill(buf: *mut c_uchar, length: c_int) -> c_int {
    let len = match usize::try_from(length) {
        Ok(0) | Err(_) => return 0,
        Ok(len) => len,
    };
    if buf.is_null() {
        return -libc::EINVAL;
    }

    // SAFETY: non-null and valid for `len` bytes per the caller contract.
    let slice = unsafe { std::slice::from_raw_parts_mut(buf, len) };
    match platform().fill_random(slice) {
        Ok(_) => 0,
        Err(e) => e.to_negated_code(),
    }
}
