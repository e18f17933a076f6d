//! OS entropy.
//!
//! Bytes come from `getrandom(2)`, which draws from the same pool as
//! `/dev/urandom` but blocks until the pool has been initialized.

use hal_common::config::{RandomConfig, RandomMode};
use hal_common::error::{HalError, HalResult};
#[cfg(target_os = "linux")]
use tracing::trace;
use tracing::warn;

/// Fill `buf` with cryptographically secure random bytes.
///
/// In [`RandomMode::Fill`] the call is repeated across short reads and
/// `EINTR` until every byte is written. In [`RandomMode::Single`] a single
/// call is made and a short read is an error.
///
/// Returns the number of bytes written, which on success is `buf.len()`.
///
/// # Errors
///
/// - [`HalError::Os`] if `getrandom` fails (e.g. `EAGAIN` in non-blocking mode)
/// - [`HalError::ShortRead`] if fewer bytes than requested were produced
#[cfg(target_os = "linux")]
pub fn fill_random(buf: &mut [u8], config: &RandomConfig) -> HalResult<usize> {
    if buf.is_empty() {
        return Ok(0);
    }

    let flags = if config.nonblocking {
        libc::GRND_NONBLOCK
    } else {
        0
    };

    let mut filled = 0;
    while filled < buf.len() {
        let rest = &mut buf[filled..];

        // SAFETY: pointer and length describe the unfilled tail of `buf`.
        let ret = unsafe { libc::getrandom(rest.as_mut_ptr().cast(), rest.len(), flags) };

        if ret < 0 {
            let err = HalError::last_os_error("getrandom");
            if err.errno() == Some(libc::EINTR) && config.mode == RandomMode::Fill {
                trace!(filled, "getrandom interrupted, retrying");
                continue;
            }
            warn!(error = %err, filled, requested = buf.len(), "entropy fill failed");
            return Err(err);
        }

        let got = usize::try_from(ret).unwrap_or(0);
        if got == 0 {
            break;
        }
        filled += got;

        if config.mode == RandomMode::Single {
            break;
        }
    }

    if filled < buf.len() {
        return Err(HalError::ShortRead {
            requested: buf.len(),
            filled,
        });
    }
    Ok(filled)
}

#[cfg(not(target_os = "linux"))]
pub fn fill_random(buf: &mut [u8], _config: &RandomConfig) -> HalResult<usize> {
    if buf.is_empty() {
        return Ok(0);
    }
    warn!("getrandom not available on this platform");
    Err(HalError::Unsupported("getrandom"))
}

/// Generate `N` random bytes with the default configuration.
///
/// # Errors
///
/// See [`fill_random`].
pub fn random_bytes<const N: usize>() -> HalResult<[u8; N]> {
    let mut buf = [0u8; N];
    fill_random(&mut buf, &RandomConfig::default())?;
    Ok(buf)
}
