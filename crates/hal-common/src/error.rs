use thiserror::Error;

/// HAL platform errors covering OS call failures, entropy short reads, and calibration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HalError {
    /// An OS call failed with the given `errno`.
    #[error("{op} failed: os error {code}")]
    Os {
        /// Name of the failing system call.
        op: &'static str,
        /// Raw `errno` value reported by the kernel.
        code: i32,
    },

    /// The entropy source returned fewer bytes than requested.
    #[error("short read from entropy source: requested {requested} bytes, filled {filled}")]
    ShortRead {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes actually written.
        filled: usize,
    },

    /// The primitive is not available on this platform.
    #[error("unsupported on this platform: {0}")]
    Unsupported(&'static str),

    /// Cycle counter calibration failed.
    #[error("calibration error: {0}")]
    Calibration(String),
}

impl HalError {
    /// Build a [`HalError::Os`] from the calling thread's current `errno`.
    #[must_use]
    pub fn last_os_error(op: &'static str) -> Self {
        let code = std::io::Error::last_os_error()
            .raw_os_error()
            .unwrap_or(libc::EIO);
        Self::Os { op, code }
    }

    /// The OS error code carried by this error, if any.
    #[must_use]
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Os { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Collapse into the negative-integer convention used across the C boundary.
    ///
    /// Errors without an OS code map to `-EIO`.
    #[must_use]
    pub fn to_negated_code(&self) -> i32 {
        let code = match self {
            Self::Os { code, .. } => *code,
            Self::Unsupported(_) => libc::ENOSYS,
            Self::ShortRead { .. } | Self::Calibration(_) => libc::EIO,
        };
        -code.abs()
    }
}

/// Convenience type alias for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
