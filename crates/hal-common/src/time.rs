//! Counter value types.

use serde::Serialize;

/// A raw hardware cycle counter sample.
///
/// Only meaningful as a delta against another sample taken on the same core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CycleCount(pub u64);

impl CycleCount {
    /// Cycles elapsed from `self` to `later`, accounting for wraparound.
    #[must_use]
    pub fn wrapping_delta(self, later: CycleCount) -> u64 {
        later.0.wrapping_sub(self.0)
    }

    /// Low 32 bits, as exposed through the C interface.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn low_u32(self) -> u32 {
        self.0 as u32
    }
}

impl From<u64> for CycleCount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
