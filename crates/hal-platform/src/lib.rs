//! Platform primitives for the hardware abstraction layer.
//!
//! This crate provides:
//! - [`sleep`]: millisecond sleep and microsecond wait
//! - [`uptime`]: milliseconds since boot
//! - [`cycles`]: hardware cycle counter and cycle-to-nanosecond conversion
//! - [`random`]: OS entropy fill
//! - [`capabilities`]: host capability report
//! - [`Platform`] trait with [`LinuxPlatform`] and [`SimulatedPlatform`]

pub mod capabilities;
pub mod cycles;
pub mod platform;
pub mod random;
pub mod simulated;
pub mod sleep;
pub mod uptime;

pub use capabilities::*;
pub use cycles::*;
pub use platform::*;
pub use random::*;
pub use simulated::*;
pub use sleep::*;
pub use uptime::*;

pub use hal_common::{CycleCount, HalError, HalResult, PlatformConfig};
