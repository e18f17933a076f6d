//! Probe results, rendered as text or JSON.

use hal_common::metrics::LatencySnapshot;
use hal_platform::PlatformCapabilities;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Format a nanosecond count for humans.
fn ns(value: u64) -> humantime::FormattedDuration {
    humantime::format_duration(Duration::from_nanos(value))
}

/// Uptime query result.
#[derive(Debug, Serialize)]
pub struct UptimeReport {
    /// Milliseconds since boot.
    pub uptime_ms: u64,
}

impl fmt::Display for UptimeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "uptime: {} ms ({})",
            self.uptime_ms,
            humantime::format_duration(Duration::from_millis(self.uptime_ms))
        )
    }
}

/// Cycle counter samples.
#[derive(Debug, Serialize)]
pub struct CyclesReport {
    /// Counter register name.
    pub source: &'static str,
    /// Raw samples in read order.
    pub samples: Vec<u64>,
    /// Wrapping deltas between consecutive samples.
    pub deltas: Vec<u64>,
    /// Measured counter frequency, if calibration succeeded.
    pub frequency_hz: Option<u64>,
    /// Result of the configured conversion applied to the first delta.
    pub converted: Option<u64>,
}

impl fmt::Display for CyclesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "counter source: {}", self.source)?;
        for (i, sample) in self.samples.iter().enumerate() {
            writeln!(f, "  sample {i}: {sample}")?;
        }
        for (i, delta) in self.deltas.iter().enumerate() {
            writeln!(f, "  delta {i}: {delta} cycles")?;
        }
        match self.frequency_hz {
            Some(hz) => writeln!(f, "frequency: {hz} Hz")?,
            None => writeln!(f, "frequency: unknown")?,
        }
        if let Some(converted) = self.converted {
            writeln!(f, "configured conversion of first delta: {converted}")?;
        }
        Ok(())
    }
}

/// One sleep measurement.
#[derive(Debug, Serialize)]
pub struct SleepReport {
    /// Requested duration in nanoseconds.
    pub requested_ns: u64,
    /// Measured duration in nanoseconds.
    pub actual_ns: u64,
}

impl SleepReport {
    /// Time slept beyond the request.
    #[must_use]
    pub fn overshoot_ns(&self) -> u64 {
        self.actual_ns.saturating_sub(self.requested_ns)
    }
}

impl fmt::Display for SleepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "requested: {}", ns(self.requested_ns))?;
        writeln!(f, "actual:    {}", ns(self.actual_ns))?;
        writeln!(f, "overshoot: {}", ns(self.overshoot_ns()))
    }
}

/// Random fill output.
#[derive(Debug, Serialize)]
pub struct RandomReport {
    /// Hex-encoded bytes.
    pub hex: String,
    /// Number of bytes produced.
    pub len: usize,
}

impl RandomReport {
    /// Encode `bytes` as lowercase hex.
    #[must_use]
    pub fn new(bytes: &[u8]) -> Self {
        use fmt::Write;
        let mut hex = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            let _ = write!(hex, "{b:02x}");
        }
        Self {
            hex,
            len: bytes.len(),
        }
    }
}

impl fmt::Display for RandomReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.hex)
    }
}

/// Sleep overshoot distribution.
#[derive(Debug, Serialize)]
pub struct JitterReport {
    /// Requested interval in microseconds.
    pub interval_us: u32,
    /// Overshoot statistics.
    pub overshoot: LatencySnapshot,
    /// (percentile, nanoseconds) pairs.
    pub percentiles: Vec<(f64, u64)>,
}

impl fmt::Display for JitterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "interval: {} us", self.interval_us)?;
        writeln!(f, "samples:  {}", self.overshoot.total)?;
        if let (Some(min), Some(max), Some(mean)) = (
            self.overshoot.min_ns,
            self.overshoot.max_ns,
            self.overshoot.mean_ns,
        ) {
            writeln!(f, "overshoot min:  {}", ns(min))?;
            writeln!(f, "overshoot mean: {}", ns(mean))?;
            writeln!(f, "overshoot max:  {}", ns(max))?;
        }
        for (p, value) in &self.percentiles {
            writeln!(f, "  p{p}: {}", ns(*value))?;
        }
        writeln!(f, "above threshold: {}", self.overshoot.exceeded)
    }
}

/// Capability report wrapper.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CapsReport(pub PlatformCapabilities);

impl fmt::Display for CapsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let caps = &self.0;
        writeln!(f, "arch:              {}", caps.arch)?;
        writeln!(f, "counter source:    {}", caps.counter_source)?;
        writeln!(f, "clock ticks/sec:   {}", caps.clock_ticks_per_second)?;
        writeln!(f, "page size:         {}", caps.page_size)?;
        writeln!(f, "getrandom:         {}", caps.getrandom)?;
        writeln!(f, "sysinfo uptime:    {}", caps.uptime)
    }
}
