use std::{ fmt::Write as _, io::{ self, Write } };

const MEGABYTES: f64 = 1024.0 * 1024.0;
const GIGABYTES: f64 = MEGABYTES * 1024.0;

/// Anything that can be printed as a cpu time. Averages come out fractional, everything else is a
/// whole number of cycles.
pub trait CpuTime: Copy {
    fn as_cpu_time(self) -> f64;
}

impl CpuTime for u64 {
    fn as_cpu_time(self) -> f64 { self as f64 }
}

impl CpuTime for f64 {
    fn as_cpu_time(self) -> f64 { self }
}

/// Cumulative statistics for every repetition closed in a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepetitionTestResults {
    pub test_count: u64,
    pub total_time: u64,
    pub max_time: u64,
    /// u64::MAX until the first repetition closes.
    pub min_time: u64,
}

impl RepetitionTestResults {
    pub const fn new() -> Self {
        Self { test_count: 0, total_time: 0, max_time: 0, min_time: u64::MAX }
    }

    pub fn average(&self) -> Option<f64> {
        if self.test_count == 0 { return None; }
        Some(self.total_time as f64 / self.test_count as f64)
    }
}

impl Default for RepetitionTestResults {
    fn default() -> Self { Self::new() }
}

/// Zero when the frequency is unknown.
pub fn seconds_from_cpu_time(cpu_time: f64, cpu_timer_freq: u64) -> f64 {
    if cpu_timer_freq == 0 { return 0.0; }
    cpu_time / cpu_timer_freq as f64
}

/// Format a labelled cycle count. Milliseconds are only included when the frequency is known, and
/// throughput only when there is also a byte count and a non-zero duration.
pub fn format_time(label: &str, cpu_time: impl CpuTime, cpu_timer_freq: u64, byte_count: u64) -> String {
    let cpu_time = cpu_time.as_cpu_time();
    let mut line = format!("{label}: {cpu_time:.0}");
    if cpu_timer_freq != 0 {
        let seconds = seconds_from_cpu_time(cpu_time, cpu_timer_freq);
        _ = write!(line, " ({:.4}ms)", seconds * 1000.0);

        if byte_count != 0 && seconds > 0.0 {
            let gb_per_second = byte_count as f64 / (GIGABYTES * seconds);
            _ = write!(line, " {gb_per_second:.4}gb/s");
        }
    }

    line
}

/// Writes the Min/Max/Avg summary. Avg is skipped when nothing was recorded.
pub fn write_results<W: Write>(
    out: &mut W,
    results: &RepetitionTestResults,
    cpu_timer_freq: u64,
    byte_count: u64,
) -> io::Result<()> {
    writeln!(out, "{}", format_time("Min", results.min_time, cpu_timer_freq, byte_count))?;
    writeln!(out, "{}", format_time("Max", results.max_time, cpu_timer_freq, byte_count))?;
    if let Some(average) = results.average() {
        writeln!(out, "{}", format_time("Avg", average, cpu_timer_freq, byte_count))?;
    }

    Ok(())
}
