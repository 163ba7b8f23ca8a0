mod error;
mod report;
mod suite;
mod tester;
#[cfg(test)]
mod testing;

pub use error::RepetitionTestError;
pub use report::{ format_time, seconds_from_cpu_time, write_results, CpuTime, RepetitionTestResults };
pub use suite::{ RepetitionSuite, RepetitionTest, WaveSummary };
pub use tester::{ RepetitionTester, TestMode, DEFAULT_SECONDS_TO_TRY };

pub use performance_metrics::{ CpuTimer, CycleCounter };
