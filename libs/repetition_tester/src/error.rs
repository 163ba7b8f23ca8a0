use thiserror::Error;

/// Misuse of a [`RepetitionTester`](crate::RepetitionTester). Any of these ends the current wave.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepetitionTestError {
    #[error("Unbalanced begin_block/end_block ({opened} opened, {closed} closed)")]
    UnbalancedTiming { opened: u32, closed: u32 },
    #[error("Processed byte count mismatch (expected {expected}, got {actual})")]
    ByteCountMismatch { expected: u64, actual: u64 },
    #[error("Target processed byte count changed from {previous} to {requested}")]
    TargetByteCountChanged { previous: u64, requested: u64 },
    #[error("CPU frequency changed from {previous} to {requested}")]
    CpuFrequencyChanged { previous: u64, requested: u64 },
}
