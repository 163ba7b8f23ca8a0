use std::io::{ stdout, Stdout, Write };
use performance_metrics::{ CpuTimer, CycleCounter };

use crate::{
    error::RepetitionTestError,
    report::{ format_time, write_results, RepetitionTestResults },
};

/// Number of seconds to wait for a new min before ending a wave.
pub const DEFAULT_SECONDS_TO_TRY: u32 = 10;
const LINE_CLEAR: [u8; 64] = [b' '; 64];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TestMode {
    #[default]
    Uninitialized,
    Testing,
    Completed,
    Error,
}

/// Times a workload over and over until it stops getting faster.
///
/// Drive it like so:
///
/// ```ignore
/// tester.start_wave(buffer_size, cpu_freq);
/// while tester.poll() {
///     tester.begin_block();
///     do_work(&mut buffer);
///     tester.end_block();
///     tester.record_bytes(buffer_size);
/// }
/// ```
///
/// A wave ends once `seconds_to_try` pass without a new minimum. The same tester can be taken
/// through any number of waves as long as the byte target and frequency stay the same, and its
/// results keep accumulating across them.
pub struct RepetitionTester<C = CpuTimer, W = Stdout> {
    target_processed_byte_count: u64,
    cpu_timer_freq: u64,
    try_for_time: u64,
    tests_started_at: u64,

    mode: TestMode,
    print_new_minimums: bool,
    open_block_count: u32,
    close_block_count: u32,
    // Goes "negative" between begin_block and end_block, hence the wrapping arithmetic.
    time_accumulated_on_this_test: u64,
    bytes_accumulated_on_this_test: u64,

    results: RepetitionTestResults,
    last_error: Option<RepetitionTestError>,

    timer: C,
    output: W,
}

impl RepetitionTester {
    /// A tester on the hardware cycle counter that reports to stdout.
    pub fn new() -> Self {
        Self::with_timer_and_output(CpuTimer, stdout())
    }
}

impl Default for RepetitionTester {
    fn default() -> Self { Self::new() }
}

impl<C: CycleCounter, W: Write> RepetitionTester<C, W> {
    pub fn with_timer_and_output(timer: C, output: W) -> Self {
        Self {
            target_processed_byte_count: 0,
            cpu_timer_freq: 0,
            try_for_time: 0,
            tests_started_at: 0,
            mode: TestMode::Uninitialized,
            print_new_minimums: true,
            open_block_count: 0,
            close_block_count: 0,
            time_accumulated_on_this_test: 0,
            bytes_accumulated_on_this_test: 0,
            results: RepetitionTestResults::new(),
            last_error: None,
            timer,
            output,
        }
    }

    pub fn mode(&self) -> TestMode { self.mode }
    pub fn results(&self) -> &RepetitionTestResults { &self.results }
    pub fn last_error(&self) -> Option<&RepetitionTestError> { self.last_error.as_ref() }
    pub fn output(&self) -> &W { &self.output }
    pub(crate) fn output_mut(&mut self) -> &mut W { &mut self.output }
    pub fn target_processed_byte_count(&self) -> u64 { self.target_processed_byte_count }
    pub fn cpu_timer_freq(&self) -> u64 { self.cpu_timer_freq }

    pub fn set_print_new_minimums(&mut self, print_new_minimums: bool) {
        self.print_new_minimums = print_new_minimums;
    }

    /// Start a wave with the default ten second budget.
    pub fn start_wave(&mut self, target_processed_byte_count: u64, cpu_timer_freq: u64) {
        self.start_wave_with_timeout(target_processed_byte_count, cpu_timer_freq, DEFAULT_SECONDS_TO_TRY);
    }

    /// Start a new wave. The wave ends once `seconds_to_try` pass without a new minimum.
    ///
    /// Must not be called while a wave is still testing; keep calling [`poll`](Self::poll) until it
    /// returns false first. Doing so anyway only refreshes the time budget.
    pub fn start_wave_with_timeout(
        &mut self,
        target_processed_byte_count: u64,
        cpu_timer_freq: u64,
        seconds_to_try: u32,
    ) {
        match self.mode {
            TestMode::Uninitialized => {
                // Blocks or bytes recorded before the first wave don't belong to any repetition.
                self.reset_repetition();
                self.last_error = None;
                self.mode = TestMode::Testing;
                self.target_processed_byte_count = target_processed_byte_count;
                self.cpu_timer_freq = cpu_timer_freq;
                self.results = RepetitionTestResults::new();
            },
            TestMode::Completed | TestMode::Error => {
                // A failed wave may have left a half-recorded repetition behind.
                self.reset_repetition();
                self.last_error = None;
                self.mode = TestMode::Testing;

                if self.target_processed_byte_count != target_processed_byte_count {
                    self.error(RepetitionTestError::TargetByteCountChanged {
                        previous: self.target_processed_byte_count,
                        requested: target_processed_byte_count,
                    });
                }

                if self.cpu_timer_freq != cpu_timer_freq {
                    self.error(RepetitionTestError::CpuFrequencyChanged {
                        previous: self.cpu_timer_freq,
                        requested: cpu_timer_freq,
                    });
                }
            },
            TestMode::Testing => {},
        }

        self.try_for_time = (seconds_to_try as u64).saturating_mul(cpu_timer_freq);
        self.tests_started_at = self.timer.read_cycles();
    }

    #[inline(always)]
    pub fn begin_block(&mut self) {
        self.open_block_count += 1;
        self.time_accumulated_on_this_test = self.time_accumulated_on_this_test.wrapping_sub(self.timer.read_cycles());
    }

    #[inline(always)]
    pub fn end_block(&mut self) {
        self.close_block_count += 1;
        self.time_accumulated_on_this_test = self.time_accumulated_on_this_test.wrapping_add(self.timer.read_cycles());
    }

    /// Time `work` as one block of the current repetition.
    #[inline(always)]
    pub fn time_block<R>(&mut self, work: impl FnOnce() -> R) -> R {
        self.begin_block();
        let result = work();
        self.end_block();
        result
    }

    pub fn record_bytes(&mut self, byte_count: u64) {
        self.bytes_accumulated_on_this_test = self.bytes_accumulated_on_this_test.wrapping_add(byte_count);
    }

    /// Close the in-flight repetition (if any) and check the time budget. Returns true while the
    /// caller should keep repeating the workload.
    pub fn poll(&mut self) -> bool {
        if self.mode != TestMode::Testing { return false; }

        let current_time = self.timer.read_cycles();

        if self.open_block_count != 0 {
            if self.open_block_count != self.close_block_count {
                self.error(RepetitionTestError::UnbalancedTiming {
                    opened: self.open_block_count,
                    closed: self.close_block_count,
                });
            }

            if self.bytes_accumulated_on_this_test != self.target_processed_byte_count {
                self.error(RepetitionTestError::ByteCountMismatch {
                    expected: self.target_processed_byte_count,
                    actual: self.bytes_accumulated_on_this_test,
                });
            }

            if self.mode == TestMode::Testing {
                self.close_repetition(current_time);
            }
        }

        if self.mode == TestMode::Testing
            && current_time.wrapping_sub(self.tests_started_at) > self.try_for_time
        {
            self.mode = TestMode::Completed;

            _ = self.output.write_all(&LINE_CLEAR);
            _ = self.output.write_all(b"\r");
            _ = write_results(
                &mut self.output,
                &self.results,
                self.cpu_timer_freq,
                self.target_processed_byte_count,
            );
            _ = self.output.flush();
        }

        self.mode == TestMode::Testing
    }

    fn close_repetition(&mut self, current_time: u64) {
        let elapsed_time = self.time_accumulated_on_this_test;
        let results = &mut self.results;
        results.test_count += 1;
        results.total_time = results.total_time.saturating_add(elapsed_time);
        if results.max_time < elapsed_time {
            results.max_time = elapsed_time;
        }

        if results.min_time > elapsed_time {
            results.min_time = elapsed_time;

            // The budget counts from the last improvement, not from the start of the wave.
            self.tests_started_at = current_time;

            if self.print_new_minimums {
                // print! only flushes on newlines, and this line gets overwritten in place.
                let line = format_time(
                    "Min",
                    elapsed_time,
                    self.cpu_timer_freq,
                    self.bytes_accumulated_on_this_test,
                );
                _ = self.output.write_all(line.as_bytes());
                _ = self.output.write_all(b"               \r");
                _ = self.output.flush();
            }
        }

        self.reset_repetition();
    }

    fn reset_repetition(&mut self) {
        self.open_block_count = 0;
        self.close_block_count = 0;
        self.time_accumulated_on_this_test = 0;
        self.bytes_accumulated_on_this_test = 0;
    }

    fn error(&mut self, error: RepetitionTestError) {
        log::error!("{error}");
        self.mode = TestMode::Error;
        self.last_error = Some(error);
    }
}
