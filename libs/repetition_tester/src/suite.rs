use std::io::{ Stdout, Write };
use performance_metrics::{ CpuTimer, CycleCounter };

use crate::{
    report::RepetitionTestResults,
    tester::{ RepetitionTester, TestMode, DEFAULT_SECONDS_TO_TRY },
};

/// One repetition of a workload. Implementors time their own blocks and record their own bytes so
/// that setup work can be kept out of the measurement.
pub trait RepetitionTest<TestParams, C = CpuTimer, W = Stdout>:
    FnMut(&mut RepetitionTester<C, W>, &mut TestParams)
{}
impl<TestParams, C, W, T> RepetitionTest<TestParams, C, W> for T
where
    T: FnMut(&mut RepetitionTester<C, W>, &mut TestParams),
{}

struct RegisteredTest<TestParams, C, W> {
    name: String,
    target_processed_byte_count: u64,
    tester: RepetitionTester<C, W>,
    test: Box<dyn RepetitionTest<TestParams, C, W>>,
}

/// What one wave of one test ended with.
#[derive(Clone, Debug)]
pub struct WaveSummary {
    pub name: String,
    pub mode: TestMode,
    pub results: RepetitionTestResults,
}

/// A set of named tests sharing some parameters (buffers, inputs...). Each test keeps its own
/// tester for the lifetime of the suite, so minimums carry over from wave to wave.
pub struct RepetitionSuite<TestParams, C = CpuTimer, W = Stdout> {
    shared_test_params: TestParams,
    seconds_to_try: u32,
    print_new_minimums: bool,
    tests: Vec<RegisteredTest<TestParams, C, W>>,
}

impl<TestParams> RepetitionSuite<TestParams> {
    pub fn new(shared_test_params: TestParams) -> Self {
        Self::with_shared_test_params(shared_test_params)
    }

    /// Register a test on the hardware cycle counter, reporting to stdout.
    pub fn register_test(
        &mut self,
        test_name: impl Into<String>,
        target_processed_byte_count: u64,
        test: impl RepetitionTest<TestParams> + 'static,
    ) {
        self.register_test_with_tester(test_name, target_processed_byte_count, RepetitionTester::new(), test);
    }
}

impl<TestParams, C: CycleCounter, W: Write> RepetitionSuite<TestParams, C, W> {
    pub fn with_shared_test_params(shared_test_params: TestParams) -> Self {
        Self {
            shared_test_params,
            seconds_to_try: DEFAULT_SECONDS_TO_TRY,
            print_new_minimums: true,
            tests: Vec::new(),
        }
    }

    pub fn with_seconds_to_try(mut self, seconds_to_try: u32) -> Self {
        self.seconds_to_try = seconds_to_try;
        self
    }

    pub fn with_print_new_minimums(mut self, print_new_minimums: bool) -> Self {
        self.print_new_minimums = print_new_minimums;
        self
    }

    pub fn shared_test_params(&self) -> &TestParams { &self.shared_test_params }

    /// Each registered test's name and tester, in registration order.
    pub fn testers(&self) -> impl Iterator<Item = (&str, &RepetitionTester<C, W>)> {
        self.tests.iter().map(|registered| (registered.name.as_str(), &registered.tester))
    }

    /// Register a test that runs on `tester`. The suite's minimum printing setting overrides the
    /// tester's.
    pub fn register_test_with_tester(
        &mut self,
        test_name: impl Into<String>,
        target_processed_byte_count: u64,
        mut tester: RepetitionTester<C, W>,
        test: impl RepetitionTest<TestParams, C, W> + 'static,
    ) {
        tester.set_print_new_minimums(self.print_new_minimums);
        self.tests.push(RegisteredTest {
            name: test_name.into(),
            target_processed_byte_count,
            tester,
            test: Box::new(test),
        });
    }

    /// Run one wave of every test in registration order.
    pub fn run_once(&mut self, cpu_freq: u64) -> Vec<WaveSummary> {
        let mut summaries = Vec::with_capacity(self.tests.len());
        for registered in &mut self.tests {
            let RegisteredTest { name, tester, test, target_processed_byte_count } = &mut *registered;
            _ = writeln!(tester.output_mut(), "======= {name} =======");
            log::debug!("starting wave for {name}");

            tester.start_wave_with_timeout(*target_processed_byte_count, cpu_freq, self.seconds_to_try);
            while tester.poll() {
                test(&mut *tester, &mut self.shared_test_params);
            }
            _ = writeln!(tester.output_mut());

            summaries.push(WaveSummary {
                name: name.clone(),
                mode: tester.mode(),
                results: *tester.results(),
            });
        }

        summaries
    }

    /// Run waves forever.
    pub fn run_forever(&mut self, cpu_freq: u64) -> ! {
        loop { _ = self.run_once(cpu_freq); }
    }
}
