mod os_timer;

pub use os_timer::{ get_os_timer_frequency, read_os_timer };

/// Calibration window used when the caller has no opinion.
pub const DEFAULT_CALIBRATION_MILLIS: u64 = 100;

/// Upper bound on reference clock reads during calibration. Keeps a stalled or frozen reference
/// clock from spinning forever.
pub const MAX_CALIBRATION_SPINS: u64 = 1 << 30;

/// A free-running counter with no defined epoch. Only deltas are meaningful.
pub trait CycleCounter {
    fn read_cycles(&mut self) -> u64;
}

/// A monotonic wall clock with a known tick rate.
pub trait ReferenceClock {
    /// Ticks per second.
    fn frequency(&self) -> u64;
    fn read(&mut self) -> u64;
}

/// The hardware cycle counter (rdtsc on x86_64, cntvct_el0 on aarch64).
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuTimer;

impl CycleCounter for CpuTimer {
    #[inline(always)]
    fn read_cycles(&mut self) -> u64 { read_cpu_timer() }
}

/// The OS high resolution timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsTimer;

impl ReferenceClock for OsTimer {
    fn frequency(&self) -> u64 { get_os_timer_frequency() }
    fn read(&mut self) -> u64 { read_os_timer() }
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read_cpu_timer() -> u64 { unsafe { core::arch::x86_64::_rdtsc() } }

#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub fn read_cpu_timer() -> u64 {
    let cycles: u64;
    // cntvct_el0 is the virtual counter and is readable from EL0.
    unsafe { core::arch::asm!("mrs {}, cntvct_el0", out(reg) cycles, options(nomem, nostack)); }
    cycles
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
pub fn read_cpu_timer() -> u64 { read_os_timer() }

/// Given a sample interval in milliseconds, returns an estimate of how many CPU timer ticks occur
/// in one second. Returns 0 if no frequency could be derived.
///
/// This busy-waits on purpose. Don't call it from anywhere that cares about latency.
pub fn get_cpu_frequency_estimate(ms_to_wait: u64) -> u64 {
    estimate_frequency(&mut CpuTimer, &mut OsTimer, ms_to_wait)
}

/// Estimate the rate of `cycles` against `reference` by spinning for `ms_to_wait` milliseconds of
/// reference time.
///
/// A result of 0 means calibration was unavailable: either no wait was requested or the reference
/// clock never advanced. Callers must not divide by it.
pub fn estimate_frequency<C, R>(cycles: &mut C, reference: &mut R, ms_to_wait: u64) -> u64
where
    C: CycleCounter + ?Sized,
    R: ReferenceClock + ?Sized,
{
    estimate_frequency_bounded(cycles, reference, ms_to_wait, MAX_CALIBRATION_SPINS)
}

/// Same as [`estimate_frequency`] but gives up after `max_spins` reference clock reads.
pub fn estimate_frequency_bounded<C, R>(
    cycles: &mut C,
    reference: &mut R,
    ms_to_wait: u64,
    max_spins: u64,
) -> u64
where
    C: CycleCounter + ?Sized,
    R: ReferenceClock + ?Sized,
{
    let os_timer_frequency = reference.frequency();
    let os_wait_time = os_timer_frequency.saturating_mul(ms_to_wait) / 1000;

    let mut os_elapsed: u64 = 0;
    let mut spins: u64 = 0;
    let cpu_start = cycles.read_cycles();
    let os_start = reference.read();
    while os_elapsed < os_wait_time && spins < max_spins {
        os_elapsed = reference.read().wrapping_sub(os_start);
        spins += 1;
    }
    let cpu_end = cycles.read_cycles();
    let cpu_elapsed = cpu_end.wrapping_sub(cpu_start);

    if os_elapsed < os_wait_time {
        log::warn!("cpu frequency calibration gave up after {spins} reference clock reads");
    }

    if os_elapsed > 0 {
        let estimate = os_timer_frequency as u128 * cpu_elapsed as u128 / os_elapsed as u128;
        u64::try_from(estimate).unwrap_or(u64::MAX)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Advances by a fixed step every read.
    struct SteppingCounter { value: u64, step: u64 }

    impl CycleCounter for SteppingCounter {
        fn read_cycles(&mut self) -> u64 {
            self.value += self.step;
            self.value
        }
    }

    struct SteppingClock { value: u64, step: u64, frequency: u64, reads: u64 }

    impl ReferenceClock for SteppingClock {
        fn frequency(&self) -> u64 { self.frequency }
        fn read(&mut self) -> u64 {
            self.reads += 1;
            self.value += self.step;
            self.value
        }
    }

    #[test]
    fn frozen_reference_clock_yields_zero() {
        let mut cycles = SteppingCounter { value: 0, step: 1000 };
        let mut clock = SteppingClock { value: 5, step: 0, frequency: 1_000, reads: 0 };
        // 1ms at 1kHz is one tick, which a frozen clock never delivers.
        assert_eq!(estimate_frequency_bounded(&mut cycles, &mut clock, 1, 64), 0);
        assert_eq!(clock.reads, 65);
    }

    #[test]
    fn zero_wait_yields_zero() {
        let mut cycles = SteppingCounter { value: 0, step: 1000 };
        let mut clock = SteppingClock { value: 0, step: 1, frequency: 1_000_000, reads: 0 };
        assert_eq!(estimate_frequency(&mut cycles, &mut clock, 0), 0);
        // Only the starting read; the loop never runs.
        assert_eq!(clock.reads, 1);
    }

    #[test]
    fn scales_cycle_delta_by_reference_rate() {
        // Reference: 1MHz, advancing 100 ticks per read. Wait 1ms = 1000 ticks = 10 reads.
        // Cycles: 2 reads total (start and end), 3000 cycles apart.
        let mut cycles = SteppingCounter { value: 0, step: 3000 };
        let mut clock = SteppingClock { value: 0, step: 100, frequency: 1_000_000, reads: 0 };
        let estimate = estimate_frequency(&mut cycles, &mut clock, 1);
        assert_eq!(estimate, 1_000_000 * 3000 / 1000);
    }

    #[test]
    fn large_values_do_not_overflow() {
        let mut cycles = SteppingCounter { value: 0, step: u64::MAX / 4 };
        let mut clock = SteppingClock { value: 0, step: 1_000_000_000, frequency: 1_000_000_000, reads: 0 };
        let estimate = estimate_frequency(&mut cycles, &mut clock, 1000);
        assert_eq!(estimate, u64::MAX / 4);
    }

    #[test]
    fn os_timer_is_monotonic() {
        let first = read_os_timer();
        let second = read_os_timer();
        assert!(second >= first);
        assert!(get_os_timer_frequency() > 0);
    }

    #[test_log::test]
    fn hardware_estimate_is_nonzero() {
        assert!(get_cpu_frequency_estimate(10) > 0);
    }
}
