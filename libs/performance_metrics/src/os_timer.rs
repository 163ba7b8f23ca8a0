//! The OS reference clock. Slower to read than the cpu timer but ticks at a known rate.

#[cfg(windows)]
mod platform {
    use std::mem;
    use winapi::um::profileapi;

    pub fn get_os_timer_frequency() -> u64 {
        unsafe {
            let mut freq = mem::zeroed();
            profileapi::QueryPerformanceFrequency(&mut freq);
            *freq.QuadPart() as u64
        }
    }

    pub fn read_os_timer() -> u64 {
        unsafe {
            let mut counter = mem::zeroed();
            profileapi::QueryPerformanceCounter(&mut counter);
            *counter.QuadPart() as u64
        }
    }
}

#[cfg(unix)]
mod platform {
    const NANOS_PER_SECOND: u64 = 1_000_000_000;

    pub fn get_os_timer_frequency() -> u64 { NANOS_PER_SECOND }

    pub fn read_os_timer() -> u64 {
        let mut now = libc::timespec { tv_sec: 0, tv_nsec: 0 };
        // CLOCK_MONOTONIC can't fail with a valid pointer, so the return value is ignored.
        unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut now); }
        now.tv_sec as u64 * NANOS_PER_SECOND + now.tv_nsec as u64
    }
}

#[cfg(not(any(windows, unix)))]
mod platform {
    use std::{ sync::OnceLock, time::Instant };

    static ANCHOR: OnceLock<Instant> = OnceLock::new();

    pub fn get_os_timer_frequency() -> u64 { 1_000_000_000 }

    pub fn read_os_timer() -> u64 {
        ANCHOR.get_or_init(Instant::now).elapsed().as_nanos() as u64
    }
}

/// Ticks per second of [`read_os_timer`].
pub fn get_os_timer_frequency() -> u64 { platform::get_os_timer_frequency() }

pub fn read_os_timer() -> u64 { platform::read_os_timer() }
