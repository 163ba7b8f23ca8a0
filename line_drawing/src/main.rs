mod config;
mod draw_line;
mod screen_buffer;

use anyhow::Context;
use clap::Parser;
use log::{ info, warn };
use performance_metrics::get_cpu_frequency_estimate;
use repetition_tester::{ RepetitionSuite, RepetitionTester, TestMode };

use config::Config;
use draw_line::{ draw_line, Line };
use screen_buffer::ScreenBuffer;

struct SharedTestParams {
    buffer: ScreenBuffer,
    line: Line,
    color: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();

    let buffer = ScreenBuffer::new(config.width, config.height)
        .context("failed to create screen buffer")?;
    // Every repetition claims the whole buffer, even though a line only touches a sliver of it.
    let target_processed_byte_count = buffer.memory_count() as u64;
    info!(
        "{}x{} screen buffer ({} bytes per pixel, {} byte pitch), {target_processed_byte_count} bytes",
        buffer.width(),
        buffer.height(),
        buffer.bytes_per_pixel(),
        buffer.pitch(),
    );

    let cpu_freq = get_cpu_frequency_estimate(config.calibration_ms);
    if cpu_freq == 0 {
        warn!("could not estimate cpu frequency, reporting raw cycle counts only");
    } else {
        info!("cpu frequency estimate: {cpu_freq}");
    }

    let shared_test_params = SharedTestParams { buffer, line: config.line(), color: config.color };
    let mut suite = RepetitionSuite::new(shared_test_params)
        .with_seconds_to_try(config.seconds_to_try)
        .with_print_new_minimums(!config.quiet_minimums);

    for method in config.methods() {
        suite.register_test(
            format!("Line Drawing: {method}"),
            target_processed_byte_count,
            move |tester: &mut RepetitionTester, params: &mut SharedTestParams| {
                let SharedTestParams { buffer, line, color } = params;
                tester.time_block(|| draw_line(buffer, *line, *color, method));
                tester.record_bytes(buffer.memory_count() as u64);
            },
        );
    }

    let Some(waves) = config.waves else { suite.run_forever(cpu_freq) };
    for _ in 0 .. waves {
        for summary in suite.run_once(cpu_freq) {
            if summary.mode == TestMode::Error {
                warn!("{} ended in error, no results for this wave", summary.name);
            }
        }
    }

    Ok(())
}
