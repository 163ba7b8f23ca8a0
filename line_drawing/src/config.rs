use clap::Parser;
use performance_metrics::DEFAULT_CALIBRATION_MILLIS;
use repetition_tester::DEFAULT_SECONDS_TO_TRY;

use crate::draw_line::{ DrawLineMethod, Line };

/// Red.
pub const LINE_COLOR: u32 = 0x00FF_0000;

/// Repeatedly rasterize a line with each method and report the fastest, slowest and average times.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Config {
    /// Screen buffer width in pixels.
    #[arg(long, default_value_t = 1920)]
    pub width: u32,
    /// Screen buffer height in pixels.
    #[arg(long, default_value_t = 1080)]
    pub height: u32,

    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub x0: i32,
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub y0: i32,
    #[arg(long, default_value_t = 200, allow_negative_numbers = true)]
    pub x1: i32,
    #[arg(long, default_value_t = 80, allow_negative_numbers = true)]
    pub y1: i32,

    /// 0x00RRGGBB, in hex (0x prefix) or decimal.
    #[arg(long, default_value_t = LINE_COLOR, value_parser = parse_color)]
    pub color: u32,

    /// Method to benchmark. Repeat to pick several; all of them by default.
    #[arg(long = "method", value_enum)]
    pub methods: Vec<DrawLineMethod>,

    /// Seconds without a new minimum before a wave ends.
    #[arg(long, default_value_t = DEFAULT_SECONDS_TO_TRY)]
    pub seconds_to_try: u32,

    /// How long to spin while estimating the cpu timer frequency.
    #[arg(long, default_value_t = DEFAULT_CALIBRATION_MILLIS)]
    pub calibration_ms: u64,

    /// Stop after this many waves of every method. Runs forever when omitted.
    #[arg(long)]
    pub waves: Option<usize>,

    /// Don't print each new minimum as it is found.
    #[arg(long)]
    pub quiet_minimums: bool,
}

impl Config {
    pub fn line(&self) -> Line {
        Line { x0: self.x0, y0: self.y0, x1: self.x1, y1: self.y1 }
    }

    pub fn methods(&self) -> Vec<DrawLineMethod> {
        if self.methods.is_empty() {
            DrawLineMethod::ALL.to_vec()
        } else {
            self.methods.clone()
        }
    }
}

fn parse_color(arg: &str) -> Result<u32, String> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => arg.parse(),
    };

    parsed.map_err(|e| format!("invalid color \"{arg}\": {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_setup() {
        let config = Config::try_parse_from(["line_drawing"]).unwrap();
        assert_eq!((config.width, config.height), (1920, 1080));
        assert_eq!(config.line(), Line { x0: 10, y0: 10, x1: 200, y1: 80 });
        assert_eq!(config.color, 0x00FF_0000);
        assert_eq!(config.methods(), DrawLineMethod::ALL.to_vec());
        assert_eq!(config.seconds_to_try, 10);
        assert_eq!(config.calibration_ms, 100);
        assert_eq!(config.waves, None);
        assert!(!config.quiet_minimums);
    }

    #[test]
    fn parses_overrides() {
        let config = Config::try_parse_from([
            "line_drawing",
            "--method", "bresenham",
            "--x0", "-5",
            "--color", "0x0000ff",
            "--waves", "2",
            "--seconds-to-try", "1",
            "--quiet-minimums",
        ]).unwrap();
        assert_eq!(config.methods(), vec![DrawLineMethod::Bresenham]);
        assert_eq!(config.x0, -5);
        assert_eq!(config.color, 0xFF);
        assert_eq!(config.waves, Some(2));
        assert_eq!(config.seconds_to_try, 1);
        assert!(config.quiet_minimums);
    }

    #[test]
    fn rejects_bad_colors() {
        assert!(parse_color("0xnope").is_err());
        assert!(parse_color("red").is_err());
        assert_eq!(parse_color("255"), Ok(255));
    }
}
