use std::fmt;
use clap::ValueEnum;

use crate::screen_buffer::ScreenBuffer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DrawLineMethod {
    /// Step along x in floating point and round y.
    Rounding,
    /// Integer midpoint decision.
    Bresenham,
}

impl DrawLineMethod {
    pub const ALL: [DrawLineMethod; 2] = [DrawLineMethod::Rounding, DrawLineMethod::Bresenham];
}

impl fmt::Display for DrawLineMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DrawLineMethod::Rounding => write!(f, "By Rounding"),
            DrawLineMethod::Bresenham => write!(f, "With Bresenham"),
        }
    }
}

/// Two endpoints. Only the first octant (x0 < x1, 0 <= slope <= 1) is rasterized correctly; other
/// lines come out truncated or skewed, which is fine for a timing comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

#[inline(never)]
pub fn draw_line(buffer: &mut ScreenBuffer, line: Line, color: u32, method: DrawLineMethod) {
    match method {
        DrawLineMethod::Rounding => draw_line_by_rounding(buffer, line, color),
        DrawLineMethod::Bresenham => draw_line_with_bresenham(buffer, line, color),
    }
}

// Endpoints are widened to i64 so deltas and the doubled decision terms can't overflow for any pair
// of i32 endpoints.
fn draw_line_by_rounding(buffer: &mut ScreenBuffer, Line { x0, y0, x1, y1 }: Line, color: u32) {
    let (x0, y0, x1, y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
    let dx = x1 - x0;
    let dy = y1 - y0;
    if dx <= 0 { return; }

    let m = dy as f32 / dx as f32;
    let mut y_on_the_line = y0 as f32;
    for x in x0 .. x1 {
        y_on_the_line += m;
        buffer.draw_pixel(x, y_on_the_line.round() as i64, color);
    }
}

fn draw_line_with_bresenham(buffer: &mut ScreenBuffer, Line { x0, y0, x1, y1 }: Line, color: u32) {
    // Implicit line: f(x, y) = dy*x - dx*y + c. The decision variable is f evaluated at the next
    // midpoint, doubled so everything stays integral. Stepping east changes it by 2dy, stepping
    // north-east by 2(dy - dx).
    let (x0, y0, x1, y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
    let dx = x1 - x0;
    let dy = y1 - y0;
    let increment_e = 2 * dy;
    let increment_ne = 2 * (dy - dx);
    let mut decision = 2 * dy - dx;
    let mut y = y0;

    for x in x0 .. x1 {
        if decision <= 0 {
            decision += increment_e;
        } else {
            y += 1;
            decision += increment_ne;
        }

        buffer.draw_pixel(x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: u32 = 0x00FF_0000;

    fn lit_pixels(buffer: &ScreenBuffer) -> Vec<(i64, i64)> {
        let mut lit = Vec::new();
        for y in 0 .. buffer.height() as i64 {
            for x in 0 .. buffer.width() as i64 {
                if buffer.pixel(x, y) != Some(0) { lit.push((x, y)); }
            }
        }
        lit
    }

    fn render(line: Line, method: DrawLineMethod) -> Vec<(i64, i64)> {
        let mut buffer = ScreenBuffer::new(16, 16).unwrap();
        draw_line(&mut buffer, line, RED, method);
        lit_pixels(&buffer)
    }

    #[test]
    fn rounding_rounds_the_accumulated_y() {
        let line = Line { x0: 0, y0: 0, x1: 4, y1: 2 };
        assert_eq!(render(line, DrawLineMethod::Rounding), vec![(0, 1), (1, 1), (2, 2), (3, 2)]);
    }

    #[test]
    fn bresenham_steps_on_the_midpoint_decision() {
        let line = Line { x0: 0, y0: 0, x1: 4, y1: 2 };
        assert_eq!(render(line, DrawLineMethod::Bresenham), vec![(0, 0), (1, 1), (2, 1), (3, 2)]);
    }

    #[test]
    fn horizontal_lines_agree() {
        let line = Line { x0: 2, y0: 5, x1: 9, y1: 5 };
        let expected: Vec<_> = (2 .. 9).map(|x| (x, 5)).collect();
        assert_eq!(render(line, DrawLineMethod::Rounding), expected);
        assert_eq!(render(line, DrawLineMethod::Bresenham), expected);
    }

    #[test]
    fn both_methods_plot_one_pixel_per_column() {
        let line = Line { x0: 1, y0: 1, x1: 15, y1: 7 };
        for method in DrawLineMethod::ALL {
            let lit = render(line, method);
            assert_eq!(lit.len(), 14, "{method}");
            let mut columns: Vec<_> = lit.iter().map(|&(x, _)| x).collect();
            columns.sort();
            columns.dedup();
            assert_eq!(columns, (1 .. 15).collect::<Vec<_>>(), "{method}");
            // Never strays more than a pixel from the true line.
            for (x, y) in lit {
                let exact = 1.0 + (x - 1) as f32 * 6.0 / 14.0;
                assert!((y as f32 - exact).abs() <= 1.0, "{method}: ({x}, {y})");
            }
        }
    }

    #[test]
    fn extreme_endpoints_are_clipped() {
        // dy here doesn't fit in an i32, and neither does the doubled decision term.
        let line = Line { x0: 0, y0: -2_000_000_000, x1: 2, y1: 2_000_000_000 };
        // The first rounded step lands exactly on y = 0; Bresenham only ever climbs by one.
        assert_eq!(render(line, DrawLineMethod::Rounding), vec![(0, 0)]);
        assert!(render(line, DrawLineMethod::Bresenham).is_empty());

        let line = Line { x0: i32::MIN, y0: i32::MAX, x1: i32::MIN + 3, y1: i32::MIN };
        for method in DrawLineMethod::ALL {
            assert!(render(line, method).is_empty(), "{method}");
        }
    }

    #[test]
    fn reversed_lines_draw_nothing() {
        let line = Line { x0: 9, y0: 0, x1: 3, y1: 2 };
        assert!(render(line, DrawLineMethod::Rounding).is_empty());
        assert!(render(line, DrawLineMethod::Bresenham).is_empty());
    }

    #[test]
    fn names_match_report_headings() {
        assert_eq!(DrawLineMethod::Rounding.to_string(), "By Rounding");
        assert_eq!(DrawLineMethod::Bresenham.to_string(), "With Bresenham");
    }
}
