//! Text measurement seam.
//!
//! The editor never touches a font stack directly; text boxes size
//! themselves through this trait so hosts can plug in real shaping. The
//! default implementation uses a fixed average advance, which tracks
//! Arial closely enough for box sizing.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSize {
    pub width: f64,
    pub height: f64,
}

pub trait TextMeasurer: Send + Sync {
    /// Measure `content` at `font_size`, wrapping at `max_width`.
    fn measure(&self, content: &str, font_size: f64, max_width: f64) -> TextSize;
}

/// Average-advance measurer: 0.6em per character, 1.2em line height.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure(&self, content: &str, font_size: f64, max_width: f64) -> TextSize {
        let advance = font_size * 0.6;
        let line_height = font_size * 1.2;
        if content.is_empty() {
            return TextSize { width: 0.0, height: line_height };
        }
        let mut lines = 0usize;
        let mut widest = 0.0f64;
        for line in content.split('\n') {
            let width = line.chars().count() as f64 * advance;
            if max_width > 0.0 && width > max_width {
                let per_line = (max_width / advance).floor().max(1.0) as usize;
                lines += line.chars().count().div_ceil(per_line);
                widest = widest.max(max_width);
            } else {
                lines += 1;
                widest = widest.max(width);
            }
        }
        TextSize { width: widest, height: lines as f64 * line_height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_width_scales_with_length() {
        let m = HeuristicMeasurer;
        let size = m.measure("hello", 20.0, 0.0);
        assert_eq!(size.width, 5.0 * 12.0);
        assert_eq!(size.height, 24.0);
    }

    #[test]
    fn newlines_add_line_height() {
        let m = HeuristicMeasurer;
        let size = m.measure("a\nbb\nccc", 10.0, 0.0);
        assert_eq!(size.height, 3.0 * 12.0);
        assert_eq!(size.width, 3.0 * 6.0);
    }

    #[test]
    fn long_lines_wrap_at_max_width() {
        let m = HeuristicMeasurer;
        // 20 chars at 6px advance is 120px; a 60px box fits 10 per line.
        let size = m.measure(&"x".repeat(20), 10.0, 60.0);
        assert_eq!(size.height, 2.0 * 12.0);
        assert_eq!(size.width, 60.0);
    }
}
