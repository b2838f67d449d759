//! Colour palette and the diverging colormap used for potential maps.

use plotters::style::RGBColor;

pub const BLACK: RGBColor = RGBColor(0, 0, 0);
pub const WHITE: RGBColor = RGBColor(255, 255, 255);
pub const GRAY: RGBColor = RGBColor(128, 128, 128);
pub const LIGHT_GRAY: RGBColor = RGBColor(211, 211, 211);

// Named colours
pub const BLUE: RGBColor = RGBColor(0, 0, 255);
pub const RED: RGBColor = RGBColor(255, 0, 0);
pub const GREEN: RGBColor = RGBColor(0, 128, 0);
pub const ORANGE: RGBColor = RGBColor(255, 165, 0);
pub const PURPLE: RGBColor = RGBColor(128, 0, 128);
pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
pub const LIGHT_CORAL: RGBColor = RGBColor(240, 128, 128);
pub const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
pub const DARK_RED: RGBColor = RGBColor(139, 0, 0);

// Report accents
pub const STEEL_BLUE: RGBColor = RGBColor(0x2E, 0x86, 0xAB); // Left electrode / first series
pub const MAGENTA: RGBColor = RGBColor(0xA2, 0x3B, 0x72); // Right electrode / second series
pub const AMBER: RGBColor = RGBColor(0xF1, 0x8F, 0x01); // Third series
pub const SERIES_BLUE: RGBColor = RGBColor(0x4C, 0x78, 0xA8); // Series network
pub const PARALLEL_TEAL: RGBColor = RGBColor(0x72, 0xB7, 0xB2); // Parallel network
pub const MIXED_ORANGE: RGBColor = RGBColor(0xF5, 0x85, 0x18); // Mixed network

/// Default cycle for series without an explicit colour.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),  // Blue
    RGBColor(255, 127, 14),  // Orange
    RGBColor(44, 160, 44),   // Green
    RGBColor(214, 39, 40),   // Red
    RGBColor(148, 103, 189), // Purple
    RGBColor(140, 86, 75),   // Brown
    RGBColor(227, 119, 194), // Pink
    RGBColor(127, 127, 127), // Grey
    RGBColor(188, 189, 34),  // Olive
    RGBColor(23, 190, 207),  // Cyan
];

/// Diverging blue-white-red stops, low values blue.
const RDBU_R: [RGBColor; 11] = [
    RGBColor(5, 48, 97),
    RGBColor(33, 102, 172),
    RGBColor(67, 147, 195),
    RGBColor(146, 197, 222),
    RGBColor(209, 229, 240),
    RGBColor(247, 247, 247),
    RGBColor(253, 219, 199),
    RGBColor(244, 165, 130),
    RGBColor(214, 96, 77),
    RGBColor(178, 24, 43),
    RGBColor(103, 0, 31),
];

pub fn palette(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

/// Sample the diverging map at `t` in `[0, 1]`. Out-of-range input is clamped,
/// NaN maps to the neutral centre.
pub fn rdbu_r(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let pos = t * (RDBU_R.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(RDBU_R.len() - 1);
    let frac = pos - lo as f64;

    let (a, b) = (RDBU_R[lo], RDBU_R[hi]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Map `value` from `[lo, hi]` onto the diverging map.
pub fn rdbu_r_between(value: f64, lo: f64, hi: f64) -> RGBColor {
    if hi <= lo {
        return rdbu_r(0.5);
    }
    rdbu_r((value - lo) / (hi - lo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_centre() {
        assert_eq!(rdbu_r(0.0), RDBU_R[0]);
        assert_eq!(rdbu_r(1.0), RDBU_R[10]);
        assert_eq!(rdbu_r(0.5), RGBColor(247, 247, 247));
        assert_eq!(rdbu_r(f64::NAN), rdbu_r(0.5));
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(rdbu_r(-3.0), rdbu_r(0.0));
        assert_eq!(rdbu_r_between(2.0, -1.0, 1.0), rdbu_r(1.0));
        assert_eq!(rdbu_r_between(0.3, 1.0, 1.0), rdbu_r(0.5));
    }

    #[test]
    fn low_values_are_blue() {
        let c = rdbu_r(0.1);
        assert!(c.2 > c.0);
        let c = rdbu_r(0.9);
        assert!(c.0 > c.2);
    }
}
