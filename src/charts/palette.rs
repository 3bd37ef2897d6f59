//! Color palette shared by the interactive and static charts (RGB triples).

/// Taxi orange, used for single-series charts.
pub const ACCENT: (u8, u8, u8) = (244, 165, 34);

/// Light-to-dark orange ramp for ranked bars.
pub const ORANGES: [(u8, u8, u8); 2] = [(253, 208, 162), (217, 72, 1)];

/// Qualitative palette for categorical slices.
pub const SET2: [(u8, u8, u8); 8] = [
    (102, 194, 165), // Teal
    (252, 141, 98),  // Salmon
    (141, 160, 203), // Lavender
    (231, 138, 195), // Pink
    (166, 216, 84),  // Lime
    (255, 217, 47),  // Yellow
    (229, 196, 148), // Sand
    (179, 179, 179), // Grey
];

/// Yellow-orange-red ramp stops for the heatmap.
const YL_OR_RD: [(u8, u8, u8); 4] = [
    (255, 255, 204),
    (254, 178, 76),
    (240, 59, 32),
    (128, 0, 38),
];

fn lerp(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Heatmap color for `value` in `0..=max`.
pub fn heat_color(value: usize, max: usize) -> (u8, u8, u8) {
    if max == 0 {
        return YL_OR_RD[0];
    }
    let t = (value as f64 / max as f64).clamp(0.0, 1.0);
    let segments = (YL_OR_RD.len() - 1) as f64;
    let pos = t * segments;
    let idx = (pos.floor() as usize).min(YL_OR_RD.len() - 2);
    lerp(YL_OR_RD[idx], YL_OR_RD[idx + 1], pos - idx as f64)
}

/// Bar color scaled by rank within `0..=max`.
pub fn orange_for(value: usize, max: usize) -> (u8, u8, u8) {
    let t = if max == 0 { 1.0 } else { value as f64 / max as f64 };
    lerp(ORANGES[0], ORANGES[1], t.clamp(0.0, 1.0))
}

pub fn categorical(index: usize) -> (u8, u8, u8) {
    SET2[index % SET2.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_ramp_endpoints() {
        assert_eq!(heat_color(0, 10), (255, 255, 204));
        assert_eq!(heat_color(10, 10), (128, 0, 38));
        assert_eq!(heat_color(3, 0), (255, 255, 204));
    }

    #[test]
    fn categorical_wraps() {
        assert_eq!(categorical(0), categorical(SET2.len()));
    }
}
