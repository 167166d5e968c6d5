//! Color mapping for attribution plots

use plotters::style::RGBColor;

/// Low end of the feature-value gradient (blue)
pub(crate) const LOW: RGBColor = RGBColor(0, 139, 251);
/// High end of the feature-value gradient (red)
pub(crate) const HIGH: RGBColor = RGBColor(255, 0, 82);

/// Bar fill, matching the gradient's low end
pub(crate) const BAR_FILL: RGBColor = LOW;

/// Linear blend between the gradient ends; `t` is clamped to [0, 1].
pub(crate) fn value_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(
        lerp(LOW.0, HIGH.0),
        lerp(LOW.1, HIGH.1),
        lerp(LOW.2, HIGH.2),
    )
}

/// The 5th and 95th percentile of `values`, the clipping bounds for the
/// summary plot's color scale.
pub(crate) fn percentile_bounds(values: &[f64]) -> (f64, f64) {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if sorted.is_empty() {
        return (0.0, 0.0);
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q = |p: f64| -> f64 {
        let idx = (p * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx]
    };
    (q(0.05), q(0.95))
}

/// Normalize `v` into [0, 1] against clipping bounds; degenerate bounds
/// map everything to the gradient midpoint.
pub(crate) fn percentile_norm(v: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo {
        return 0.5;
    }
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_ends() {
        assert_eq!(value_color(0.0), LOW);
        assert_eq!(value_color(1.0), HIGH);
    }

    #[test]
    fn test_gradient_clamps() {
        assert_eq!(value_color(-3.0), LOW);
        assert_eq!(value_color(7.0), HIGH);
    }

    #[test]
    fn test_percentile_norm_span() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let (lo, hi) = percentile_bounds(&values);
        assert!(percentile_norm(0.0, lo, hi) < 0.05);
        assert!(percentile_norm(99.0, lo, hi) > 0.95);
        let mid = percentile_norm(50.0, lo, hi);
        assert!((mid - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_percentile_norm_constant_column() {
        let values = vec![3.0; 10];
        let (lo, hi) = percentile_bounds(&values);
        assert_eq!(percentile_norm(3.0, lo, hi), 0.5);
    }
}
