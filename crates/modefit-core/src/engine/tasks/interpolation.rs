use std::ops::RangeInclusive;

/// Frame steps `floor(-F/2) ..= floor(F/2)`, giving `F + 1` steps; none when `F == 0`.
///
/// For an odd frame count the grid is one step longer on the negative side,
/// e.g. `F = 5` yields `-3..=2`.
pub fn frame_steps(num_frames: usize) -> RangeInclusive<i64> {
    if num_frames == 0 {
        return RangeInclusive::new(1, 0);
    }
    let f = num_frames as i64;
    (-f).div_euclid(2)..=f.div_euclid(2)
}

/// Displacement amplitude along a mode at frame step `step`:
/// `step * C * (1 / eigenvalue) * 2 / F`.
///
/// The eigenvalue enters linearly through the variance `1 / eigenvalue`, not as
/// a standard deviation.
#[inline]
pub fn coefficient(step: i64, scaling: f64, eigenvalue: f64, num_frames: usize) -> f64 {
    step as f64 * scaling * (1.0 / eigenvalue) * 2.0 / num_frames as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_frames_span_minus_ten_to_ten() {
        let steps: Vec<i64> = frame_steps(20).collect();
        assert_eq!(steps.len(), 21);
        assert_eq!(steps.first(), Some(&-10));
        assert_eq!(steps.last(), Some(&10));
    }

    #[test]
    fn odd_frame_count_floors_both_ends() {
        assert_eq!(frame_steps(5).collect::<Vec<_>>(), vec![-3, -2, -1, 0, 1, 2]);
        assert_eq!(frame_steps(1).collect::<Vec<_>>(), vec![-1, 0]);
    }

    #[test]
    fn zero_frames_produce_no_steps() {
        assert_eq!(frame_steps(0).count(), 0);
    }

    #[test]
    fn coefficient_scales_with_variance() {
        // 5 * 3.0 * (1 / 2.0) * 2 / 20
        assert!((coefficient(5, 3.0, 2.0, 20) - 0.75).abs() < 1e-12);
        assert_eq!(coefficient(0, 3.0, 2.0, 20), 0.0);
        assert!((coefficient(-10, 3.0, 0.5, 20) + 6.0).abs() < 1e-12);
    }
}
