//! Small numeric helpers shared by the simulation math.

/// Linear interpolation between `a` and `b` by `t` in [0, 1].
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

/// Step `current` toward `target` by at most `max_delta`, never overshooting.
#[must_use]
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        max_delta.copysign(delta) + current
    }
}

/// Clamp to the unit interval.
#[must_use]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Percentile lookup on an already-sorted slice.
///
/// Uses the plain index formula `len * p / 100`; empty input yields 0.
#[must_use]
pub fn percentile_of_sorted(sorted: &[f32], percentile: usize) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (sorted.len() * percentile / 100).min(sorted.len() - 1);
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_and_midpoint() {
        assert!((lerp(0.0, 10.0, 0.0) - 0.0).abs() < f32::EPSILON);
        assert!((lerp(0.0, 10.0, 1.0) - 10.0).abs() < f32::EPSILON);
        assert!((lerp(2.0, 4.0, 0.5) - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn move_toward_is_rate_limited_both_directions() {
        assert!((move_toward(0.0, 1.0, 0.1) - 0.1).abs() < f32::EPSILON);
        assert!((move_toward(1.0, 0.0, 0.1) - 0.9).abs() < f32::EPSILON);
        assert!((move_toward(0.5, 0.52, 0.1) - 0.52).abs() < f32::EPSILON);
    }

    #[test]
    fn percentile_uses_sorted_index_lookup() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert!((percentile_of_sorted(&values, 50) - 6.0).abs() < f32::EPSILON);
        assert!((percentile_of_sorted(&values, 90) - 10.0).abs() < f32::EPSILON);
        assert!((percentile_of_sorted(&[], 50)).abs() < f32::EPSILON);
        assert!((percentile_of_sorted(&[3.5], 90) - 3.5).abs() < f32::EPSILON);
    }
}
