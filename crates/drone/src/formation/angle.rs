//! Angle — phase-angle arithmetic on the formation circle.

/// Wrap an angle into [0, 360) degrees.
///
/// Uses a true euclidean modulo so it stays correct for increments of
/// 360 degrees or more and for negative inputs, not just for a single
/// overflow past 360.
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 when the input is a tiny
    // negative number, e.g. -1e-14.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest-arc angular distance between two phase angles, degrees in [0, 180].
pub fn shortest_arc(a: f64, b: f64) -> f64 {
    let mut diff = (a - b).abs();
    if diff > 180.0 {
        diff = 360.0 - diff;
    }
    diff
}

/// Angular spacing between consecutive drones for a ring of `ring_size`
/// members: 360 / (ring_size - 1) degrees.
pub fn spacing(ring_size: u32) -> f64 {
    360.0 / f64::from(ring_size - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_wrap_identity_inside_domain() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert!((wrap_degrees(359.9) - 359.9).abs() < EPS);
    }

    #[test]
    fn test_wrap_single_overflow() {
        assert!((wrap_degrees(360.0)).abs() < EPS);
        assert!((wrap_degrees(480.0) - 120.0).abs() < EPS);
    }

    #[test]
    fn test_wrap_large_increment() {
        // The original single-subtraction wrap breaks here.
        assert!((wrap_degrees(1080.0)).abs() < EPS);
        assert!((wrap_degrees(725.0) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_wrap_negative_angle() {
        assert!((wrap_degrees(-90.0) - 270.0).abs() < EPS);
    }

    #[test]
    fn test_wrap_stays_in_domain_over_grid() {
        let mut angle = 0.0;
        while angle < 360.0 {
            let mut increment = 1.0;
            while increment < 360.0 {
                let wrapped = wrap_degrees(angle + increment);
                assert!(
                    (0.0..360.0).contains(&wrapped),
                    "wrap({} + {}) = {} left [0,360)",
                    angle,
                    increment,
                    wrapped
                );
                increment += 17.0;
            }
            angle += 23.0;
        }
    }

    #[test]
    fn test_shortest_arc_below_half_turn() {
        assert!((shortest_arc(120.0, 0.0) - 120.0).abs() < EPS);
        assert!((shortest_arc(0.0, 120.0) - 120.0).abs() < EPS);
    }

    #[test]
    fn test_shortest_arc_above_half_turn_folds() {
        assert!((shortest_arc(350.0, 10.0) - 20.0).abs() < EPS);
        assert!((shortest_arc(10.0, 350.0) - 20.0).abs() < EPS);
    }

    #[test]
    fn test_spacing_ring_of_four() {
        assert!((spacing(4) - 120.0).abs() < EPS);
    }

    #[test]
    fn test_spacing_ring_of_seven() {
        assert!((spacing(7) - 60.0).abs() < EPS);
    }
}
