//! Chord — Cartesian offset to the next slot on the formation circle.

use std::f64::consts::PI;

use super::angle::shortest_arc;

/// A staged or committed motion target relative to the drone's
/// current position, plus the heading change `alpha`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
    pub alpha: f64,
}

/// Compute the chord offset that moves a drone from `phase_angle` to
/// `target_angle` along the circle of the given `radius`.
///
/// The drone, the formation centre and the target point form an
/// isosceles triangle: both legs are `radius`, the base is the chord.
/// The base angle is `alpha = (pi - inc_rad) / 2` and the chord length
/// follows from the law of cosines,
/// `chord = radius * sqrt(2 * (1 - cos(inc_rad)))`.
pub fn chord_offset(phase_angle: f64, target_angle: f64, radius: f64) -> Offset {
    let diff = shortest_arc(target_angle, phase_angle);
    let inc_rad = diff * PI / 180.0;
    let alpha = (PI - inc_rad) / 2.0;
    let chord = radius * (2.0 * (1.0 - inc_rad.cos())).sqrt();
    Offset {
        x: chord * alpha.cos(),
        y: chord * (-alpha).sin(),
        alpha,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_chord_length_matches_euclidean_distance() {
        // Two points inc_rad apart on a circle of radius r.
        let r = 2.0;
        let mut deg = 10.0;
        while deg <= 180.0 {
            let inc_rad = deg * PI / 180.0;
            let offset = chord_offset(0.0, deg, r);
            let chord = (offset.x * offset.x + offset.y * offset.y).sqrt();

            let (x1, y1) = (r, 0.0);
            let (x2, y2) = (r * inc_rad.cos(), r * inc_rad.sin());
            let euclid = ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt();

            assert!(
                (chord - euclid).abs() < 1e-9,
                "chord {} != euclidean {} at {} deg",
                chord,
                euclid,
                deg
            );
            deg += 10.0;
        }
    }

    #[test]
    fn test_alpha_is_half_of_remaining_angle() {
        let offset = chord_offset(0.0, 120.0, 1.0);
        let inc_rad = 120.0 * PI / 180.0;
        assert!((offset.alpha - (PI - inc_rad) / 2.0).abs() < EPS);
    }

    #[test]
    fn test_quarter_turn_scenario() {
        // inc_rad = pi/2, radius = 2 => chord = 2*sqrt(2), alpha = pi/4,
        // offset = (2.0, -2.0).
        let offset = chord_offset(0.0, 90.0, 2.0);
        let chord = (offset.x * offset.x + offset.y * offset.y).sqrt();
        assert!((chord - 2.0 * 2.0_f64.sqrt()).abs() < 1e-9);
        assert!((offset.alpha - PI / 4.0).abs() < EPS);
        assert!((offset.x - 2.0).abs() < 1e-9);
        assert!((offset.y + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflex_difference_uses_shortest_arc() {
        // 350 -> 10 is a 20 degree hop, not 340.
        let short = chord_offset(350.0, 10.0, 1.0);
        let direct = chord_offset(0.0, 20.0, 1.0);
        assert!((short.x - direct.x).abs() < EPS);
        assert!((short.y - direct.y).abs() < EPS);
    }

    #[test]
    fn test_zero_difference_stays_in_place() {
        let offset = chord_offset(45.0, 45.0, 3.0);
        assert!(offset.x.abs() < EPS);
        assert!(offset.y.abs() < EPS);
        // Degenerate triangle: alpha collapses to pi/2.
        assert!((offset.alpha - PI / 2.0).abs() < EPS);
    }
}
