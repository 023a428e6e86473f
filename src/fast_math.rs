/*
 * Fast Math Module
 *
 * Approximate vector kernels shared by every steering computation.
 * All of them avoid a true square root:
 * - approx_inv_sqrt: bit-pattern estimate refined by one Newton step
 * - normalize_to: rescale a direction to a given magnitude
 * - clamp_magnitude: cap the length of a vector
 *
 * Degenerate inputs (zero-length vectors, non-positive squares, non-finite
 * components) collapse to the zero vector instead of producing NaN or
 * infinity. Components large enough for their squares to overflow are brought
 * down to unit scale before the length is taken.
 */

use nannou::prelude::*;

/// Squared magnitudes at or below this are treated as the zero vector.
pub const EPSILON: f32 = 1e-9;

const MAGIC: u32 = 0x5f37_59df;

/// Approximates `1 / sqrt(x)`. Returns `0.0` for `x <= 0`, NaN and infinity.
///
/// Relative error stays below 0.2% over the normal f32 range.
#[inline]
pub fn approx_inv_sqrt(x: f32) -> f32 {
    if !(x.is_finite() && x > 0.0) {
        return 0.0;
    }
    let half = 0.5 * x;
    let y = f32::from_bits(MAGIC.wrapping_sub(x.to_bits() >> 1));
    // One Newton-Raphson refinement
    y * (1.5 - half * y * y)
}

// Finite components whose squares overflow are divided by the larger one
#[inline]
fn shrink_overflowing(dx: f32, dy: f32) -> (f32, f32, f32) {
    let m2 = dx * dx + dy * dy;
    if m2.is_finite() {
        return (dx, dy, m2);
    }
    let largest = dx.abs().max(dy.abs());
    let (dx, dy) = (dx / largest, dy / largest);
    (dx, dy, dx * dx + dy * dy)
}

/// Scales `(dx, dy)` to `magnitude`, or returns zero for a negligible or
/// non-finite input.
#[inline]
pub fn normalize_to(dx: f32, dy: f32, magnitude: f32) -> Vec2 {
    if !(dx.is_finite() && dy.is_finite()) {
        return Vec2::ZERO;
    }
    let (dx, dy, m2) = shrink_overflowing(dx, dy);
    if m2 <= EPSILON {
        return Vec2::ZERO;
    }
    let scale = approx_inv_sqrt(m2) * magnitude;
    vec2(dx * scale, dy * scale)
}

/// Caps the length of `v` at `max_magnitude`. A non-finite `v` becomes zero.
#[inline]
pub fn clamp_magnitude(v: Vec2, max_magnitude: f32) -> Vec2 {
    if !v.is_finite() {
        return Vec2::ZERO;
    }
    let m2 = v.length_squared();
    if m2.is_finite() && (m2 <= max_magnitude * max_magnitude || m2 <= EPSILON) {
        return v;
    }
    let (x, y, m2) = shrink_overflowing(v.x, v.y);
    vec2(x, y) * (max_magnitude * approx_inv_sqrt(m2))
}

/// Reynolds steering: `clamp(desired - velocity, max_force)`.
#[inline]
pub fn steer_towards(desired: Vec2, velocity: Vec2, max_force: f32) -> Vec2 {
    clamp_magnitude(desired - velocity, max_force)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inv_sqrt_is_accurate_over_a_wide_range() {
        let mut x = 1e-6_f32;
        while x < 1e7 {
            let err = (approx_inv_sqrt(x) * x.sqrt() - 1.0).abs();
            assert!(err < 0.01, "x = {x}, relative error = {err}");
            x *= 1.37;
        }
    }

    #[test]
    fn inv_sqrt_of_non_positive_is_zero() {
        assert_eq!(approx_inv_sqrt(0.0), 0.0);
        assert_eq!(approx_inv_sqrt(-0.0), 0.0);
        assert_eq!(approx_inv_sqrt(-4.0), 0.0);
        assert_eq!(approx_inv_sqrt(f32::NAN), 0.0);
        assert_eq!(approx_inv_sqrt(f32::INFINITY), 0.0);
    }

    #[test]
    fn huge_components_do_not_overflow() {
        // 3e30 squared is past f32::MAX
        let v = normalize_to(3e30, -4e30, 10.0);
        assert!(v.is_finite());
        assert!((v.length() - 10.0).abs() < 0.05);
        assert!((v.x / v.y + 0.75).abs() < 1e-4);

        let v = clamp_magnitude(vec2(3e30, 4e30), 5.0);
        assert!(v.is_finite());
        assert!((v - vec2(3.0, 4.0)).length() < 0.02);
    }

    #[test]
    fn non_finite_inputs_become_zero() {
        assert_eq!(normalize_to(f32::INFINITY, 1.0, 2.0), Vec2::ZERO);
        assert_eq!(normalize_to(f32::NAN, 1.0, 2.0), Vec2::ZERO);
        assert_eq!(clamp_magnitude(vec2(f32::NEG_INFINITY, 0.0), 2.0), Vec2::ZERO);
        assert_eq!(clamp_magnitude(vec2(0.0, f32::NAN), 2.0), Vec2::ZERO);
    }

    #[test]
    fn normalize_to_hits_the_requested_magnitude() {
        let v = normalize_to(3.0, -4.0, 10.0);
        assert!((v.length() - 10.0).abs() < 0.05);
        assert!(v.x > 0.0 && v.y < 0.0);
        assert!((v.x / v.y + 0.75).abs() < 1e-4);
    }

    #[test]
    fn normalize_to_tiny_vector_is_zero() {
        assert_eq!(normalize_to(0.0, 0.0, 5.0), Vec2::ZERO);
        assert_eq!(normalize_to(1e-6, -1e-6, 5.0), Vec2::ZERO);
    }

    #[test]
    fn clamp_leaves_short_vectors_alone() {
        let v = vec2(0.3, 0.4);
        assert_eq!(clamp_magnitude(v, 1.0), v);
        assert_eq!(clamp_magnitude(vec2(1e-6, 0.0), 0.0), vec2(1e-6, 0.0));
    }

    #[test]
    fn clamp_rescales_long_vectors() {
        let v = clamp_magnitude(vec2(30.0, 40.0), 5.0);
        assert!((v.length() - 5.0).abs() < 0.01);
        assert!((v.x - 3.0).abs() < 0.01 && (v.y - 4.0).abs() < 0.01);
    }

    #[test]
    fn steering_is_capped() {
        let s = steer_towards(vec2(10.0, 0.0), vec2(-10.0, 0.0), 0.5);
        assert!(s.length() <= 0.5 + 1e-4);
        assert!(s.x > 0.0);
    }
}
