//! Bounce physics shared by the collision handlers
//!
//! Reflection, speed renormalization and the two paddle deflection models.
//! Screen coordinates: +x right, +y down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::CONCAVE_EXPONENT;
use crate::error::CollisionError;

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n, applied only while the body is
/// moving into the surface (v·n < 0). A separating contact keeps its
/// velocity so a multi-frame overlap cannot bounce twice.
#[inline]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    let approach = velocity.dot(normal);
    if approach < 0.0 {
        velocity - 2.0 * approach * normal
    } else {
        velocity
    }
}

/// Scale by restitution, then renormalize the magnitude into `[min, max]`
///
/// Direction is preserved. A zero-length velocity has no direction to keep
/// and is reported as an error; the watchdog re-kicks stalled balls. An
/// empty or non-finite speed range is an error too.
pub fn clamp_speed(
    velocity: Vec2,
    min: f32,
    max: f32,
    restitution: f32,
) -> Result<Vec2, CollisionError> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(CollisionError::InvalidSpeedRange { min, max });
    }
    let scaled = velocity * restitution;
    let speed = scaled.length();
    if speed <= f32::EPSILON || !speed.is_finite() {
        return Err(CollisionError::DegenerateVelocity);
    }
    let target = speed.clamp(min, max);
    if target == speed {
        Ok(scaled)
    } else {
        Ok(scaled / speed * target)
    }
}

/// Linear paddle model: deflection grows evenly toward the edges
#[inline]
pub fn paddle_bounce_angle(impact_offset: f32, max_angle: f32) -> f32 {
    impact_offset.clamp(-1.0, 1.0) * max_angle
}

/// Concave paddle model: `sign(o) * |o|^1.5 * max`
///
/// Flatter near the center and sharper near the edges than the linear model.
#[inline]
pub fn concave_bounce_angle(impact_offset: f32, max_angle: f32) -> f32 {
    let offset = impact_offset.clamp(-1.0, 1.0);
    offset.signum() * offset.abs().powf(CONCAVE_EXPONENT) * max_angle
}

/// Which side of the playfield a paddle guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddleEdge {
    Top,
    Bottom,
    Left,
    Right,
}

impl PaddleEdge {
    /// Normal pointing from the paddle into the playfield
    pub fn outward_normal(self) -> Vec2 {
        match self {
            PaddleEdge::Top => Vec2::new(0.0, 1.0),
            PaddleEdge::Bottom => Vec2::new(0.0, -1.0),
            PaddleEdge::Left => Vec2::new(1.0, 0.0),
            PaddleEdge::Right => Vec2::new(-1.0, 0.0),
        }
    }

    /// Axis along the paddle's length (positive offsets point this way)
    pub fn tangent(self) -> Vec2 {
        match self {
            PaddleEdge::Top | PaddleEdge::Bottom => Vec2::X,
            PaddleEdge::Left | PaddleEdge::Right => Vec2::Y,
        }
    }

    /// Where along the paddle the ball struck, in [-1, 1]
    pub fn impact_offset(self, ball_pos: Vec2, paddle_pos: Vec2, half_size: Vec2) -> f32 {
        let rel = ball_pos - paddle_pos;
        let (along, half) = match self {
            PaddleEdge::Top | PaddleEdge::Bottom => (rel.x, half_size.x),
            PaddleEdge::Left | PaddleEdge::Right => (rel.y, half_size.y),
        };
        if half <= 0.0 {
            return 0.0;
        }
        (along / half).clamp(-1.0, 1.0)
    }

    /// Unit direction deflected `angle` radians from the outward normal
    pub fn bounce_direction(self, angle: f32) -> Vec2 {
        self.outward_normal() * angle.cos() + self.tangent() * angle.sin()
    }
}

/// Paddle deflection model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BounceModel {
    #[default]
    Linear,
    Concave,
}

impl BounceModel {
    pub fn angle(self, impact_offset: f32, max_angle: f32) -> f32 {
        match self {
            BounceModel::Linear => paddle_bounce_angle(impact_offset, max_angle),
            BounceModel::Concave => concave_bounce_angle(impact_offset, max_angle),
        }
    }
}

/// Concave deflection resolved against a paddle edge's reflection axis
pub fn concave_bounce_direction(impact_offset: f32, max_angle: f32, edge: PaddleEdge) -> Vec2 {
    edge.bounce_direction(concave_bounce_angle(impact_offset, max_angle))
}

/// Axis-aligned normal of the brick face the ball struck
///
/// Compares how far the ball sits along each axis relative to the brick's
/// half extents; the larger ratio names the face. Corner hits resolve to
/// whichever axis wins, ties go to the vertical face.
pub fn brick_impact_normal(ball_pos: Vec2, brick_pos: Vec2, half_w: f32, half_h: f32) -> Vec2 {
    let rel = ball_pos - brick_pos;
    let ratio_x = rel.x.abs() / half_w.max(f32::EPSILON);
    let ratio_y = rel.y.abs() / half_h.max(f32::EPSILON);
    if ratio_x > ratio_y {
        Vec2::new(rel.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, rel.y.signum())
    }
}

/// Direction at `angle` radians from +x
#[inline]
pub fn direction_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::{FRAC_PI_3, TAU};

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_reflect_off_floor() {
        let reflected = reflect(Vec2::new(6.0, 8.0), Vec2::new(0.0, -1.0));
        assert!(approx(reflected, Vec2::new(6.0, -8.0)));
    }

    #[test]
    fn test_reflect_ignores_separating_contact() {
        let v = Vec2::new(6.0, -8.0);
        assert_eq!(reflect(v, Vec2::new(0.0, -1.0)), v);
        // Grazing contact (v·n == 0) is not reflected either
        let grazing = Vec2::new(5.0, 0.0);
        assert_eq!(reflect(grazing, Vec2::new(0.0, -1.0)), grazing);
    }

    #[test]
    fn test_clamp_speed_in_range_unchanged() {
        let v = clamp_speed(Vec2::new(6.0, -8.0), 5.0, 15.0, 1.0).unwrap();
        assert!(approx(v, Vec2::new(6.0, -8.0)));
    }

    #[test]
    fn test_clamp_speed_raises_slow_ball() {
        let v = clamp_speed(Vec2::new(3.0, 4.0), 8.0, 15.0, 1.0).unwrap();
        assert!(approx(v, Vec2::new(4.8, 6.4)));
    }

    #[test]
    fn test_clamp_speed_caps_fast_ball() {
        let v = clamp_speed(Vec2::new(30.0, 40.0), 5.0, 15.0, 1.0).unwrap();
        assert!((v.length() - 15.0).abs() < 1e-4);
        assert!(approx(v.normalize(), Vec2::new(0.6, 0.8)));
    }

    #[test]
    fn test_clamp_speed_applies_restitution_first() {
        let v = clamp_speed(Vec2::new(6.0, 8.0), 1.0, 15.0, 0.5).unwrap();
        assert!(approx(v, Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn test_clamp_speed_zero_velocity_is_error() {
        assert_eq!(
            clamp_speed(Vec2::ZERO, 5.0, 15.0, 1.0),
            Err(CollisionError::DegenerateVelocity)
        );
    }

    #[test]
    fn test_clamp_speed_rejects_bad_range() {
        let v = Vec2::new(6.0, 8.0);
        assert_eq!(
            clamp_speed(v, 20.0, 5.0, 1.0),
            Err(CollisionError::InvalidSpeedRange { min: 20.0, max: 5.0 })
        );
        assert!(clamp_speed(v, f32::NAN, 15.0, 1.0).is_err());
        assert!(clamp_speed(v, 5.0, f32::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_paddle_angle_linear() {
        assert_eq!(paddle_bounce_angle(0.0, FRAC_PI_3), 0.0);
        assert!((paddle_bounce_angle(0.5, FRAC_PI_3) - FRAC_PI_3 / 2.0).abs() < 1e-6);
        assert!((paddle_bounce_angle(-3.0, FRAC_PI_3) + FRAC_PI_3).abs() < 1e-6);
    }

    #[test]
    fn test_concave_flatter_in_center_same_at_edges() {
        let linear = paddle_bounce_angle(0.5, FRAC_PI_3);
        let concave = concave_bounce_angle(0.5, FRAC_PI_3);
        assert!(concave.abs() < linear.abs());
        assert!((concave - 0.5f32.powf(1.5) * FRAC_PI_3).abs() < 1e-6);

        assert!((concave_bounce_angle(1.0, FRAC_PI_3) - FRAC_PI_3).abs() < 1e-6);
        assert!((concave_bounce_angle(-1.0, FRAC_PI_3) + FRAC_PI_3).abs() < 1e-6);
        assert_eq!(concave_bounce_angle(0.0, FRAC_PI_3), 0.0);
    }

    #[test]
    fn test_bounce_direction_per_edge() {
        // Center hits go straight back into the playfield
        for edge in [PaddleEdge::Top, PaddleEdge::Bottom, PaddleEdge::Left, PaddleEdge::Right] {
            assert!(approx(edge.bounce_direction(0.0), edge.outward_normal()));
        }
        // Right-side hit on the bottom paddle goes up and to the right
        let dir = PaddleEdge::Bottom.bounce_direction(FRAC_PI_3);
        assert!(dir.x > 0.0 && dir.y < 0.0);
        // Lower hit on the left paddle goes right and down
        let dir = concave_bounce_direction(1.0, FRAC_PI_3, PaddleEdge::Left);
        assert!(dir.x > 0.0 && dir.y > 0.0);
    }

    #[test]
    fn test_impact_offset() {
        let half = Vec2::new(50.0, 10.0);
        let paddle = Vec2::new(400.0, 580.0);
        assert_eq!(PaddleEdge::Bottom.impact_offset(Vec2::new(425.0, 570.0), paddle, half), 0.5);
        assert_eq!(PaddleEdge::Bottom.impact_offset(Vec2::new(300.0, 570.0), paddle, half), -1.0);

        let side = Vec2::new(20.0, 300.0);
        let half = Vec2::new(10.0, 50.0);
        assert_eq!(PaddleEdge::Left.impact_offset(Vec2::new(30.0, 275.0), side, half), -0.5);
    }

    #[test]
    fn test_brick_impact_normal_faces() {
        let brick = Vec2::new(100.0, 100.0);
        // Below the brick
        assert_eq!(
            brick_impact_normal(Vec2::new(105.0, 115.0), brick, 30.0, 10.0),
            Vec2::new(0.0, 1.0)
        );
        // Left of the brick
        assert_eq!(
            brick_impact_normal(Vec2::new(65.0, 102.0), brick, 30.0, 10.0),
            Vec2::new(-1.0, 0.0)
        );
        // Above the brick
        assert_eq!(
            brick_impact_normal(Vec2::new(90.0, 88.0), brick, 30.0, 10.0),
            Vec2::new(0.0, -1.0)
        );
    }

    proptest! {
        #[test]
        fn prop_reflection_law(
            vx in -50.0f32..50.0,
            vy in -50.0f32..50.0,
            angle in 0.0f32..TAU,
        ) {
            let v = Vec2::new(vx, vy);
            let n = direction_from_angle(angle);
            let reflected = reflect(v, n);
            let approach = v.dot(n);
            if approach < 0.0 {
                prop_assert!((reflected.dot(n) + approach).abs() < 1e-3);
                prop_assert!((reflected.length() - v.length()).abs() < 1e-3);
            } else {
                prop_assert_eq!(reflected, v);
            }
        }

        #[test]
        fn prop_clamp_speed_in_range_and_idempotent(
            vx in -100.0f32..100.0,
            vy in -100.0f32..100.0,
            min in 1.0f32..10.0,
            extra in 0.0f32..20.0,
        ) {
            let v = Vec2::new(vx, vy);
            prop_assume!(v.length() > 1e-3);
            let max = min + extra;
            let once = clamp_speed(v, min, max, 1.0).unwrap();
            let twice = clamp_speed(once, min, max, 1.0).unwrap();
            prop_assert!(once.length() >= min - 1e-3 && once.length() <= max + 1e-3);
            prop_assert!((once - twice).length() < 1e-3);
            // Direction preserved
            prop_assert!(once.normalize().dot(v.normalize()) > 0.999);
        }
    }
}
