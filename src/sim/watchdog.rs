//! Ball watchdog
//!
//! Safety net run on end-stage pairs: balls that escaped the playfield are
//! put back in the middle, balls that stopped moving get a fresh kick.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::body::PhysicsWorld;
use super::hooks::RecoveryReason;
use super::response::direction_from_angle;
use super::state::{EntityId, Scene};
use crate::error::CollisionError;

/// Check one ball and correct it if needed. Returns what was fixed.
pub fn check(
    scene: &mut Scene,
    world: &mut dyn PhysicsWorld,
    ball_id: EntityId,
) -> Result<Vec<RecoveryReason>, CollisionError> {
    let Some(body_id) = scene.ball(ball_id).and_then(|b| b.body) else {
        return Ok(Vec::new());
    };
    let body = world
        .body(body_id)
        .ok_or(CollisionError::MissingBody(body_id))?;
    let position = body.position;

    let margin = scene.tuning.watchdog_margin;
    let threshold = scene.tuning.stall_threshold;
    let speed = scene.tuning.recovery_speed;
    let jitter = scene.tuning.recovery_jitter;

    let mut recovered = Vec::new();

    if scene.playfield.is_outside(position, margin) {
        let center = scene.playfield.center();
        let dx = scene.rng().random_range(-jitter..=jitter);
        let velocity = Vec2::new(dx, -speed).normalize() * speed;
        world.set_position(body_id, center)?;
        world.set_velocity(body_id, velocity)?;
        log::info!(
            "Ball {:?} out of bounds at ({:.1}, {:.1}), respawned at center",
            ball_id,
            position.x,
            position.y
        );
        recovered.push(RecoveryReason::OutOfBounds);
    }

    let velocity = world
        .body(body_id)
        .ok_or(CollisionError::MissingBody(body_id))?
        .velocity;
    if velocity.x.abs() < threshold && velocity.y.abs() < threshold {
        let angle = scene.rng().random_range(0.0..TAU);
        world.set_velocity(body_id, direction_from_angle(angle) * speed)?;
        log::info!("Ball {:?} stalled, re-kicked", ball_id);
        recovered.push(RecoveryReason::Stalled);
    }

    if !recovered.is_empty() {
        // A recreated body can leave the entity hidden
        if let Some(ball) = scene.ball_mut(ball_id) {
            ball.visible = true;
            ball.active = true;
        }
    }

    Ok(recovered)
}
