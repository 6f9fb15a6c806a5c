//! Collision handlers
//!
//! One handler per kind pair, tried in [`Handler::PRIORITY`] order. A
//! handler claims a pair by returning `Ok(true)`; the first claim wins.
//! Handlers only respond to the `Start` stage.

use glam::Vec2;
use rand::Rng;

use super::body::{BodyKind, BodyView, PhysicsWorld, match_kinds};
use super::dispatch::Stage;
use super::hooks::{Collaborators, GameEvent, SoundEffect};
use super::response::{brick_impact_normal, clamp_speed, reflect};
use super::scheduler::ScheduledAction;
use super::state::{EntityId, PowerUpKind, Scene};
use crate::error::CollisionError;

/// Mutable state a handler works against
pub struct HandlerContext<'a> {
    pub scene: &'a mut Scene,
    pub world: &'a mut dyn PhysicsWorld,
    pub collab: &'a mut Collaborators,
}

/// The closed set of collision handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    BallPaddle,
    BallBrick,
    PaddlePowerUp,
    BallWall,
    LaserBrick,
}

impl Handler {
    /// Dispatch order
    pub const PRIORITY: [Handler; 5] = [
        Handler::BallPaddle,
        Handler::BallBrick,
        Handler::PaddlePowerUp,
        Handler::BallWall,
        Handler::LaserBrick,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Handler::BallPaddle => "ball-paddle",
            Handler::BallBrick => "ball-brick",
            Handler::PaddlePowerUp => "paddle-powerup",
            Handler::BallWall => "ball-wall",
            Handler::LaserBrick => "laser-brick",
        }
    }

    /// Try to claim and resolve a pair
    pub fn handle(
        self,
        ctx: &mut HandlerContext<'_>,
        a: BodyView,
        b: BodyView,
        stage: Stage,
    ) -> Result<bool, CollisionError> {
        if stage != Stage::Start {
            return Ok(false);
        }
        match self {
            Handler::BallPaddle => ball_paddle(ctx, a, b),
            Handler::BallBrick => ball_brick(ctx, a, b),
            Handler::PaddlePowerUp => paddle_power_up(ctx, a, b),
            Handler::BallWall => ball_wall(ctx, a, b),
            Handler::LaserBrick => laser_brick(ctx, a, b),
        }
    }
}

fn ball_paddle(
    ctx: &mut HandlerContext<'_>,
    a: BodyView,
    b: BodyView,
) -> Result<bool, CollisionError> {
    let Some((ball_view, paddle_view)) = match_kinds(a, b, BodyKind::Ball, BodyKind::Paddle)
    else {
        return Ok(false);
    };
    let (ball_id, paddle_id) = (ball_view.owner, paddle_view.owner);

    let max_angle = ctx.scene.tuning.paddle_max_angle();
    let multiplier = ctx.scene.tuning.paddle_speed_multiplier;

    let paddle = ctx
        .scene
        .paddle(paddle_id)
        .ok_or(CollisionError::MissingEntity(paddle_id))?;
    let edge = paddle.edge;
    let offset = edge.impact_offset(ball_view.position, paddle_view.position, paddle.half_size());
    let angle = paddle.model.angle(offset, max_angle);
    let speed_scale = paddle.ball_speed_scale;

    let ball = ctx
        .scene
        .ball(ball_id)
        .ok_or(CollisionError::MissingEntity(ball_id))?;
    let speed = ball.speed * multiplier * speed_scale;
    let velocity = clamp_speed(
        edge.bounce_direction(angle) * speed,
        ball.min_speed,
        ball.max_speed,
        1.0,
    )?;
    ctx.world.set_velocity(ball_view.id, velocity)?;

    if let Some(paddle) = ctx.scene.paddle_mut(paddle_id) {
        paddle.hits += 1;
    }
    if let Some(ball) = ctx.scene.ball_mut(ball_id) {
        ball.register_hit();
    }

    ctx.collab.effects.bounce_effect(ball_view.position)?;
    ctx.collab.play(SoundEffect::PaddleHit)?;
    ctx.collab.emit(GameEvent::BallPaddleCollision {
        ball: ball_id,
        paddle: paddle_id,
        edge,
    })?;
    Ok(true)
}

fn ball_brick(
    ctx: &mut HandlerContext<'_>,
    a: BodyView,
    b: BodyView,
) -> Result<bool, CollisionError> {
    let Some((ball_view, brick_view)) = match_kinds(a, b, BodyKind::Ball, BodyKind::Brick) else {
        return Ok(false);
    };
    let (ball_id, brick_id) = (ball_view.owner, brick_view.owner);

    let half = ctx
        .scene
        .brick(brick_id)
        .ok_or(CollisionError::MissingEntity(brick_id))?
        .half_size;
    let normal = brick_impact_normal(ball_view.position, brick_view.position, half.x, half.y);

    let ball = ctx
        .scene
        .ball(ball_id)
        .ok_or(CollisionError::MissingEntity(ball_id))?;
    let velocity = clamp_speed(
        reflect(ball_view.velocity, normal),
        ball.min_speed,
        ball.max_speed,
        ball.restitution,
    )?;

    // The ball only changes once the brick side went through
    damage_brick(ctx, brick_id, brick_view.position)?;

    ctx.world.set_velocity(ball_view.id, velocity)?;
    if let Some(ball) = ctx.scene.ball_mut(ball_id) {
        ball.register_hit();
    }

    ctx.collab.emit(GameEvent::BallBrickCollision {
        ball: ball_id,
        brick: brick_id,
    })?;
    Ok(true)
}

fn paddle_power_up(
    ctx: &mut HandlerContext<'_>,
    a: BodyView,
    b: BodyView,
) -> Result<bool, CollisionError> {
    let Some((paddle_view, power_up_view)) =
        match_kinds(a, b, BodyKind::Paddle, BodyKind::PowerUp)
    else {
        return Ok(false);
    };
    let (paddle_id, power_up_id) = (paddle_view.owner, power_up_view.owner);

    let power_up = ctx
        .scene
        .power_up(power_up_id)
        .ok_or(CollisionError::MissingEntity(power_up_id))?;
    let (kind, duration_ms) = (power_up.kind, power_up.duration_ms);

    let effect = ctx
        .collab
        .power_ups
        .handler(kind)
        .ok_or(CollisionError::UnknownPowerUp(kind))?;

    effect.apply(ctx.scene, paddle_id, duration_ms)?;

    let task = ctx.scene.scheduler.schedule(
        duration_ms,
        ScheduledAction::ExpirePowerUp {
            paddle: paddle_id,
            kind,
        },
    );
    let paddle = ctx
        .scene
        .paddle_mut(paddle_id)
        .ok_or(CollisionError::MissingEntity(paddle_id))?;
    // Collecting a kind that is already running restarts its timer
    let previous: Vec<_> = paddle
        .active_effects
        .iter()
        .filter(|(k, _)| *k == kind)
        .map(|(_, task)| *task)
        .collect();
    paddle.active_effects.retain(|(k, _)| *k != kind);
    paddle.active_effects.push((kind, task));
    for old in previous {
        ctx.scene.scheduler.cancel(old);
    }

    ctx.collab
        .effects
        .power_up_effect(power_up_view.position, kind)?;
    ctx.collab.play(SoundEffect::PowerUp)?;
    ctx.collab.emit(GameEvent::PowerUpCollected {
        paddle: paddle_id,
        kind,
        duration_ms,
    })?;

    ctx.scene.destroy_power_up(ctx.world, power_up_id);
    Ok(true)
}

fn ball_wall(
    ctx: &mut HandlerContext<'_>,
    a: BodyView,
    b: BodyView,
) -> Result<bool, CollisionError> {
    let (ball_view, wall_view, vault) =
        if let Some((ball, wall)) = match_kinds(a, b, BodyKind::Ball, BodyKind::Wall) {
            (ball, wall, false)
        } else if let Some((ball, wall)) = match_kinds(a, b, BodyKind::Ball, BodyKind::VaultWall) {
            (ball, wall, true)
        } else {
            return Ok(false);
        };
    let (ball_id, wall_id) = (ball_view.owner, wall_view.owner);

    ctx.scene
        .ball_mut(ball_id)
        .ok_or(CollisionError::MissingEntity(ball_id))?
        .reset_hits();

    if vault {
        ctx.collab.effects.bounce_effect(ball_view.position)?;
        ctx.collab.play(SoundEffect::VaultHit)?;
        ctx.collab.emit(GameEvent::BallVaultCollision {
            ball: ball_id,
            wall: wall_id,
        })?;
    } else {
        ctx.collab.play(SoundEffect::WallHit)?;
        ctx.collab.emit(GameEvent::BallWallCollision {
            ball: ball_id,
            wall: wall_id,
        })?;
    }
    Ok(true)
}

fn laser_brick(
    ctx: &mut HandlerContext<'_>,
    a: BodyView,
    b: BodyView,
) -> Result<bool, CollisionError> {
    let Some((laser_view, brick_view)) = match_kinds(a, b, BodyKind::Laser, BodyKind::Brick)
    else {
        return Ok(false);
    };
    let (laser_id, brick_id) = (laser_view.owner, brick_view.owner);

    damage_brick(ctx, brick_id, brick_view.position)?;
    ctx.scene.destroy_laser(ctx.world, laser_id);

    ctx.collab.play(SoundEffect::LaserHit)?;
    ctx.collab.emit(GameEvent::LaserBrickCollision {
        laser: laser_id,
        brick: brick_id,
    })?;
    Ok(true)
}

/// Apply one point of damage to a brick, whoever hit it
///
/// A surviving brick flashes and reports its remaining health. A brick at
/// zero awards its points, may drop a power-up, and is destroyed along with
/// its body.
pub fn damage_brick(
    ctx: &mut HandlerContext<'_>,
    brick_id: EntityId,
    position: Vec2,
) -> Result<(), CollisionError> {
    let flash_ms = ctx.scene.tuning.brick_flash_ms;
    let drop_chance = ctx.scene.tuning.power_up_drop_chance;

    let brick = ctx
        .scene
        .brick_mut(brick_id)
        .ok_or(CollisionError::MissingEntity(brick_id))?;
    brick.health = brick.health.saturating_sub(1);
    let (health, value, color) = (brick.health, brick.point_value, brick.color());

    if health > 0 {
        brick.flashing = true;
        let old_task = brick.flash_task.take();
        if let Some(task) = old_task {
            ctx.scene.scheduler.cancel(task);
        }
        let task = ctx
            .scene
            .scheduler
            .schedule(flash_ms, ScheduledAction::ClearBrickFlash { brick: brick_id });
        if let Some(brick) = ctx.scene.brick_mut(brick_id) {
            brick.flash_task = Some(task);
        }

        ctx.collab.effects.brick_hit_effect(position, color)?;
        ctx.collab.play(SoundEffect::BrickHit)?;
        ctx.collab.emit(GameEvent::BrickDamaged {
            brick: brick_id,
            health,
        })?;
        return Ok(());
    }

    ctx.collab.score.add_score(value)?;

    if ctx.scene.rng().random_bool(drop_chance) {
        let kind = PowerUpKind::random(ctx.scene.rng());
        let power_up = ctx.scene.spawn_power_up(ctx.world, kind, position);
        log::debug!("brick {:?} dropped {:?}", brick_id, kind);
        ctx.collab.emit(GameEvent::PowerUpSpawned { power_up, kind })?;
    }

    ctx.collab.effects.brick_destroy_effect(position, color)?;
    ctx.collab.play(SoundEffect::BrickBreak)?;
    ctx.collab.emit(GameEvent::BrickDestroyed {
        brick: brick_id,
        value,
    })?;

    ctx.scene.destroy_brick(ctx.world, brick_id);
    Ok(())
}
