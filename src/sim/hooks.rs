//! Outbound interfaces to the rest of the game
//!
//! Scoring, particles, audio, power-up effects and the event bus are owned
//! elsewhere. The collision core only calls into them; it never reads
//! anything back from the event bus.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use super::response::PaddleEdge;
use super::state::{EntityId, PowerUpKind, Scene};
use crate::error::CollisionError;

/// Why the watchdog stepped in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryReason {
    OutOfBounds,
    Stalled,
}

/// Named collision outcomes
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    BallPaddleCollision {
        ball: EntityId,
        paddle: EntityId,
        edge: PaddleEdge,
    },
    BallBrickCollision {
        ball: EntityId,
        brick: EntityId,
    },
    BrickDamaged {
        brick: EntityId,
        health: u32,
    },
    BrickDestroyed {
        brick: EntityId,
        value: u32,
    },
    PowerUpSpawned {
        power_up: EntityId,
        kind: PowerUpKind,
    },
    PowerUpCollected {
        paddle: EntityId,
        kind: PowerUpKind,
        duration_ms: u64,
    },
    PowerUpExpired {
        paddle: EntityId,
        kind: PowerUpKind,
    },
    BallWallCollision {
        ball: EntityId,
        wall: EntityId,
    },
    BallVaultCollision {
        ball: EntityId,
        wall: EntityId,
    },
    LaserBrickCollision {
        laser: EntityId,
        brick: EntityId,
    },
    BallRecovered {
        ball: EntityId,
        reason: RecoveryReason,
    },
}

impl GameEvent {
    /// Event bus name
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::BallPaddleCollision { .. } => "ballPaddleCollision",
            GameEvent::BallBrickCollision { .. } => "ballBrickCollision",
            GameEvent::BrickDamaged { .. } => "brickDamaged",
            GameEvent::BrickDestroyed { .. } => "brickDestroyed",
            GameEvent::PowerUpSpawned { .. } => "powerUpSpawned",
            GameEvent::PowerUpCollected { .. } => "powerUpCollected",
            GameEvent::PowerUpExpired { .. } => "powerUpExpired",
            GameEvent::BallWallCollision { .. } => "ballWallCollision",
            GameEvent::BallVaultCollision { .. } => "ballVaultCollision",
            GameEvent::LaserBrickCollision { .. } => "laserBrickCollision",
            GameEvent::BallRecovered { .. } => "ballRecovered",
        }
    }
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Ball hits paddle
    PaddleHit,
    /// Ball hits brick (doesn't break)
    BrickHit,
    /// Brick breaks
    BrickBreak,
    /// Ball hits wall
    WallHit,
    /// Ball hits a vault wall
    VaultHit,
    /// Power-up collected
    PowerUp,
    /// Power-up wore off
    PowerDown,
    /// Laser bolt hits brick
    LaserHit,
}

impl SoundEffect {
    pub fn name(self) -> &'static str {
        match self {
            SoundEffect::PaddleHit => "paddle_hit",
            SoundEffect::BrickHit => "brick_hit",
            SoundEffect::BrickBreak => "brick_break",
            SoundEffect::WallHit => "wall_hit",
            SoundEffect::VaultHit => "vault_hit",
            SoundEffect::PowerUp => "power_up",
            SoundEffect::PowerDown => "power_down",
            SoundEffect::LaserHit => "laser_hit",
        }
    }
}

// Sinks report `CollisionError::Collaborator` when their backend is
// unavailable. The dispatcher logs it and treats the pair as unclaimed.

pub trait ScoreSink {
    fn add_score(&mut self, points: u32) -> Result<(), CollisionError>;
}

/// Particle / visual effects
pub trait EffectSink {
    fn brick_hit_effect(&mut self, position: Vec2, color: u32) -> Result<(), CollisionError>;
    fn brick_destroy_effect(&mut self, position: Vec2, color: u32) -> Result<(), CollisionError>;
    fn bounce_effect(&mut self, position: Vec2) -> Result<(), CollisionError>;
    fn power_up_effect(&mut self, position: Vec2, kind: PowerUpKind) -> Result<(), CollisionError>;
}

pub trait SoundSink {
    fn play_sound(&mut self, name: &str) -> Result<(), CollisionError>;
}

pub trait EventBus {
    fn emit(&mut self, event: &GameEvent) -> Result<(), CollisionError>;
}

/// One power-up's behavior
pub trait PowerUpEffect {
    fn apply(
        &self,
        scene: &mut Scene,
        paddle: EntityId,
        duration_ms: u64,
    ) -> Result<(), CollisionError>;

    /// Undo `apply`. Called only while the paddle is alive, after the
    /// expiring entry has left `Paddle::active_effects`.
    fn remove(&self, scene: &mut Scene, paddle: EntityId);
}

/// Lookup table from power-up kind to effect
pub trait PowerUpEffects {
    fn handler(&self, kind: PowerUpKind) -> Option<&dyn PowerUpEffect>;
}

/// All external collaborators, owned by the dispatcher
pub struct Collaborators {
    pub score: Box<dyn ScoreSink>,
    pub effects: Box<dyn EffectSink>,
    pub sound: Box<dyn SoundSink>,
    pub events: Box<dyn EventBus>,
    pub power_ups: Box<dyn PowerUpEffects>,
}

impl Collaborators {
    /// Route every sink to one recorder, with the built-in power-ups
    pub fn recording(recorder: &Recorder) -> Self {
        Self {
            score: Box::new(recorder.clone()),
            effects: Box::new(recorder.clone()),
            sound: Box::new(recorder.clone()),
            events: Box::new(recorder.clone()),
            power_ups: Box::new(BuiltinPowerUps::new()),
        }
    }

    pub(crate) fn emit(&mut self, event: GameEvent) -> Result<(), CollisionError> {
        log::debug!("emit {}: {:?}", event.name(), event);
        self.events.emit(&event)
    }

    pub(crate) fn play(&mut self, sound: SoundEffect) -> Result<(), CollisionError> {
        self.sound.play_sound(sound.name())
    }
}

/// Visual effect call, as captured by [`Recorder`]
#[derive(Debug, Clone, PartialEq)]
pub enum EffectCall {
    BrickHit { position: Vec2, color: u32 },
    BrickDestroy { position: Vec2, color: u32 },
    Bounce { position: Vec2 },
    PowerUp { position: Vec2, kind: PowerUpKind },
}

/// Everything a [`Recorder`] has seen
#[derive(Debug, Clone, Default)]
pub struct Recording {
    pub score: u64,
    pub events: Vec<GameEvent>,
    pub sounds: Vec<String>,
    pub effects: Vec<EffectCall>,
}

impl Recording {
    /// Count events with the given bus name
    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == name).count()
    }
}

/// In-memory collaborator that records every call
#[derive(Debug, Clone, Default)]
pub struct Recorder(Rc<RefCell<Recording>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of what has been recorded so far
    pub fn snapshot(&self) -> Recording {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        *self.0.borrow_mut() = Recording::default();
    }

    fn record(&self, call: EffectCall) -> Result<(), CollisionError> {
        self.0.borrow_mut().effects.push(call);
        Ok(())
    }
}

impl ScoreSink for Recorder {
    fn add_score(&mut self, points: u32) -> Result<(), CollisionError> {
        self.0.borrow_mut().score += u64::from(points);
        Ok(())
    }
}

impl EffectSink for Recorder {
    fn brick_hit_effect(&mut self, position: Vec2, color: u32) -> Result<(), CollisionError> {
        self.record(EffectCall::BrickHit { position, color })
    }

    fn brick_destroy_effect(&mut self, position: Vec2, color: u32) -> Result<(), CollisionError> {
        self.record(EffectCall::BrickDestroy { position, color })
    }

    fn bounce_effect(&mut self, position: Vec2) -> Result<(), CollisionError> {
        self.record(EffectCall::Bounce { position })
    }

    fn power_up_effect(&mut self, position: Vec2, kind: PowerUpKind) -> Result<(), CollisionError> {
        self.record(EffectCall::PowerUp { position, kind })
    }
}

impl SoundSink for Recorder {
    fn play_sound(&mut self, name: &str) -> Result<(), CollisionError> {
        self.0.borrow_mut().sounds.push(name.to_string());
        Ok(())
    }
}

impl EventBus for Recorder {
    fn emit(&mut self, event: &GameEvent) -> Result<(), CollisionError> {
        self.0.borrow_mut().events.push(event.clone());
        Ok(())
    }
}

/// Width multipliers for the size power-ups
const EXPAND_FACTOR: f32 = 1.5;
const SHRINK_FACTOR: f32 = 0.75;
/// Ball speed multiplier while Slow is active
const SLOW_FACTOR: f32 = 0.7;

/// Built-in paddle modifier for one power-up kind
#[derive(Debug, Clone, Copy)]
pub struct PaddleModifier(pub PowerUpKind);

impl PowerUpEffect for PaddleModifier {
    fn apply(
        &self,
        scene: &mut Scene,
        paddle: EntityId,
        _duration_ms: u64,
    ) -> Result<(), CollisionError> {
        let paddle = scene
            .paddle_mut(paddle)
            .ok_or(CollisionError::MissingEntity(paddle))?;
        match self.0 {
            PowerUpKind::Expand | PowerUpKind::Shrink => {
                paddle.width = paddle.base_width * size_factor(self.0).unwrap_or(1.0);
            }
            PowerUpKind::Sticky => paddle.sticky = true,
            PowerUpKind::Laser => paddle.laser = true,
            PowerUpKind::Slow => paddle.ball_speed_scale = SLOW_FACTOR,
            PowerUpKind::Shield => paddle.shielded = true,
        }
        Ok(())
    }

    /// Re-derive the affected attribute from the effects still running, so
    /// an expiring effect never undoes one that outlives it.
    fn remove(&self, scene: &mut Scene, paddle: EntityId) {
        let Some(paddle) = scene.paddle_mut(paddle) else {
            return;
        };
        let still_active = |kind: PowerUpKind| paddle.active_effects.iter().any(|(k, _)| *k == kind);
        match self.0 {
            PowerUpKind::Expand | PowerUpKind::Shrink => {
                // Most recently collected size effect wins
                let factor = paddle
                    .active_effects
                    .iter()
                    .rev()
                    .find_map(|(k, _)| size_factor(*k))
                    .unwrap_or(1.0);
                paddle.width = paddle.base_width * factor;
            }
            PowerUpKind::Sticky => paddle.sticky = still_active(PowerUpKind::Sticky),
            PowerUpKind::Laser => paddle.laser = still_active(PowerUpKind::Laser),
            PowerUpKind::Slow => {
                paddle.ball_speed_scale = if still_active(PowerUpKind::Slow) {
                    SLOW_FACTOR
                } else {
                    1.0
                };
            }
            PowerUpKind::Shield => paddle.shielded = still_active(PowerUpKind::Shield),
        }
    }
}

fn size_factor(kind: PowerUpKind) -> Option<f32> {
    match kind {
        PowerUpKind::Expand => Some(EXPAND_FACTOR),
        PowerUpKind::Shrink => Some(SHRINK_FACTOR),
        _ => None,
    }
}

/// Default effect table covering every [`PowerUpKind`]
#[derive(Debug, Clone)]
pub struct BuiltinPowerUps {
    modifiers: Vec<PaddleModifier>,
}

impl Default for BuiltinPowerUps {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinPowerUps {
    pub fn new() -> Self {
        Self {
            modifiers: PowerUpKind::ALL.iter().map(|&k| PaddleModifier(k)).collect(),
        }
    }

    /// Table with one kind left out
    pub fn without(kind: PowerUpKind) -> Self {
        let mut table = Self::new();
        table.modifiers.retain(|m| m.0 != kind);
        table
    }
}

impl PowerUpEffects for BuiltinPowerUps {
    fn handler(&self, kind: PowerUpKind) -> Option<&dyn PowerUpEffect> {
        self.modifiers
            .iter()
            .find(|m| m.0 == kind)
            .map(|m| m as &dyn PowerUpEffect)
    }
}
