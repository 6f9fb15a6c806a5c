//! Collision simulation module
//!
//! Everything that reacts to physics contacts lives here. This module must
//! stay deterministic:
//! - Pairs are processed in the order the engine reports them
//! - Seeded RNG only
//! - Timers advance on an explicit clock
//! - No rendering or platform dependencies

pub mod body;
pub mod category;
pub mod dispatch;
pub mod handlers;
pub mod hooks;
pub mod response;
pub mod scheduler;
pub mod state;
pub mod watchdog;

pub use body::{BodyDesc, BodyId, BodyKind, BodySet, BodyView, PhysicsWorld, RawBody, RawPair, adapt};
pub use category::{Category, CategoryRegistry, CollisionFilter, CollisionKind, check_pair};
pub use dispatch::{Dispatcher, Stage, TickReport};
pub use handlers::{Handler, HandlerContext, damage_brick};
pub use hooks::{
    BuiltinPowerUps, Collaborators, EffectCall, EffectSink, EventBus, GameEvent, PaddleModifier,
    PowerUpEffect, PowerUpEffects, Recorder, Recording, RecoveryReason, ScoreSink, SoundEffect,
    SoundSink,
};
pub use response::{
    BounceModel, PaddleEdge, brick_impact_normal, clamp_speed, concave_bounce_angle,
    paddle_bounce_angle, reflect,
};
pub use scheduler::{ScheduledAction, ScheduledTask, Scheduler, TaskHandle};
pub use state::{
    Ball, Brick, BrickKind, EntityId, Laser, Paddle, Playfield, PowerUp, PowerUpKind, Scene, Wall,
};
