//! Quad Breaker - collision core for a four-sided brick breaker
//!
//! Core modules:
//! - `sim`: Collision categories, body adaptation, bounce physics, handlers,
//!   dispatch and the ball watchdog
//! - `tuning`: Data-driven collision balance
//! - `error`: Error taxonomy for handler failures and bad tuning

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{CollisionError, TuningError};
pub use tuning::Tuning;

/// Collision configuration constants
pub mod consts {
    /// Default playfield dimensions
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;

    /// Ball speed bounds after a brick bounce
    pub const BALL_MIN_SPEED: f32 = 5.0;
    pub const BALL_MAX_SPEED: f32 = 15.0;
    /// Nominal ball speed used for paddle bounces
    pub const BALL_BASE_SPEED: f32 = 10.0;
    pub const BALL_RESTITUTION: f32 = 1.0;

    /// Paddle bounce: maximum deflection from the paddle's outward normal
    pub const PADDLE_MAX_ANGLE_DEG: f32 = 60.0;
    pub const PADDLE_SPEED_MULTIPLIER: f32 = 1.0;
    /// Exponent of the concave paddle curve
    pub const CONCAVE_EXPONENT: f32 = 1.5;

    /// Chance a destroyed brick drops a power-up
    pub const POWER_UP_DROP_CHANCE: f64 = 0.2;
    /// Default power-up duration (ms)
    pub const POWER_UP_DURATION_MS: u64 = 10_000;
    /// Brick hit flash duration (ms)
    pub const BRICK_FLASH_MS: u64 = 100;

    /// Watchdog: how far past the playfield a ball may drift before recovery
    pub const WATCHDOG_MARGIN: f32 = 50.0;
    /// Watchdog: per-axis speed below which a ball counts as stalled
    pub const STALL_THRESHOLD: f32 = 0.1;
    /// Watchdog: speed assigned on recovery
    pub const RECOVERY_SPEED: f32 = 5.0;
    /// Watchdog: horizontal jitter range for out-of-bounds respawn
    pub const RECOVERY_JITTER: f32 = 2.0;
}
