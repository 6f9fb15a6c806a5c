//! Collision tuning
//!
//! Data-driven balance for the collision core. Loaded from JSON; any field
//! left out falls back to the defaults in [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TuningError;

/// Collision balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Playfield ===
    pub playfield_width: f32,
    pub playfield_height: f32,

    // === Ball ===
    pub ball_min_speed: f32,
    pub ball_max_speed: f32,
    pub ball_base_speed: f32,
    pub restitution: f32,

    // === Paddle ===
    /// Maximum bounce deflection in degrees
    pub paddle_max_angle_deg: f32,
    pub paddle_speed_multiplier: f32,

    // === Bricks / power-ups ===
    pub power_up_drop_chance: f64,
    pub power_up_duration_ms: u64,
    pub brick_flash_ms: u64,

    // === Watchdog ===
    pub watchdog_margin: f32,
    pub stall_threshold: f32,
    pub recovery_speed: f32,
    pub recovery_jitter: f32,

    /// Seed for the scene RNG
    pub seed: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            playfield_width: PLAYFIELD_WIDTH,
            playfield_height: PLAYFIELD_HEIGHT,

            ball_min_speed: BALL_MIN_SPEED,
            ball_max_speed: BALL_MAX_SPEED,
            ball_base_speed: BALL_BASE_SPEED,
            restitution: BALL_RESTITUTION,

            paddle_max_angle_deg: PADDLE_MAX_ANGLE_DEG,
            paddle_speed_multiplier: PADDLE_SPEED_MULTIPLIER,

            power_up_drop_chance: POWER_UP_DROP_CHANCE,
            power_up_duration_ms: POWER_UP_DURATION_MS,
            brick_flash_ms: BRICK_FLASH_MS,

            watchdog_margin: WATCHDOG_MARGIN,
            stall_threshold: STALL_THRESHOLD,
            recovery_speed: RECOVERY_SPEED,
            recovery_jitter: RECOVERY_JITTER,

            seed: 0x5eed,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded collision tuning (seed {})", tuning.seed);
        Ok(tuning)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the collision core cannot work with
    pub fn validate(&self) -> Result<(), TuningError> {
        let floats = [
            ("playfield_width", self.playfield_width),
            ("playfield_height", self.playfield_height),
            ("ball_min_speed", self.ball_min_speed),
            ("ball_max_speed", self.ball_max_speed),
            ("ball_base_speed", self.ball_base_speed),
            ("restitution", self.restitution),
            ("paddle_max_angle_deg", self.paddle_max_angle_deg),
            ("paddle_speed_multiplier", self.paddle_speed_multiplier),
            ("watchdog_margin", self.watchdog_margin),
            ("stall_threshold", self.stall_threshold),
            ("recovery_speed", self.recovery_speed),
            ("recovery_jitter", self.recovery_jitter),
        ];
        if let Some((name, value)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TuningError::Invalid(format!("{name} is not finite: {value}")));
        }

        if self.playfield_width <= 0.0 || self.playfield_height <= 0.0 {
            return Err(TuningError::Invalid("playfield must have positive size".into()));
        }
        if self.ball_min_speed <= 0.0 || self.ball_min_speed > self.ball_max_speed {
            return Err(TuningError::Invalid(format!(
                "ball speed range {}..{} is empty",
                self.ball_min_speed, self.ball_max_speed
            )));
        }
        if self.ball_base_speed <= 0.0 {
            return Err(TuningError::Invalid("ball base speed must be positive".into()));
        }
        if self.restitution <= 0.0 {
            return Err(TuningError::Invalid("restitution must be positive".into()));
        }
        if self.paddle_speed_multiplier <= 0.0 {
            return Err(TuningError::Invalid("paddle speed multiplier must be positive".into()));
        }
        if self.paddle_max_angle_deg <= 0.0 || self.paddle_max_angle_deg >= 90.0 {
            return Err(TuningError::Invalid(format!(
                "paddle max angle {} outside (0, 90)",
                self.paddle_max_angle_deg
            )));
        }
        if !(0.0..=1.0).contains(&self.power_up_drop_chance) {
            return Err(TuningError::Invalid(format!(
                "drop chance {} outside [0, 1]",
                self.power_up_drop_chance
            )));
        }
        if self.recovery_speed <= 0.0 {
            return Err(TuningError::Invalid("recovery speed must be positive".into()));
        }
        if self.recovery_jitter < 0.0 || self.stall_threshold < 0.0 || self.watchdog_margin < 0.0 {
            return Err(TuningError::Invalid("watchdog values must not be negative".into()));
        }
        Ok(())
    }

    /// Paddle max deflection in radians
    #[inline]
    pub fn paddle_max_angle(&self) -> f32 {
        self.paddle_max_angle_deg.to_radians()
    }
}
