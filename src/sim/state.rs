//! Game entities and the scene that owns them
//!
//! Entities hold domain state (health, hit counters, paddle flags); their
//! physical side lives in the physics world and is linked by `BodyId`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{BodyDesc, BodyId, BodyKind, PhysicsWorld};
use super::category::CategoryRegistry;
use super::response::{BounceModel, PaddleEdge};
use super::scheduler::{Scheduler, TaskHandle};
use crate::error::TuningError;
use crate::tuning::Tuning;

/// Game entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: EntityId,
    pub body: Option<BodyId>,
    /// Consecutive brick/paddle hits since the last wall touch
    pub hits: u32,
    /// Nominal speed used when leaving a paddle
    pub speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub restitution: f32,
    pub visible: bool,
    pub active: bool,
}

impl Ball {
    pub fn new(id: EntityId, tuning: &Tuning) -> Self {
        Self {
            id,
            body: None,
            hits: 0,
            speed: tuning.ball_base_speed,
            min_speed: tuning.ball_min_speed,
            max_speed: tuning.ball_max_speed,
            restitution: tuning.restitution,
            visible: true,
            active: true,
        }
    }

    pub fn register_hit(&mut self) {
        self.hits = self.hits.saturating_add(1);
    }

    pub fn reset_hits(&mut self) {
        self.hits = 0;
    }
}

/// Brick types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrickKind {
    #[default]
    Standard,
    Reinforced,
    Armored,
    Gold,
}

impl BrickKind {
    pub fn default_health(self) -> u32 {
        match self {
            BrickKind::Standard => 1,
            BrickKind::Reinforced => 2,
            BrickKind::Armored => 3,
            BrickKind::Gold => 5,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            BrickKind::Standard => 10,
            BrickKind::Reinforced => 25,
            BrickKind::Armored => 50,
            BrickKind::Gold => 150,
        }
    }

    /// Base color (0xRRGGBB)
    pub fn color(self) -> u32 {
        match self {
            BrickKind::Standard => 0x3fa7ff,
            BrickKind::Reinforced => 0x4cd964,
            BrickKind::Armored => 0x9b9b9b,
            BrickKind::Gold => 0xffcc00,
        }
    }
}

/// A brick entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: EntityId,
    pub body: Option<BodyId>,
    pub kind: BrickKind,
    pub health: u32,
    max_health: u32,
    pub point_value: u32,
    pub half_size: Vec2,
    /// Showing hit flash until the scheduled reset
    pub flashing: bool,
    #[serde(skip)]
    pub flash_task: Option<TaskHandle>,
}

impl Brick {
    pub fn new(id: EntityId, kind: BrickKind, half_size: Vec2) -> Self {
        let health = kind.default_health();
        Self {
            id,
            body: None,
            kind,
            health,
            max_health: health,
            point_value: kind.points(),
            half_size,
            flashing: false,
            flash_task: None,
        }
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Fraction of health lost (for damage visuals)
    pub fn damage_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 1.0;
        }
        1.0 - self.health as f32 / self.max_health as f32
    }

    pub fn color(&self) -> u32 {
        self.kind.color()
    }
}

/// A paddle guarding one edge of the playfield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub id: EntityId,
    pub body: Option<BodyId>,
    pub edge: PaddleEdge,
    pub model: BounceModel,
    /// Display size
    pub width: f32,
    pub height: f32,
    /// Size before power-up modifiers
    pub base_width: f32,
    /// Balls bounced off this paddle
    pub hits: u32,
    pub sticky: bool,
    pub laser: bool,
    pub shielded: bool,
    /// Multiplier on ball speed when leaving this paddle
    pub ball_speed_scale: f32,
    /// Running power-up effects and their expiry tasks
    #[serde(skip)]
    pub active_effects: Vec<(PowerUpKind, TaskHandle)>,
}

impl Paddle {
    pub fn new(id: EntityId, edge: PaddleEdge, width: f32, height: f32) -> Self {
        Self {
            id,
            body: None,
            edge,
            model: BounceModel::Linear,
            width,
            height,
            base_width: width,
            hits: 0,
            sticky: false,
            laser: false,
            shielded: false,
            ball_speed_scale: 1.0,
            active_effects: Vec::new(),
        }
    }

    /// Half extents in world axes. `width` runs along the guarded edge.
    pub fn half_size(&self) -> Vec2 {
        match self.edge {
            PaddleEdge::Top | PaddleEdge::Bottom => Vec2::new(self.width, self.height) / 2.0,
            PaddleEdge::Left | PaddleEdge::Right => Vec2::new(self.height, self.width) / 2.0,
        }
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    Expand,
    Shrink,
    Sticky,
    Laser,
    Slow,
    Shield,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::Expand,
        PowerUpKind::Shrink,
        PowerUpKind::Sticky,
        PowerUpKind::Laser,
        PowerUpKind::Slow,
        PowerUpKind::Shield,
    ];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// A falling power-up capsule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: EntityId,
    pub body: Option<BodyId>,
    pub kind: PowerUpKind,
    pub duration_ms: u64,
}

/// A laser bolt fired from a paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Laser {
    pub id: EntityId,
    pub body: Option<BodyId>,
}

/// A playfield boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub id: EntityId,
    pub body: Option<BodyId>,
    /// Reinforced vault wall
    pub vault: bool,
}

/// Axis-aligned playfield bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub min: Vec2,
    pub max: Vec2,
}

impl Playfield {
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    /// True when `pos` lies more than `margin` outside the bounds on any side
    pub fn is_outside(&self, pos: Vec2, margin: f32) -> bool {
        pos.x < self.min.x - margin
            || pos.x > self.max.x + margin
            || pos.y < self.min.y - margin
            || pos.y > self.max.y + margin
    }
}

/// Everything the collision core mutates
#[derive(Debug, Clone)]
pub struct Scene {
    pub tuning: Tuning,
    pub registry: CategoryRegistry,
    pub playfield: Playfield,
    pub scheduler: Scheduler,
    /// Sorted by id for deterministic iteration
    pub balls: Vec<Ball>,
    pub bricks: Vec<Brick>,
    pub paddles: Vec<Paddle>,
    pub power_ups: Vec<PowerUp>,
    pub lasers: Vec<Laser>,
    pub walls: Vec<Wall>,
    rng: Pcg32,
    next_id: u32,
}

impl Scene {
    pub fn new(tuning: Tuning) -> Result<Self, TuningError> {
        Self::with_registry(tuning, CategoryRegistry::new())
    }

    /// Build a scene around a custom category table. The tuning is validated
    /// first; a scene never runs on values the handlers cannot use.
    pub fn with_registry(tuning: Tuning, registry: CategoryRegistry) -> Result<Self, TuningError> {
        tuning.validate()?;
        let playfield = Playfield {
            min: Vec2::ZERO,
            max: Vec2::new(tuning.playfield_width, tuning.playfield_height),
        };
        let rng = Pcg32::seed_from_u64(tuning.seed);
        log::info!(
            "Scene created: playfield {}x{}, seed {}",
            tuning.playfield_width,
            tuning.playfield_height,
            tuning.seed
        );
        Ok(Self {
            tuning,
            registry,
            playfield,
            scheduler: Scheduler::new(),
            balls: Vec::new(),
            bricks: Vec::new(),
            paddles: Vec::new(),
            power_ups: Vec::new(),
            lasers: Vec::new(),
            walls: Vec::new(),
            rng,
            next_id: 1,
        })
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Scene RNG (seeded from tuning)
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    // --- Spawning ---

    pub fn spawn_ball(
        &mut self,
        world: &mut dyn PhysicsWorld,
        position: Vec2,
        velocity: Vec2,
    ) -> EntityId {
        let id = self.next_entity_id();
        let mut ball = Ball::new(id, &self.tuning);
        let desc = BodyDesc::new("ball").owner(id).at(position).moving(velocity);
        ball.body = Some(world.add_body(&self.registry, desc));
        self.balls.push(ball);
        id
    }

    pub fn spawn_brick(
        &mut self,
        world: &mut dyn PhysicsWorld,
        kind: BrickKind,
        position: Vec2,
        half_size: Vec2,
    ) -> EntityId {
        let id = self.next_entity_id();
        let mut brick = Brick::new(id, kind, half_size);
        let desc = BodyDesc::new("brick").owner(id).at(position).fixed();
        brick.body = Some(world.add_body(&self.registry, desc));
        self.bricks.push(brick);
        id
    }

    pub fn spawn_paddle(
        &mut self,
        world: &mut dyn PhysicsWorld,
        edge: PaddleEdge,
        model: BounceModel,
        position: Vec2,
        width: f32,
        height: f32,
    ) -> EntityId {
        let id = self.next_entity_id();
        let mut paddle = Paddle::new(id, edge, width, height);
        paddle.model = model;
        let label = match edge {
            PaddleEdge::Top => "paddle_top",
            PaddleEdge::Bottom => "paddle_bottom",
            PaddleEdge::Left => "paddle_left",
            PaddleEdge::Right => "paddle_right",
        };
        let desc = BodyDesc::new(label).owner(id).at(position).fixed();
        paddle.body = Some(world.add_body(&self.registry, desc));
        self.paddles.push(paddle);
        id
    }

    /// Spawn a wall; labels containing "vault" become vault walls
    pub fn spawn_wall(
        &mut self,
        world: &mut dyn PhysicsWorld,
        label: &str,
        position: Vec2,
    ) -> EntityId {
        let id = self.next_entity_id();
        let desc = BodyDesc::new(label).owner(id).at(position).fixed();
        let body = world.add_body(&self.registry, desc);
        let vault = world
            .body(body)
            .is_some_and(|b| b.kind() == BodyKind::VaultWall);
        self.walls.push(Wall {
            id,
            body: Some(body),
            vault,
        });
        id
    }

    pub fn spawn_power_up(
        &mut self,
        world: &mut dyn PhysicsWorld,
        kind: PowerUpKind,
        position: Vec2,
    ) -> EntityId {
        let id = self.next_entity_id();
        let desc = BodyDesc::new("powerUp").owner(id).at(position);
        let body = world.add_body(&self.registry, desc);
        self.power_ups.push(PowerUp {
            id,
            body: Some(body),
            kind,
            duration_ms: self.tuning.power_up_duration_ms,
        });
        id
    }

    pub fn spawn_laser(
        &mut self,
        world: &mut dyn PhysicsWorld,
        position: Vec2,
        velocity: Vec2,
    ) -> EntityId {
        let id = self.next_entity_id();
        let desc = BodyDesc::new("laser").owner(id).at(position).moving(velocity);
        let body = world.add_body(&self.registry, desc);
        self.lasers.push(Laser {
            id,
            body: Some(body),
        });
        id
    }

    // --- Destruction ---

    pub fn destroy_brick(&mut self, world: &mut dyn PhysicsWorld, id: EntityId) {
        if let Some(index) = self.bricks.iter().position(|b| b.id == id) {
            let brick = self.bricks.remove(index);
            if let Some(task) = brick.flash_task {
                self.scheduler.cancel(task);
            }
            if let Some(body) = brick.body {
                world.remove_body(body);
            }
        }
    }

    pub fn destroy_power_up(&mut self, world: &mut dyn PhysicsWorld, id: EntityId) {
        if let Some(index) = self.power_ups.iter().position(|p| p.id == id) {
            if let Some(body) = self.power_ups.remove(index).body {
                world.remove_body(body);
            }
        }
    }

    pub fn destroy_laser(&mut self, world: &mut dyn PhysicsWorld, id: EntityId) {
        if let Some(index) = self.lasers.iter().position(|l| l.id == id) {
            if let Some(body) = self.lasers.remove(index).body {
                world.remove_body(body);
            }
        }
    }

    /// Remove a paddle and cancel its pending effect expiries
    pub fn destroy_paddle(&mut self, world: &mut dyn PhysicsWorld, id: EntityId) {
        if let Some(index) = self.paddles.iter().position(|p| p.id == id) {
            let paddle = self.paddles.remove(index);
            for (_, task) in &paddle.active_effects {
                self.scheduler.cancel(*task);
            }
            if let Some(body) = paddle.body {
                world.remove_body(body);
            }
        }
    }

    // --- Lookup ---

    pub fn ball(&self, id: EntityId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn ball_mut(&mut self, id: EntityId) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| b.id == id)
    }

    pub fn brick(&self, id: EntityId) -> Option<&Brick> {
        self.bricks.iter().find(|b| b.id == id)
    }

    pub fn brick_mut(&mut self, id: EntityId) -> Option<&mut Brick> {
        self.bricks.iter_mut().find(|b| b.id == id)
    }

    pub fn paddle(&self, id: EntityId) -> Option<&Paddle> {
        self.paddles.iter().find(|p| p.id == id)
    }

    pub fn paddle_mut(&mut self, id: EntityId) -> Option<&mut Paddle> {
        self.paddles.iter_mut().find(|p| p.id == id)
    }

    pub fn power_up(&self, id: EntityId) -> Option<&PowerUp> {
        self.power_ups.iter().find(|p| p.id == id)
    }

    pub fn wall(&self, id: EntityId) -> Option<&Wall> {
        self.walls.iter().find(|w| w.id == id)
    }

    pub fn laser(&self, id: EntityId) -> Option<&Laser> {
        self.lasers.iter().find(|l| l.id == id)
    }
}
