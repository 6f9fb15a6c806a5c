//! Physics bodies and the pair adapter
//!
//! The physics engine owns bodies; this module describes the view the
//! collision core needs of them. A body's [`BodyKind`] is derived once from
//! its label when the body is created, and every handler predicate works on
//! that kind rather than re-reading label strings.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::category::{Category, CategoryRegistry, CollisionFilter, CollisionKind};
use super::state::EntityId;
use crate::error::CollisionError;

/// Physics engine body handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// What a body represents, classified once from its label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Ball,
    Paddle,
    Brick,
    Wall,
    /// Reinforced wall variant; shares the wall category
    VaultWall,
    PowerUp,
    Laser,
    Shield,
    /// Unrecognized label. Collides as `Default`, matches no handler.
    Unknown,
}

impl BodyKind {
    /// Classify a label such as `"ball"`, `"wall_top"` or `"leftVaultWall"`
    pub fn from_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        // Order matters: "leftVaultWall" is a vault, not a plain wall
        if label.contains("vault") {
            BodyKind::VaultWall
        } else if label.contains("ball") {
            BodyKind::Ball
        } else if label.contains("paddle") {
            BodyKind::Paddle
        } else if label.contains("brick") {
            BodyKind::Brick
        } else if label.contains("powerup") || label.contains("power_up") {
            BodyKind::PowerUp
        } else if label.contains("laser") {
            BodyKind::Laser
        } else if label.contains("shield") {
            BodyKind::Shield
        } else if label.contains("wall") {
            BodyKind::Wall
        } else {
            BodyKind::Unknown
        }
    }

    /// Registry kind used for the category bit and mask
    pub fn collision_kind(self) -> CollisionKind {
        match self {
            BodyKind::Ball => CollisionKind::Ball,
            BodyKind::Paddle => CollisionKind::Paddle,
            BodyKind::Brick => CollisionKind::Brick,
            BodyKind::Wall | BodyKind::VaultWall => CollisionKind::Wall,
            BodyKind::PowerUp => CollisionKind::PowerUp,
            BodyKind::Laser => CollisionKind::Laser,
            BodyKind::Shield => CollisionKind::Shield,
            BodyKind::Unknown => CollisionKind::Default,
        }
    }
}

/// A body as stored by the physics engine
#[derive(Debug, Clone)]
pub struct RawBody {
    id: BodyId,
    label: String,
    kind: BodyKind,
    filter: CollisionFilter,
    owner: Option<EntityId>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_static: bool,
}

impl RawBody {
    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn category(&self) -> Category {
        self.filter.category()
    }

    pub fn mask(&self) -> Category {
        self.filter.mask()
    }

    pub fn filter(&self) -> CollisionFilter {
        self.filter
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }
}

/// Builder for a new body
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub label: String,
    pub owner: Option<EntityId>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub is_static: bool,
}

impl BodyDesc {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            owner: None,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            is_static: false,
        }
    }

    pub fn owner(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn moving(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// The engine-side operations the collision core relies on
pub trait PhysicsWorld {
    /// Look up a live body
    fn body(&self, id: BodyId) -> Option<&RawBody>;

    /// Create a body; its category and mask come from the registry
    fn add_body(&mut self, registry: &CategoryRegistry, desc: BodyDesc) -> BodyId;

    /// Destroy a body, returning it if it existed
    fn remove_body(&mut self, id: BodyId) -> Option<RawBody>;

    fn set_velocity(&mut self, id: BodyId, velocity: Vec2) -> Result<(), CollisionError>;

    fn set_position(&mut self, id: BodyId, position: Vec2) -> Result<(), CollisionError>;

    /// Replace a body's filter. The category bit must stay the same.
    fn set_collision_filter(
        &mut self,
        id: BodyId,
        filter: CollisionFilter,
    ) -> Result<(), CollisionError>;
}

/// Simple body store (sorted by id for deterministic iteration)
#[derive(Debug, Clone)]
pub struct BodySet {
    bodies: Vec<RawBody>,
    next_id: u32,
}

impl Default for BodySet {
    fn default() -> Self {
        Self::new()
    }
}

impl BodySet {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawBody> {
        self.bodies.iter()
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |b| b.id).ok()
    }

    fn body_mut(&mut self, id: BodyId) -> Result<&mut RawBody, CollisionError> {
        let index = self.index_of(id).ok_or(CollisionError::MissingBody(id))?;
        Ok(&mut self.bodies[index])
    }
}

impl PhysicsWorld for BodySet {
    fn body(&self, id: BodyId) -> Option<&RawBody> {
        self.index_of(id).map(|i| &self.bodies[i])
    }

    fn add_body(&mut self, registry: &CategoryRegistry, desc: BodyDesc) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;

        let kind = BodyKind::from_label(&desc.label);
        self.bodies.push(RawBody {
            id,
            label: desc.label,
            kind,
            filter: registry.filter(kind.collision_kind()),
            owner: desc.owner,
            position: desc.position,
            velocity: desc.velocity,
            is_static: desc.is_static,
        });
        id
    }

    fn remove_body(&mut self, id: BodyId) -> Option<RawBody> {
        self.index_of(id).map(|i| self.bodies.remove(i))
    }

    fn set_velocity(&mut self, id: BodyId, velocity: Vec2) -> Result<(), CollisionError> {
        self.body_mut(id)?.velocity = velocity;
        Ok(())
    }

    fn set_position(&mut self, id: BodyId, position: Vec2) -> Result<(), CollisionError> {
        self.body_mut(id)?.position = position;
        Ok(())
    }

    fn set_collision_filter(
        &mut self,
        id: BodyId,
        filter: CollisionFilter,
    ) -> Result<(), CollisionError> {
        let body = self.body_mut(id)?;
        if body.filter.category() != filter.category() {
            return Err(CollisionError::CategoryChange(id));
        }
        body.filter = filter;
        Ok(())
    }
}

/// A collision pair as reported by the physics engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPair {
    pub a: BodyId,
    pub b: BodyId,
}

impl RawPair {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        Self { a, b }
    }
}

/// Normalized, owned snapshot of one side of a pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    pub id: BodyId,
    pub kind: BodyKind,
    pub category: Category,
    pub mask: Category,
    pub owner: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
}

impl BodyView {
    fn from_raw(body: &RawBody) -> Option<Self> {
        Some(Self {
            id: body.id,
            kind: body.kind,
            category: body.category(),
            mask: body.mask(),
            owner: body.owner?,
            position: body.position,
            velocity: body.velocity,
        })
    }
}

/// Resolve a raw pair into body views.
///
/// Returns `None` when either body is gone (destroyed earlier this tick) or
/// has no owning entity (sensors and other engine-internal bodies). Views
/// are taken at call time so a pair sees changes made by earlier pairs.
pub fn adapt(world: &dyn PhysicsWorld, pair: RawPair) -> Option<(BodyView, BodyView)> {
    let a = BodyView::from_raw(world.body(pair.a)?)?;
    let b = BodyView::from_raw(world.body(pair.b)?)?;
    Some((a, b))
}

/// Order two views so the first has kind `x`, if the pair is `{x, y}`
pub fn match_kinds(
    a: BodyView,
    b: BodyView,
    x: BodyKind,
    y: BodyKind,
) -> Option<(BodyView, BodyView)> {
    if a.kind == x && b.kind == y {
        Some((a, b))
    } else if a.kind == y && b.kind == x {
        Some((b, a))
    } else {
        None
    }
}
