//! Collision category registry
//!
//! Every body carries one category bit and a mask of categories it may
//! touch. The physics engine only reports a pair when each side's category
//! is in the other side's mask. The registry is built once at scene setup
//! and shared by reference afterwards; it has no mutating methods.

use bitflags::bitflags;

bitflags! {
    /// One bit per collision kind
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Category: u16 {
        const DEFAULT  = 1 << 0;
        const BALL     = 1 << 1;
        const PADDLE   = 1 << 2;
        const BRICK    = 1 << 3;
        const WALL     = 1 << 4;
        const POWER_UP = 1 << 5;
        const LASER    = 1 << 6;
        const SHIELD   = 1 << 7;
    }
}

/// The predefined collision kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    Default,
    Ball,
    Paddle,
    Brick,
    Wall,
    PowerUp,
    Laser,
    Shield,
}

impl CollisionKind {
    pub const ALL: [CollisionKind; 8] = [
        CollisionKind::Default,
        CollisionKind::Ball,
        CollisionKind::Paddle,
        CollisionKind::Brick,
        CollisionKind::Wall,
        CollisionKind::PowerUp,
        CollisionKind::Laser,
        CollisionKind::Shield,
    ];

    /// The category bit assigned to this kind
    pub const fn category(self) -> Category {
        match self {
            CollisionKind::Default => Category::DEFAULT,
            CollisionKind::Ball => Category::BALL,
            CollisionKind::Paddle => Category::PADDLE,
            CollisionKind::Brick => Category::BRICK,
            CollisionKind::Wall => Category::WALL,
            CollisionKind::PowerUp => Category::POWER_UP,
            CollisionKind::Laser => Category::LASER,
            CollisionKind::Shield => Category::SHIELD,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// A category/mask pair as handed to the physics engine.
///
/// Only the registry can build one, so a body's filter always matches the
/// table it was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    category: Category,
    mask: Category,
}

impl CollisionFilter {
    #[inline]
    pub fn category(&self) -> Category {
        self.category
    }

    #[inline]
    pub fn mask(&self) -> Category {
        self.mask
    }

    /// Engine-level broad-phase test: both sides must accept each other
    pub fn interacts_with(&self, other: &CollisionFilter) -> bool {
        self.category.intersects(other.mask) && other.category.intersects(self.mask)
    }
}

/// Per-kind permitted masks
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    permitted: [Category; 8],
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryRegistry {
    /// Standard brick-breaker table
    pub fn new() -> Self {
        let mut permitted = [Category::empty(); 8];
        permitted[CollisionKind::Default.index()] =
            Category::DEFAULT | Category::BALL | Category::PADDLE | Category::WALL;
        permitted[CollisionKind::Ball.index()] = Category::DEFAULT
            | Category::PADDLE
            | Category::BRICK
            | Category::WALL
            | Category::SHIELD;
        permitted[CollisionKind::Paddle.index()] =
            Category::DEFAULT | Category::BALL | Category::WALL | Category::POWER_UP;
        permitted[CollisionKind::Brick.index()] = Category::BALL | Category::LASER;
        permitted[CollisionKind::Wall.index()] =
            Category::BALL | Category::PADDLE | Category::DEFAULT | Category::POWER_UP;
        permitted[CollisionKind::PowerUp.index()] = Category::PADDLE | Category::WALL;
        permitted[CollisionKind::Laser.index()] = Category::BRICK;
        permitted[CollisionKind::Shield.index()] = Category::BALL;
        Self { permitted }
    }

    /// Replace one kind's permitted mask. Setup only: consumes the registry
    /// so it cannot be called once the registry is shared.
    pub fn with_permitted(mut self, kind: CollisionKind, mask: Category) -> Self {
        self.permitted[kind.index()] = mask;
        self
    }

    /// Category bit for a kind
    #[inline]
    pub fn category(&self, kind: CollisionKind) -> Category {
        kind.category()
    }

    /// Categories a kind may physically collide with
    #[inline]
    pub fn permitted_mask(&self, kind: CollisionKind) -> Category {
        self.permitted[kind.index()]
    }

    /// Filter for a newly created body of this kind
    pub fn filter(&self, kind: CollisionKind) -> CollisionFilter {
        CollisionFilter {
            category: kind.category(),
            mask: self.permitted_mask(kind),
        }
    }

    /// Widen an existing filter's mask. The category bit never changes.
    pub fn extend(&self, filter: CollisionFilter, extra: Category) -> CollisionFilter {
        CollisionFilter {
            category: filter.category,
            mask: filter.mask | extra,
        }
    }

    /// Whether two kinds are allowed to collide under this table
    pub fn should_collide(&self, a: CollisionKind, b: CollisionKind) -> bool {
        self.filter(a).interacts_with(&self.filter(b))
    }
}

/// Does the category pair `(a, b)` match the kind pair `{x, y}` in either order?
pub fn check_pair(a: Category, b: Category, x: Category, y: Category) -> bool {
    (a.intersects(x) && b.intersects(y)) || (a.intersects(y) && b.intersects(x))
}
