//! Geometry value types for the arena.
//!
//! Every type here is a small `Copy` value: the physics step builds new
//! values each tick instead of mutating shared geometry.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// The two competing agents.
///
/// Red defends the left goal and scores on the right; blue is the mirror image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Red,
    Blue,
}

impl Side {
    /// Returns both sides in update order.
    pub fn all() -> [Side; 2] {
        [Side::Red, Side::Blue]
    }

    /// Returns the opposing side.
    pub fn opponent(&self) -> Side {
        match self {
            Side::Red => Side::Blue,
            Side::Blue => Side::Red,
        }
    }

    /// Lowercase name used for file names and log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Side::Red => "red",
            Side::Blue => "blue",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 2D vector in arena pixels (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    /// Vector with components `x` and `y`.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product.
    pub fn dot(&self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean norm.
    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Vec2) -> f64 {
        (other - *self).length()
    }

    /// Unit vector in the same direction, or zero for a (near) zero vector.
    pub fn normalized(&self) -> Vec2 {
        let len = self.length();
        if len < 1e-12 {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }

    /// Component-wise truncation toward zero.
    pub fn trunc(&self) -> Vec2 {
        Vec2::new(self.x.trunc(), self.y.trunc())
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Vec2,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Rectangle with top-left corner `(x, y)`.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Vec2::new(x, y),
            width,
            height,
        }
    }

    /// Smallest x.
    pub fn left(&self) -> f64 {
        self.origin.x
    }

    /// Largest x.
    pub fn right(&self) -> f64 {
        self.origin.x + self.width
    }

    /// Smallest y.
    pub fn top(&self) -> f64 {
        self.origin.y
    }

    /// Largest y.
    pub fn bottom(&self) -> f64 {
        self.origin.y + self.height
    }

    /// Midpoint of the rectangle.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.origin.x + self.width / 2.0,
            self.origin.y + self.height / 2.0,
        )
    }

    /// Returns the rectangle shifted by `delta`.
    pub fn translated(&self, delta: Vec2) -> Rect {
        Rect {
            origin: self.origin + delta,
            ..*self
        }
    }

    /// Returns the rectangle moved (not resized) so it lies inside `[0, w] × [0, h]`.
    pub fn clamped(&self, arena_width: f64, arena_height: f64) -> Rect {
        let x = self.origin.x.clamp(0.0, (arena_width - self.width).max(0.0));
        let y = self.origin.y.clamp(0.0, (arena_height - self.height).max(0.0));
        Rect {
            origin: Vec2::new(x, y),
            ..*self
        }
    }

    /// Closest point of the rectangle to `p`.
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.left(), self.right()),
            p.y.clamp(self.top(), self.bottom()),
        )
    }
}

/// The ball: a circle tracked through its bounding box, plus its velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub bounds: Rect,
    pub velocity: Vec2,
}

impl Ball {
    /// Creates a ball whose bounding box has its top-left corner at `(x, y)`.
    pub fn at(x: f64, y: f64, radius: f64) -> Self {
        Self {
            bounds: Rect::new(x, y, radius * 2.0, radius * 2.0),
            velocity: Vec2::ZERO,
        }
    }

    /// Radius in pixels.
    pub fn radius(&self) -> f64 {
        self.bounds.width / 2.0
    }

    /// Centre of the circle.
    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    /// Magnitude of the velocity.
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Circle-vs-box overlap; touching edges do not count.
    pub fn overlaps(&self, hitbox: &Rect) -> bool {
        let c = self.center();
        c.distance_to(hitbox.closest_point(c)) < self.radius()
    }
}
