/// Integer grid coordinates.
///
/// Authoritative positions are always `Point`s. `FPoint` only exists as
/// interpolation output for drawing a frame between two grid states.

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Debug, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    #[inline]
    pub fn scale(self, k: i32) -> Self {
        Point { x: self.x * k, y: self.y * k }
    }

    /// The cell directly below (y grows downward).
    #[inline]
    pub fn below(self) -> Self {
        self + Point::new(0, 1)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, o: Point) -> Point {
        Point { x: self.x + o.x, y: self.y + o.y }
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, o: Point) -> Point {
        Point { x: self.x - o.x, y: self.y - o.y }
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point { x: -self.x, y: -self.y }
    }
}

// ── "x,y" keys (layer saves, level directives) ──

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid point key {0:?}, expected \"x,y\"")]
pub struct PointParseError(pub String);

impl FromStr for Point {
    type Err = PointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || PointParseError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(bad)?;
        let x = x.trim().parse().map_err(|_| bad())?;
        let y = y.trim().parse().map_err(|_| bad())?;
        Ok(Point { x, y })
    }
}

// ── Rectangles ──

/// Axis-aligned cell rectangle: `origin` is the top-left cell, `size` the
/// extent in cells.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Point,
}

impl Rect {
    pub const fn new(origin: Point, size: Point) -> Self {
        Rect { origin, size }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.origin.x && p.x < self.origin.x + self.size.x
            && p.y >= self.origin.y && p.y < self.origin.y + self.size.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.origin.x < other.origin.x + other.size.x
            && other.origin.x < self.origin.x + self.size.x
            && self.origin.y < other.origin.y + other.size.y
            && other.origin.y < self.origin.y + self.size.y
    }
}

// ── Fractional points (interpolation only) ──

#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct FPoint {
    pub x: f32,
    pub y: f32,
}

impl FPoint {
    /// `a*(1-t) + b*t`, componentwise.
    pub fn lerp(a: Point, b: Point, t: f32) -> Self {
        FPoint {
            x: a.x as f32 * (1.0 - t) + b.x as f32 * t,
            y: a.y as f32 * (1.0 - t) + b.y as f32 * t,
        }
    }
}

impl From<Point> for FPoint {
    fn from(p: Point) -> Self {
        FPoint { x: p.x as f32, y: p.y as f32 }
    }
}
