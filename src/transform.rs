//! Geometry primitives: points, rects, local transforms and world matrices.
//!
//! A [`Transform`] is the decomposed local transform a scene node carries
//! (translate, scale, rotation). A [`Matrix`] is the composed 2×3 affine
//! used for world-space propagation and hit-testing.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use serde::{Deserialize, Serialize};

/// A point in local, world or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest rect covering every point, or `None` for an empty iterator.
    #[must_use]
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Whether `p` lies inside the rect (edges inclusive).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Smallest rect covering both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

/// Decomposed local transform: scale, then rotate, then translate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in radians.
    #[serde(default)]
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale_x: 1.0, scale_y: 1.0, rotation: 0.0 }
    }
}

impl Transform {
    /// Translate + scale transform without rotation.
    #[must_use]
    pub fn new(x: f64, y: f64, scale_x: f64, scale_y: f64) -> Self {
        Self { x, y, scale_x, scale_y, rotation: 0.0 }
    }

    /// Map a point through this transform (rotation ignored when zero).
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Matrix::from_transform(self).apply(p)
    }

    /// Map a rect through a rotation-free transform.
    #[must_use]
    pub fn apply_rect(&self, r: &Rect) -> Rect {
        let a = self.apply(Point::new(r.x, r.y));
        let b = self.apply(Point::new(r.x + r.width, r.y + r.height));
        Rect::from_points(&[a, b]).unwrap_or_default()
    }
}

/// Raw (source → local) and roam (interactive) transforms of a drawing group.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransformInfo {
    pub raw: Transform,
    pub roam: Transform,
}

/// 2×3 affine matrix `[a, b, c, d, e, f]`:
/// `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    #[must_use]
    pub fn from_transform(t: &Transform) -> Self {
        let (sin, cos) = t.rotation.sin_cos();
        Self {
            a: t.scale_x * cos,
            b: t.scale_x * sin,
            c: -t.scale_y * sin,
            d: t.scale_y * cos,
            e: t.x,
            f: t.y,
        }
    }

    /// `self × other`: apply `other` first, then `self`.
    #[must_use]
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.c * p.y + self.e, self.b * p.x + self.d * p.y + self.f)
    }

    /// Inverse matrix, or `None` when singular.
    #[must_use]
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Matrix {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Scale factors encoded in the matrix.
    #[must_use]
    pub fn scale(&self) -> (f64, f64) {
        (self.a.hypot(self.b), self.c.hypot(self.d))
    }

    /// Decompose into a skew-free [`Transform`].
    #[must_use]
    pub fn decompose(&self) -> Transform {
        let scale_x = self.a.hypot(self.b);
        let rotation = self.b.atan2(self.a);
        let scale_y = if scale_x == 0.0 { self.c.hypot(self.d) } else { (self.a * self.d - self.b * self.c) / scale_x };
        Transform { x: self.e, y: self.f, scale_x, scale_y, rotation }
    }
}
