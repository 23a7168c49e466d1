//! Geometry helpers shared by the shape generators.

use glam::{Mat4, Vec2};

use crate::error::{BatchError, BatchResult};

/// Lengths at or below this are treated as zero.
pub(super) const DEGENERATE_EPSILON: f32 = 0.0001;

// ── quad ──────────────────────────────────────────────────────────────────

pub(super) const QUAD_VERTEX_COUNT: usize = 4;

/// Two triangles over corners 0-1-2-3.
pub(super) const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Unit direction from `a` to `b`.
pub(super) fn direction(a: Vec2, b: Vec2) -> BatchResult<Vec2> {
    let d = b - a;
    let len = d.length();
    if !len.is_finite() || len <= DEGENERATE_EPSILON {
        return Err(BatchError::DegenerateGeometry("line segment has zero length"));
    }
    Ok(d / len)
}

/// Corners of a thick segment with square caps.
///
/// The quad extends `half_thickness` past both endpoints and to both sides:
/// `a - e + n`, `b + e + n`, `b + e - n`, `a - e - n`.
pub(super) fn line_quad(a: Vec2, b: Vec2, half_thickness: f32) -> BatchResult<[Vec2; 4]> {
    let e = direction(a, b)? * half_thickness;
    let n = e.perp();
    Ok([a - e + n, b + e + n, b + e - n, a - e - n])
}

// ── circles ───────────────────────────────────────────────────────────────

pub(super) const OUTLINE_MIN_POINTS: usize = 8;
pub(super) const FILL_MIN_POINTS: usize = 3;
pub(super) const MAX_POINTS: usize = 256;

/// Yields `count` points on a circle of `radius` around the origin, starting at
/// `(radius, 0)`.
///
/// Each point is the previous one rotated by `2π / count` using a sin/cos pair
/// computed once.
pub(super) struct CirclePoints {
    sin: f32,
    cos: f32,
    current: Vec2,
    remaining: usize,
}

impl CirclePoints {
    pub(super) fn new(radius: f32, count: usize) -> Self {
        let step = std::f32::consts::TAU / count as f32;
        let (sin, cos) = step.sin_cos();
        Self {
            sin,
            cos,
            current: Vec2::new(radius, 0.0),
            remaining: count,
        }
    }

    #[inline]
    fn rotate(&self, p: Vec2) -> Vec2 {
        Vec2::new(self.cos * p.x - self.sin * p.y, self.sin * p.x + self.cos * p.y)
    }
}

impl Iterator for CirclePoints {
    type Item = Vec2;

    fn next(&mut self) -> Option<Vec2> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let p = self.current;
        self.current = self.rotate(p);
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for CirclePoints {}

// ── transforms ────────────────────────────────────────────────────────────

/// Applies `transform` to a planar point (z = 0, w = 1, no perspective divide).
#[inline]
pub(super) fn transform_point(transform: &Mat4, p: Vec2) -> Vec2 {
    transform.transform_point3(p.extend(0.0)).truncate()
}
