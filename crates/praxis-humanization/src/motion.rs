// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! 2D points and cubic Bézier evaluation for cursor paths.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Curve parameter at which a single intermediate waypoint is taken
pub const WAYPOINT_T: f64 = 0.8;

/// Screen-space point
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point2) -> f64 {
        (other - self).norm()
    }
}

impl Add for Point2 {
    type Output = Point2;

    fn add(self, rhs: Point2) -> Point2 {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Point2;

    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2 {
    type Output = Point2;

    fn mul(self, rhs: f64) -> Point2 {
        Point2::new(self.x * rhs, self.y * rhs)
    }
}

/// Point on the cubic Bézier curve `p0 → p3` with controls `c1`, `c2`
pub fn cubic_bezier(p0: Point2, c1: Point2, c2: Point2, p3: Point2, t: f64) -> Point2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + p3 * (t * t * t)
}
