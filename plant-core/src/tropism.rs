//! Stochastic steering of new segments.
//!
//! For every new (or shifted) segment the organ draws candidate deviations
//! from its current heading and keeps the one that scores best under the
//! tropism's objective. Objectives are evaluated in absolute coordinates.

use std::f64::consts::{PI, TAU};

use glam::{DMat3, DVec3};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::geometry::rot_ab;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TropismKind {
    /// Grow along the current heading; draws nothing.
    #[default]
    Straight,
    /// Prefer downward growth.
    Gravitropism,
    /// Prefer upward growth.
    NegativeGravitropism,
    /// Prefer horizontal growth.
    Plagiotropism,
    /// Prefer the organ's initial heading.
    Exotropism,
}

/// Tropism of an organ type.
///
/// `strength` is the expected number of extra candidates per unit length,
/// `sigma` the angular standard deviation per square root of unit length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tropism {
    pub kind: TropismKind,
    pub strength: f64,
    pub sigma: f64,
}

impl Default for Tropism {
    fn default() -> Self {
        Self {
            kind: TropismKind::Straight,
            strength: 1.0,
            sigma: 0.2,
        }
    }
}

impl Tropism {
    pub fn new(kind: TropismKind, strength: f64, sigma: f64) -> Self {
        Self {
            kind,
            strength,
            sigma,
        }
    }

    pub fn is_straight(&self) -> bool {
        self.kind == TropismKind::Straight
    }

    /// Chooses the deviation `(a, b)` of the next segment from the frame's
    /// heading, see [`rot_ab`].
    ///
    /// ### Parameters
    /// - `pos` - Absolute position of the segment's start node.
    /// - `frame` - Absolute frame whose first column is the current heading.
    /// - `initial` - Absolute initial heading of the organ.
    /// - `dx` - Length of the segment.
    pub fn deviation(
        &self,
        rng: &mut impl Rng,
        pos: DVec3,
        frame: DMat3,
        initial: DVec3,
        dx: f64,
    ) -> (f64, f64) {
        if self.is_straight() {
            return (0.0, 0.0);
        }

        let scale = dx.sqrt();
        let mut best = self.draw(rng, scale);
        let n = self.strength * scale;
        if n > 0.0 {
            let trials = if rng.random::<f64>() < n.fract() {
                n.ceil()
            } else {
                n.floor()
            } as usize;

            let mut best_value = self.objective(pos, frame, initial, best, dx);
            for _ in 0..trials {
                let candidate = self.draw(rng, scale);
                let value = self.objective(pos, frame, initial, candidate, dx);
                if value < best_value {
                    best_value = value;
                    best = candidate;
                }
            }
        }
        best
    }

    fn draw(&self, rng: &mut impl Rng, scale: f64) -> (f64, f64) {
        let z: f64 = rng.sample(StandardNormal);
        (self.sigma * z * scale, rng.random::<f64>() * TAU)
    }

    /// Lower is better.
    fn objective(&self, pos: DVec3, frame: DMat3, initial: DVec3, (a, b): (f64, f64), dx: f64) -> f64 {
        let dir = frame * rot_ab(a, b);
        match self.kind {
            TropismKind::Straight => 0.0,
            TropismKind::Gravitropism => (pos + dir * dx).z,
            TropismKind::NegativeGravitropism => -(pos + dir * dx).z,
            TropismKind::Plagiotropism => dir.z.abs(),
            TropismKind::Exotropism => dir.dot(initial).clamp(-1.0, 1.0).acos() / PI,
        }
    }
}
