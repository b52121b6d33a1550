//! Spatial functions queried by growing organs.
//!
//! Organ types may carry an elongation scale (impedance, usually in
//! `[0, 1]`) and an emergence probability per day. Both are evaluated at
//! the absolute position of the organ's tip. An absent function means a
//! constant value of 1.

use std::fmt;

use glam::DVec3;

use crate::organ::Organ;

/// A scalar field over space, optionally depending on the querying organ.
pub trait SpatialFunction: fmt::Debug + Send + Sync {
    fn value(&self, pos: DVec3, organ: &Organ) -> f64;
}

/// The same value everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constant(pub f64);

impl SpatialFunction for Constant {
    fn value(&self, _pos: DVec3, _organ: &Organ) -> f64 {
        self.0
    }
}

/// Horizontal layers: `values[i]` applies between `depths[i-1]` and
/// `depths[i]` below the surface (z = 0, depth = -z), the last value
/// below the deepest boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthLayers {
    depths: Vec<f64>,
    values: Vec<f64>,
}

impl DepthLayers {
    /// `depths` are the lower boundaries of all layers but the last one,
    /// so `values.len() == depths.len() + 1`.
    ///
    /// ### Panics
    /// Panics if the lengths do not fit or the depths are not increasing.
    pub fn new(depths: Vec<f64>, values: Vec<f64>) -> Self {
        assert_eq!(depths.len() + 1, values.len(), "one value per layer");
        assert!(
            depths.windows(2).all(|w| w[1] > w[0]),
            "layer depths must increase"
        );
        Self { depths, values }
    }
}

impl SpatialFunction for DepthLayers {
    fn value(&self, pos: DVec3, _organ: &Organ) -> f64 {
        let depth = -pos.z;
        let layer = self.depths.partition_point(|&d| d <= depth);
        self.values[layer]
    }
}
