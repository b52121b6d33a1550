//! Discretization of organ growth into polyline segments.
//!
//! Growth of length `l` becomes `floor(l / dx)` segments of the axial
//! resolution `dx` plus one shorter remainder. A short last segment left
//! by a previous step is first stretched towards `dx` instead of adding
//! a new node, unless a lateral is attached to its end node.

use glam::DVec3;
use tracing::{debug, warn};

use crate::geometry::{ons, rot_ab};
use crate::plant::Plant;
use crate::types::OrganId;

/// A previous last segment shorter than this fraction of `dx` is stretched.
const SHIFT_THRESHOLD: f64 = 0.99;

impl Plant {
    /// Appends nodes to organ `id` for growth of length `l`.
    ///
    /// Node creation times follow the organ's growth law at the length
    /// each node represents; node ids are drawn from the plant-wide
    /// counter. Sets the organ's moved flag if its last node was shifted.
    ///
    /// ### Parameters
    /// - `id` - The growing organ. Its `length` must not yet include `l`.
    /// - `l` - Length to add; zero and negative lengths are ignored.
    pub(crate) fn create_segments(&mut self, id: OrganId, l: f64) {
        if l == 0.0 {
            debug!(id, "zero length segment request");
            return;
        }
        if l < 0.0 {
            warn!(id, l, "negative length segment request ignored");
            return;
        }

        let (dx, small_dx) = (self.organs[id].dx(), self.organs[id].small_dx());
        let mut l = l;
        let mut shift = 0.0;

        if self.organs[id].first_call {
            self.organs[id].first_call = false;

            let organ = &self.organs[id];
            let nn = organ.nodes.len();
            let anchored = organ
                .children
                .last()
                .map(|&c| self.organs[c].parent_node_index);

            // never move a lateral's base node
            if nn > 1 && anchored != Some(nn - 1) {
                let n2 = organ.nodes[nn - 2];
                let old_dx = organ.nodes[nn - 1].distance(n2);
                if old_dx < dx * SHIFT_THRESHOLD {
                    shift = (dx - old_dx).min(l);
                    let inc = self.increment(id, n2, old_dx + shift);
                    let time = self.calc_creation_time(id, self.organs[id].length + shift);

                    let organ = &mut self.organs[id];
                    organ.nodes[nn - 1] = n2 + inc;
                    organ.node_times[nn - 1] = time;
                    organ.moved = true;
                    l -= shift;
                    if l <= 0.0 {
                        return;
                    }
                }
            }
        }

        let length = self.organs[id].length;
        let n = (l / dx).floor() as usize;
        let mut sl = 0.0;
        for i in 0..=n {
            let sdx = if i < n {
                dx
            } else {
                let rest = l - n as f64 * dx;
                if rest < small_dx {
                    if rest > 0.0 {
                        debug!(id, rest, small_dx, "skipped small segment");
                    }
                    return;
                }
                rest
            };
            sl += sdx;

            let last = self.organs[id].nodes[self.organs[id].nodes.len() - 1];
            let inc = self.increment(id, last, sdx);
            let time = self.calc_creation_time(id, length + shift + sl);
            let node_id = self.allocate_node_id();
            self.organs[id].push_node(last + inc, node_id, time);
        }
    }

    /// Displacement of a new segment of length `sdx` starting at node `p`
    /// (in the organ's frame).
    ///
    /// The segment continues the organ's current heading, deviated by its
    /// tropism. Tropisms are evaluated in absolute coordinates: the
    /// position of `p`, the absolute current heading and the absolute
    /// initial heading of the organ.
    pub(crate) fn increment(&mut self, id: OrganId, p: DVec3, sdx: f64) -> DVec3 {
        let organ = &self.organs[id];
        let frame = ons(organ.heading());
        let tropism = organ.template.tropism;

        let (a, b) = if tropism.is_straight() {
            (0.0, 0.0)
        } else {
            let (origin, heading) = self.absolute_frame(id);
            tropism.deviation(
                &mut self.rng,
                origin + heading * p,
                heading * frame,
                heading * DVec3::X,
                sdx,
            )
        };
        frame * rot_ab(a, b) * sdx
    }
}
