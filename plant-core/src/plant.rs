//! The organ tree of one plant.
//!
//! Organs live in an arena indexed by [`OrganId`]; the seed is always
//! organ [`SEED`]. Every organ stores its geometry relative to its parent,
//! absolute positions are composed along the ancestor chain on demand.

use std::f64::consts::PI;
use std::sync::Arc;

use glam::{DMat3, DVec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::config::OrganRandomParameter;
use crate::error::PlantError;
use crate::geometry::{ons, rot_ab};
use crate::organ::Organ;
use crate::parameter::{OrganTypeTable, SeedSpecificParameter};
use crate::types::{NodeId, OrganId, OrganKind};

/// Id of the seed organ.
pub const SEED: OrganId = 0;

/// Root subtype of the tap root emitted by the seed.
pub const TAP_ROOT_TYPE: i32 = 1;

/// Stem subtype of the main shoot emitted by the seed.
pub const MAIN_STEM_TYPE: i32 = 1;

#[derive(Clone, Debug)]
pub struct Plant {
    pub(crate) organs: Vec<Organ>,
    pub(crate) table: OrganTypeTable,
    pub(crate) seed_param: SeedSpecificParameter,
    pub(crate) rng: StdRng,
    pub(crate) next_node_id: NodeId,
    pub(crate) time: f64,
}

impl Plant {
    /// Creates a plant from its type table and places the seed.
    ///
    /// The seed immediately emits its tap root, basal roots and main stem
    /// as dormant organs (if their types are registered), the basal roots
    /// staggered by `first_b + i * delay_b`.
    ///
    /// ### Parameters
    /// - `table` - Organ types; successors must all be registered.
    /// - `rng_seed` - Seed of the plant's random stream. Equal seeds and
    ///   tables give identical plants.
    ///
    /// ### Returns
    /// [`PlantError::MissingParameter`] if a successor type is not registered,
    /// [`PlantError::InvalidArgument`] if a type has an unusable resolution.
    pub fn new(table: OrganTypeTable, rng_seed: u64) -> Result<Self, PlantError> {
        table.validate()?;
        let mut rng = StdRng::seed_from_u64(rng_seed);
        let seed_param = table.seed().realize(&mut rng);

        let mut plant = Self {
            organs: vec![Organ::seed(seed_param.seed_pos)],
            table,
            seed_param,
            rng,
            next_node_id: 1,
            time: 0.0,
        };
        plant.initialize()?;
        Ok(plant)
    }

    fn initialize(&mut self) -> Result<(), PlantError> {
        let down = DVec3::new(0.0, 0.0, -1.0);
        let up = DVec3::new(0.0, 0.0, 1.0);

        if self.table.contains(OrganKind::Root, TAP_ROOT_TYPE) {
            self.create_organ(SEED, OrganKind::Root, TAP_ROOT_TYPE, down, 0.0, 0.0, 0)?;

            let basal = self.seed_param.basal_type;
            if self.seed_param.max_b > 0 && !self.table.contains(OrganKind::Root, basal) {
                debug!(basal, "basal root type not registered, using tap root parameters");
                let copy = OrganRandomParameter {
                    subtype: basal,
                    ..(**self.table.lookup(OrganKind::Root, TAP_ROOT_TYPE)?).clone()
                };
                self.table.insert(copy);
            }

            let mut delay = self.seed_param.first_b;
            for _ in 0..self.seed_param.max_b {
                self.create_organ(SEED, OrganKind::Root, basal, down, delay, 0.0, 0)?;
                delay += self.seed_param.delay_b;
            }
        } else {
            debug!("no tap root type registered");
        }

        if self.table.contains(OrganKind::Stem, MAIN_STEM_TYPE) {
            self.create_organ(SEED, OrganKind::Stem, MAIN_STEM_TYPE, up, 0.0, 0.0, 0)?;
        }

        debug!(organs = self.organs.len(), "plant initialized");
        Ok(())
    }

    /// Appends a new, dormant organ to the tree.
    ///
    /// The organ emerges from the parent's node `parent_node_index`, shares
    /// that node's id and is created `delay` after it. Its heading is
    /// `heading` (in the parent's frame) rotated by the drawn insertion
    /// angle and the radial angle of its phytomer.
    ///
    /// ### Parameters
    /// - `parent` - Parent organ.
    /// - `kind`, `subtype` - Type of the new organ.
    /// - `heading` - Direction the insertion angle is measured from.
    /// - `delay` - Time until emergence; becomes the negated initial age.
    /// - `parent_base_length` - Parent length at the emergence point.
    /// - `parent_node_index` - Parent node the organ is attached to.
    ///
    /// ### Panics
    /// Panics if `parent` or `parent_node_index` does not exist.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn create_organ(
        &mut self,
        parent: OrganId,
        kind: OrganKind,
        subtype: i32,
        heading: DVec3,
        delay: f64,
        parent_base_length: f64,
        parent_node_index: usize,
    ) -> Result<OrganId, PlantError> {
        let template = Arc::clone(self.table.lookup(kind, subtype)?);
        let param = template.realize(&mut self.rng);

        let index = self.organs[parent].children.len() as f64;
        let random = if template.beta_dev != 0.0 {
            self.rng.random::<f64>()
        } else {
            0.0
        };
        let beta = PI * (template.rot_beta * index + template.beta_dev * random) + template.init_beta;
        // leaves on an axis open up with the elongation scale at their node
        let mut theta = param.theta;
        if kind == OrganKind::Leaf && parent != SEED {
            if let Some(f) = &template.elongation_scale {
                theta *= f.value(self.node(parent, parent_node_index), &self.organs[parent]);
            }
        }
        let dir = ons(heading) * rot_ab(theta, beta);

        let p = &self.organs[parent];
        let origin = p.nodes[parent_node_index];
        let node_id = p.node_ids[parent_node_index];
        let created = p.node_times[parent_node_index] + delay;

        let id = self.organs.len();
        self.organs.push(Organ {
            id,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            template,
            param,
            origin,
            heading: ons(dir),
            nodes: vec![DVec3::ZERO],
            node_ids: vec![node_id],
            node_times: vec![created],
            age: 0.0 - delay,
            length: 0.0,
            alive: true,
            active: true,
            parent_base_length,
            parent_node_index,
            branch_points: 0,
            first_call: true,
            moved: false,
            old_node_count: 1,
        });
        self.organs[parent].children.push(id);

        trace!(id, parent, %kind, subtype, delay, "organ created");
        Ok(id)
    }

    /// ### Panics
    /// Panics if `id` does not exist.
    pub fn organ(&self, id: OrganId) -> &Organ {
        &self.organs[id]
    }

    pub fn get(&self, id: OrganId) -> Option<&Organ> {
        self.organs.get(id)
    }

    /// All organs in creation order, the seed first.
    pub fn organs(&self) -> &[Organ] {
        &self.organs
    }

    pub fn len(&self) -> usize {
        self.organs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organs.is_empty()
    }

    pub fn seed(&self) -> &Organ {
        &self.organs[SEED]
    }

    pub fn seed_param(&self) -> &SeedSpecificParameter {
        &self.seed_param
    }

    pub fn table(&self) -> &OrganTypeTable {
        &self.table
    }

    /// Total simulated time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of node ids handed out so far, the seed's included.
    pub fn node_id_count(&self) -> usize {
        self.next_node_id
    }

    pub(crate) fn allocate_node_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    /// Absolute position of the organ's first node and absolute rotation of
    /// its frame.
    pub(crate) fn absolute_frame(&self, id: OrganId) -> (DVec3, DMat3) {
        let organ = &self.organs[id];
        match organ.parent {
            Some(p) => {
                let (origin, heading) = self.absolute_frame(p);
                (origin + heading * organ.origin, heading * organ.heading)
            }
            None => (organ.origin, organ.heading),
        }
    }

    /// Absolute position of the organ's first node.
    pub fn absolute_origin(&self, id: OrganId) -> DVec3 {
        self.absolute_frame(id).0
    }

    /// Rotation from the organ's frame to world coordinates.
    pub fn absolute_heading(&self, id: OrganId) -> DMat3 {
        self.absolute_frame(id).1
    }

    /// Absolute position of node `i` of organ `id`.
    ///
    /// ### Panics
    /// Panics if the organ or the node does not exist.
    pub fn node(&self, id: OrganId, i: usize) -> DVec3 {
        let (origin, heading) = self.absolute_frame(id);
        origin + heading * self.organs[id].nodes[i]
    }

    /// Absolute positions of all nodes of organ `id`.
    pub fn nodes(&self, id: OrganId) -> Vec<DVec3> {
        let (origin, heading) = self.absolute_frame(id);
        self.organs[id]
            .nodes
            .iter()
            .map(|&n| origin + heading * n)
            .collect()
    }

    /// Absolute position of the organ's tip.
    pub fn tip(&self, id: OrganId) -> DVec3 {
        self.node(id, self.organs[id].nodes.len() - 1)
    }
}
