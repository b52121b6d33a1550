//! A single organ of the plant tree.
//!
//! Geometry is stored relative to the organ itself: `nodes` live in the
//! organ's own frame with the first node at the origin, the frame's
//! x-axis is the organ's initial heading. [`Organ::relative_origin`] and
//! [`Organ::relative_heading`] place that frame inside the parent's frame.
//! Absolute geometry needs the ancestor chain and is therefore computed
//! by [`crate::plant::Plant`].

use std::fmt;
use std::sync::Arc;

use glam::{DMat3, DVec3};

use crate::config::OrganRandomParameter;
use crate::parameter::OrganSpecificParameter;
use crate::types::{NodeId, OrganId, OrganKind};

#[derive(Clone, Debug)]
pub struct Organ {
    pub(crate) id: OrganId,
    pub(crate) kind: OrganKind,
    pub(crate) parent: Option<OrganId>,
    pub(crate) children: Vec<OrganId>,

    pub(crate) template: Arc<OrganRandomParameter>,
    pub(crate) param: OrganSpecificParameter,

    pub(crate) origin: DVec3,
    pub(crate) heading: DMat3,
    pub(crate) nodes: Vec<DVec3>,
    pub(crate) node_ids: Vec<NodeId>,
    pub(crate) node_times: Vec<f64>,

    pub(crate) age: f64,
    pub(crate) length: f64,
    pub(crate) alive: bool,
    pub(crate) active: bool,

    pub(crate) parent_base_length: f64,
    pub(crate) parent_node_index: usize,
    /// Branching points already passed, with or without a lateral.
    pub(crate) branch_points: usize,

    pub(crate) first_call: bool,
    pub(crate) moved: bool,
    pub(crate) old_node_count: usize,
}

impl Organ {
    /// The root of the organ tree, lying at `origin` with identity heading.
    pub fn seed(origin: DVec3) -> Self {
        Self {
            id: 0,
            kind: OrganKind::Seed,
            parent: None,
            children: Vec::new(),
            template: Arc::new(OrganRandomParameter::seed()),
            param: OrganSpecificParameter::default(),
            origin,
            heading: DMat3::IDENTITY,
            nodes: vec![DVec3::ZERO],
            node_ids: vec![0],
            node_times: vec![0.0],
            age: 0.0,
            length: 0.0,
            alive: true,
            active: false,
            parent_base_length: 0.0,
            parent_node_index: 0,
            branch_points: 0,
            first_call: true,
            moved: false,
            old_node_count: 1,
        }
    }

    pub fn id(&self) -> OrganId {
        self.id
    }

    pub fn kind(&self) -> OrganKind {
        self.kind
    }

    pub fn subtype(&self) -> i32 {
        self.param.subtype
    }

    pub fn parent(&self) -> Option<OrganId> {
        self.parent
    }

    pub fn children(&self) -> &[OrganId] {
        &self.children
    }

    /// The type template this organ was drawn from.
    pub fn template(&self) -> &OrganRandomParameter {
        &self.template
    }

    pub fn param(&self) -> &OrganSpecificParameter {
        &self.param
    }

    /// Emergence point in the parent's frame (for the seed: its absolute position).
    pub fn relative_origin(&self) -> DVec3 {
        self.origin
    }

    /// Initial heading as a rotation of the parent's frame.
    pub fn relative_heading(&self) -> DMat3 {
        self.heading
    }

    pub fn relative_nodes(&self) -> &[DVec3] {
        &self.nodes
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    pub fn node_times(&self) -> &[f64] {
        &self.node_times
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn parent_base_length(&self) -> f64 {
        self.parent_base_length
    }

    pub fn parent_node_index(&self) -> usize {
        self.parent_node_index
    }

    /// `true` if the last node was shifted during the latest step.
    pub fn has_moved(&self) -> bool {
        self.moved
    }

    /// Number of nodes before the latest step.
    pub fn old_node_count(&self) -> usize {
        self.old_node_count
    }

    /// Current heading in the organ's own frame.
    pub fn heading(&self) -> DVec3 {
        match self.nodes.as_slice() {
            [.., prev, last] => {
                let h = (*last - *prev).normalize_or_zero();
                if h == DVec3::ZERO { DVec3::X } else { h }
            }
            _ => DVec3::X,
        }
    }

    pub(crate) fn dx(&self) -> f64 {
        self.template.dx
    }

    pub(crate) fn small_dx(&self) -> f64 {
        self.template.dx_min
    }

    pub(crate) fn push_node(&mut self, node: DVec3, id: NodeId, time: f64) {
        self.nodes.push(node);
        self.node_ids.push(id);
        self.node_times.push(time);
    }
}

impl fmt::Display for Organ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            OrganKind::Seed => "Seed",
            OrganKind::Root => "Root",
            OrganKind::Stem => "Stem",
            OrganKind::Leaf => "Leaf",
        };
        write!(
            f,
            "{kind} #{}: subtype {}, length {}, age {}, {} children",
            self.id,
            self.param.subtype,
            self.length,
            self.age,
            self.children.len()
        )
    }
}
