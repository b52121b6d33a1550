//! Tree queries: organ collection by kind and per-organ scalar values.

use std::f64::consts::PI;
use std::str::FromStr;

use crate::error::PlantError;
use crate::plant::{Plant, SEED};
use crate::types::{OrganFilter, OrganId, OrganKind};

/// A scalar attribute of an organ, see [`Plant::scalar`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrganScalar {
    One,
    Id,
    OrganType,
    SubType,
    Alive,
    Active,
    Age,
    Length,
    /// Number of ancestors below the seed.
    Order,
    ParentType,
    CreationTime,
    Radius,
    Volume,
    Surface,
    Lb,
    La,
    K,
    R,
    Theta,
    Rlt,
    LnMean,
    LnDev,
    ParentBaseLength,
    ParentNodeIndex,
    NumberOfNodes,
    NumberOfChildren,
}

impl OrganScalar {
    pub const ALL: [OrganScalar; 26] = [
        OrganScalar::One,
        OrganScalar::Id,
        OrganScalar::OrganType,
        OrganScalar::SubType,
        OrganScalar::Alive,
        OrganScalar::Active,
        OrganScalar::Age,
        OrganScalar::Length,
        OrganScalar::Order,
        OrganScalar::ParentType,
        OrganScalar::CreationTime,
        OrganScalar::Radius,
        OrganScalar::Volume,
        OrganScalar::Surface,
        OrganScalar::Lb,
        OrganScalar::La,
        OrganScalar::K,
        OrganScalar::R,
        OrganScalar::Theta,
        OrganScalar::Rlt,
        OrganScalar::LnMean,
        OrganScalar::LnDev,
        OrganScalar::ParentBaseLength,
        OrganScalar::ParentNodeIndex,
        OrganScalar::NumberOfNodes,
        OrganScalar::NumberOfChildren,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OrganScalar::One => "one",
            OrganScalar::Id => "id",
            OrganScalar::OrganType => "organType",
            OrganScalar::SubType => "subType",
            OrganScalar::Alive => "alive",
            OrganScalar::Active => "active",
            OrganScalar::Age => "age",
            OrganScalar::Length => "length",
            OrganScalar::Order => "order",
            OrganScalar::ParentType => "parentType",
            OrganScalar::CreationTime => "creationTime",
            OrganScalar::Radius => "radius",
            OrganScalar::Volume => "volume",
            OrganScalar::Surface => "surface",
            OrganScalar::Lb => "lb",
            OrganScalar::La => "la",
            OrganScalar::K => "k",
            OrganScalar::R => "r",
            OrganScalar::Theta => "theta",
            OrganScalar::Rlt => "rlt",
            OrganScalar::LnMean => "lnMean",
            OrganScalar::LnDev => "lnDev",
            OrganScalar::ParentBaseLength => "parentBaseLength",
            OrganScalar::ParentNodeIndex => "parentNodeIndex",
            OrganScalar::NumberOfNodes => "numberOfNodes",
            OrganScalar::NumberOfChildren => "numberOfChildren",
        }
    }
}

impl FromStr for OrganScalar {
    type Err = PlantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrganScalar::ALL
            .into_iter()
            .find(|scalar| scalar.name() == s)
            .ok_or_else(|| PlantError::InvalidArgument(format!("unknown organ scalar '{s}'")))
    }
}

impl Plant {
    /// Organs of the whole plant matching `filter`, depth-first pre-order.
    ///
    /// Organs with a single node have no geometry yet and are skipped,
    /// their subtrees are still searched.
    pub fn collect_organs(&self, filter: OrganFilter) -> Vec<OrganId> {
        self.collect_organs_from(SEED, filter)
    }

    /// [`Plant::collect_organs`] with a numeric filter code, see
    /// [`OrganFilter`]'s `TryFrom<i32>`.
    pub fn collect_organs_by_code(&self, code: i32) -> Result<Vec<OrganId>, PlantError> {
        Ok(self.collect_organs(OrganFilter::try_from(code)?))
    }

    /// Like [`Plant::collect_organs`], for the subtree rooted at `id`.
    pub fn collect_organs_from(&self, id: OrganId, filter: OrganFilter) -> Vec<OrganId> {
        let mut out = Vec::new();
        self.collect_into(id, filter, &mut out);
        out
    }

    fn collect_into(&self, id: OrganId, filter: OrganFilter, out: &mut Vec<OrganId>) {
        let organ = &self.organs[id];
        if organ.nodes.len() > 1 && filter.matches(organ.kind) {
            out.push(id);
        }
        for &child in &organ.children {
            self.collect_into(child, filter, out);
        }
    }

    /// Value of `scalar` for organ `id`.
    ///
    /// ### Returns
    /// `f64::NAN` where the attribute does not apply, e.g. axis
    /// parameters of the seed or the parent type of the seed.
    pub fn scalar(&self, id: OrganId, scalar: OrganScalar) -> f64 {
        let organ = &self.organs[id];
        let axis = organ.kind != OrganKind::Seed;
        let p = &organ.param;
        let axis_only = |v: f64| if axis { v } else { f64::NAN };
        let flag = |b: bool| if b { 1.0 } else { 0.0 };

        match scalar {
            OrganScalar::One => 1.0,
            OrganScalar::Id => organ.id as f64,
            OrganScalar::OrganType => organ.kind.code() as f64,
            OrganScalar::SubType => p.subtype as f64,
            OrganScalar::Alive => flag(organ.alive),
            OrganScalar::Active => flag(organ.active),
            OrganScalar::Age => organ.age,
            OrganScalar::Length => organ.length,
            OrganScalar::Order => self.order(id) as f64,
            OrganScalar::ParentType => organ
                .parent
                .map_or(f64::NAN, |parent| self.organs[parent].kind.code() as f64),
            OrganScalar::CreationTime => organ.node_times[0],
            OrganScalar::Radius => axis_only(p.a),
            OrganScalar::Volume => axis_only(PI * p.a * p.a * organ.length),
            OrganScalar::Surface => axis_only(2.0 * PI * p.a * organ.length),
            OrganScalar::Lb => axis_only(p.lb),
            OrganScalar::La => axis_only(p.la),
            OrganScalar::K => axis_only(p.k),
            OrganScalar::R => axis_only(p.r),
            OrganScalar::Theta => axis_only(p.theta),
            OrganScalar::Rlt => axis_only(p.rlt),
            OrganScalar::LnMean => {
                if p.ln.is_empty() {
                    f64::NAN
                } else {
                    p.ln.iter().sum::<f64>() / p.ln.len() as f64
                }
            }
            OrganScalar::LnDev => {
                if p.ln.is_empty() {
                    f64::NAN
                } else {
                    let n = p.ln.len() as f64;
                    let mean = p.ln.iter().sum::<f64>() / n;
                    (p.ln.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n).sqrt()
                }
            }
            OrganScalar::ParentBaseLength => axis_only(organ.parent_base_length),
            OrganScalar::ParentNodeIndex => axis_only(organ.parent_node_index as f64),
            OrganScalar::NumberOfNodes => organ.nodes.len() as f64,
            OrganScalar::NumberOfChildren => organ.children.len() as f64,
        }
    }

    /// [`Plant::scalar`] for each of `organs`.
    pub fn scalars(&self, organs: &[OrganId], scalar: OrganScalar) -> Vec<f64> {
        organs.iter().map(|&id| self.scalar(id, scalar)).collect()
    }

    fn order(&self, id: OrganId) -> usize {
        let mut order = 0;
        let mut current = self.organs[id].parent;
        while let Some(parent) = current {
            order += 1;
            current = self.organs[parent].parent;
        }
        order
    }
}
