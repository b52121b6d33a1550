//! Realized organ parameters and the organ type registry.

use std::collections::HashMap;
use std::sync::Arc;

use glam::DVec3;

use crate::config::{OrganRandomParameter, SeedRandomParameter};
use crate::error::PlantError;
use crate::types::OrganKind;

/// Parameters of one organ, drawn once from its type template.
#[derive(Clone, Debug, PartialEq)]
pub struct OrganSpecificParameter {
    pub subtype: i32,
    /// Growth rate.
    pub r: f64,
    /// Maximal length, `lb + sum(ln) + la`.
    pub k: f64,
    /// Basal zone length.
    pub lb: f64,
    /// Apical zone length.
    pub la: f64,
    /// Distances between consecutive branching points.
    pub ln: Vec<f64>,
    /// Life time.
    pub rlt: f64,
    /// Radius.
    pub a: f64,
    /// Insertion angle.
    pub theta: f64,
}

impl Default for OrganSpecificParameter {
    fn default() -> Self {
        Self {
            subtype: 0,
            r: 0.0,
            k: 0.0,
            lb: 0.0,
            la: 0.0,
            ln: Vec::new(),
            rlt: f64::INFINITY,
            a: 0.0,
            theta: 0.0,
        }
    }
}

impl OrganSpecificParameter {
    /// Length at which the branching zone ends, `lb + sum(ln)`.
    ///
    /// Summed in the order the organ passes its branching points, so the
    /// result is bitwise equal to the length reached at the last one.
    pub fn branching_zone_end(&self) -> f64 {
        self.ln.iter().fold(self.lb, |s, l| s + l)
    }
}

/// Realized seed parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SeedSpecificParameter {
    pub seed_pos: DVec3,
    pub max_b: usize,
    pub first_b: f64,
    pub delay_b: f64,
    pub basal_type: i32,
}

/// Registry of organ type templates keyed by kind and subtype.
///
/// Templates are shared read-only with every organ drawn from them.
#[derive(Clone, Debug, Default)]
pub struct OrganTypeTable {
    types: HashMap<(OrganKind, i32), Arc<OrganRandomParameter>>,
    seed: SeedRandomParameter,
}

impl OrganTypeTable {
    pub fn new(seed: SeedRandomParameter) -> Self {
        Self {
            types: HashMap::new(),
            seed,
        }
    }

    /// Builder style [`OrganTypeTable::insert`].
    pub fn with_type(mut self, template: OrganRandomParameter) -> Self {
        self.insert(template);
        self
    }

    /// Registers a template, replacing (and returning) a previous one of the
    /// same kind and subtype.
    pub fn insert(&mut self, template: OrganRandomParameter) -> Option<Arc<OrganRandomParameter>> {
        self.types
            .insert((template.kind, template.subtype), Arc::new(template))
    }

    pub fn lookup(
        &self,
        kind: OrganKind,
        subtype: i32,
    ) -> Result<&Arc<OrganRandomParameter>, PlantError> {
        self.types
            .get(&(kind, subtype))
            .ok_or(PlantError::MissingParameter { kind, subtype })
    }

    pub fn contains(&self, kind: OrganKind, subtype: i32) -> bool {
        self.types.contains_key(&(kind, subtype))
    }

    pub fn seed(&self) -> &SeedRandomParameter {
        &self.seed
    }

    pub fn seed_mut(&mut self) -> &mut SeedRandomParameter {
        &mut self.seed
    }

    /// Checks that every successor named by a template is registered and
    /// that every axial resolution is usable.
    pub fn validate(&self) -> Result<(), PlantError> {
        for template in self.types.values() {
            let (dx, dx_min) = (template.dx, template.dx_min);
            if !(dx > 0.0) || !(dx_min >= 0.0) || dx_min > dx {
                return Err(PlantError::InvalidArgument(format!(
                    "{} {}: need 0 <= dx_min <= dx and dx > 0, got dx = {dx}, dx_min = {dx_min}",
                    template.kind, template.subtype
                )));
            }
            for s in &template.successors {
                self.lookup(s.kind, s.subtype)?;
            }
        }
        Ok(())
    }
}
