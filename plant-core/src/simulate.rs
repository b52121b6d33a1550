//! Time stepping: aging, emergence, elongation and lateral branching.
//!
//! One call of [`Plant::simulate`] walks the organ tree from the seed:
//!
//! 1. Each organ resets its per-step bookkeeping (moved flag, old node
//!    count, first segment call).
//! 2. It ages by `dt`, clamped at its life time; reaching the life time
//!    kills it.
//! 3. A dormant organ whose age crosses zero may emerge, gated by its
//!    emergence probability.
//! 4. Children are simulated with the full `dt`, then the organ itself
//!    elongates through its basal, branching and apical zones, creating
//!    laterals at the branching points it passes.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, trace};

use crate::error::PlantError;
use crate::plant::{Plant, SEED};
use crate::types::{OrganId, OrganKind};

impl Plant {
    /// Advances the whole plant by `dt` days.
    ///
    /// `dt == 0` only clears the per-step bookkeeping of every organ.
    ///
    /// ### Returns
    /// [`PlantError::InvalidArgument`] if `dt` is negative or not a number.
    pub fn simulate(&mut self, dt: f64) -> Result<(), PlantError> {
        if !(dt >= 0.0) {
            return Err(PlantError::InvalidArgument(format!(
                "time step must be non-negative, got {dt}"
            )));
        }
        let before = self.organs.len();
        self.simulate_organ(SEED, dt)?;
        self.time += dt;
        debug!(
            dt,
            time = self.time,
            organs = self.organs.len(),
            created = self.organs.len() - before,
            "plant simulated"
        );
        Ok(())
    }

    /// Advances organ `id` and its subtree by `dt`.
    pub(crate) fn simulate_organ(&mut self, id: OrganId, dt: f64) -> Result<(), PlantError> {
        let organ = &mut self.organs[id];
        organ.first_call = true;
        organ.moved = false;
        organ.old_node_count = organ.nodes.len();
        if dt <= 0.0 {
            return self.simulate_children(id, 0.0);
        }

        // The seed and dead organs only pass time on to their children.
        if organ.kind == OrganKind::Seed || !organ.alive {
            if organ.kind == OrganKind::Seed {
                organ.age += dt;
            }
            return self.simulate_children(id, dt);
        }

        // Wall age at the end of this step, even for an organ dying in it.
        let clock = organ.age + dt;
        let mut step = dt;
        if organ.age + step > organ.param.rlt {
            step = organ.param.rlt - organ.age;
            organ.age = organ.param.rlt;
            organ.alive = false;
            debug!(id, age = organ.age, "organ reached its life time");
        } else {
            organ.age += step;
        }

        let age = organ.age;
        if age > 0.0 && age - step <= 0.0 {
            if self.emerges(id, step) {
                trace!(id, age, "organ emerged");
            } else {
                self.organs[id].age -= step;
            }
        }
        if self.organs[id].age <= 0.0 {
            return Ok(());
        }

        self.simulate_children(id, dt)?;

        if self.organs[id].active {
            self.elongate(id, step, clock)?;
        }
        let organ = &mut self.organs[id];
        organ.active = organ.alive && organ.length < organ.param.k - organ.dx() / 10.0;
        Ok(())
    }

    fn simulate_children(&mut self, id: OrganId, dt: f64) -> Result<(), PlantError> {
        // Children created during this loop were already advanced on creation.
        let count = self.organs[id].children.len();
        for i in 0..count {
            let child = self.organs[id].children[i];
            self.simulate_organ(child, dt)?;
        }
        Ok(())
    }

    /// Decides whether a dormant organ emerges during a step of length `dt`.
    ///
    /// The emergence probability `P` per day is evaluated at the organ's
    /// tip; the organ emerges with probability `1 - (1 - P)^dt`.
    pub(crate) fn emerges(&mut self, id: OrganId, dt: f64) -> bool {
        let organ = &self.organs[id];
        let Some(f) = organ.template.emergence_probability.clone() else {
            return true;
        };
        let p = f.value(self.tip(id), organ);
        if p >= 1.0 {
            return true;
        }
        let p_step = 1.0 - (1.0 - p.max(0.0)).powf(dt);
        self.rng.random::<f64>() <= p_step
    }

    /// Elongation scale at the organ's tip, 1 if the type has none.
    fn elongation_scale(&self, id: OrganId) -> f64 {
        let organ = &self.organs[id];
        match &organ.template.elongation_scale {
            Some(f) => f.value(self.tip(id), organ),
            None => 1.0,
        }
    }

    /// Length of organ `id` at `age` under its growth law.
    pub fn calc_length(&self, id: OrganId, age: f64) -> f64 {
        let organ = &self.organs[id];
        organ.template.growth.length(age, organ.param.r, organ.param.k)
    }

    /// Age at which organ `id` reaches `length` under its growth law.
    pub fn calc_age(&self, id: OrganId, length: f64) -> f64 {
        let organ = &self.organs[id];
        organ.template.growth.age(length, organ.param.r, organ.param.k)
    }

    /// Simulation time at which organ `id` reached (or reaches) `length`,
    /// never later than the organ's present.
    pub fn calc_creation_time(&self, id: OrganId, length: f64) -> f64 {
        let organ = &self.organs[id];
        self.calc_age(id, length).min(organ.age) + organ.node_times[0]
    }

    /// Elongates organ `id` for a step of `dt` after it has aged.
    ///
    /// The unimpeded target length follows the growth law from the age the
    /// organ's current length corresponds to, so impeded growth catches up
    /// at the law's rate rather than jumping to the age-based length. The
    /// increment is scaled by the elongation scale at the tip and
    /// distributed over the basal zone, the branching points and the
    /// apical zone; at every branching point passed a lateral is created.
    /// New laterals are advanced up to `clock`, the organ's wall age.
    pub(crate) fn elongate(&mut self, id: OrganId, dt: f64, clock: f64) -> Result<(), PlantError> {
        let (age, length) = (self.organs[id].age, self.organs[id].length);
        let age_of_length = self.calc_age(id, length);
        let dt = if age < dt { age } else { dt };
        let target = self.calc_length(id, age_of_length + dt);
        let mut dl = (self.elongation_scale(id) * (target - length)).max(0.0);
        if dl <= 0.0 {
            return Ok(());
        }

        let (lb, spacings, zone_end) = {
            let p = &self.organs[id].param;
            (p.lb, p.ln.clone(), p.branching_zone_end())
        };
        if spacings.is_empty() {
            self.grow(id, dl);
            return Ok(());
        }

        // basal zone
        let length = self.organs[id].length;
        if length < lb {
            if length + dl <= lb {
                self.grow(id, dl);
                dl = 0.0;
            } else {
                let ddx = lb - length;
                self.grow_to(id, ddx, lb);
                dl -= ddx;
            }
        }

        // branching zone
        if dl > 0.0 && self.organs[id].length >= lb {
            let mut s = lb;
            for (i, ln) in spacings.iter().enumerate() {
                if dl <= 0.0 {
                    break;
                }
                s += ln;
                let length = self.organs[id].length;
                if length < s {
                    if i == self.organs[id].branch_points {
                        self.create_lateral(id, clock)?;
                    }
                    if length + dl <= s {
                        self.grow(id, dl);
                        dl = 0.0;
                    } else {
                        let ddx = s - length;
                        self.grow_to(id, ddx, s);
                        dl -= ddx;
                    }
                }
            }
            let organ = &self.organs[id];
            if organ.branch_points == spacings.len() && organ.length >= zone_end {
                self.create_lateral(id, clock)?;
            }
        }

        // apical zone
        if dl > 0.0 {
            self.grow(id, dl);
        }
        Ok(())
    }

    fn grow(&mut self, id: OrganId, l: f64) {
        self.create_segments(id, l);
        self.organs[id].length += l;
    }

    /// Grows by `l` and snaps the length to `target`, a zone boundary.
    fn grow_to(&mut self, id: OrganId, l: f64, target: f64) {
        self.create_segments(id, l);
        self.organs[id].length = target;
    }

    /// Passes a branching point at the organ's current tip.
    ///
    /// Draws the successor type and creates `laterals_per_node` laterals
    /// of it at the last node. A lateral is delayed by the time the parent
    /// needs to grow its apical zone length further, and then advanced by
    /// the part of the current step that lies after its creation, up to the
    /// parent's wall age `clock`. A parent that died during the step has an
    /// age below `clock`.
    pub(crate) fn create_lateral(&mut self, id: OrganId, clock: f64) -> Result<(), PlantError> {
        let template = Arc::clone(&self.organs[id].template);
        if let Some(successor) = template.draw_successor(&mut self.rng) {
            let organ = &self.organs[id];
            let (length, la) = (organ.length, organ.param.la);
            let node = organ.nodes.len() - 1;
            let heading = organ.heading();

            let age_at_node = self.calc_age(id, length);
            let delay = self.calc_age(id, length + la) - age_at_node;
            for _ in 0..template.branching.laterals_per_node() {
                let lateral = self.create_organ(
                    id,
                    successor.kind,
                    successor.subtype,
                    heading,
                    delay,
                    length,
                    node,
                )?;
                self.simulate_organ(lateral, (clock - age_at_node).max(0.0))?;
            }
        }
        self.organs[id].branch_points += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BranchingPolicy, OrganRandomParameter, Successor};
    use crate::environment::Constant;
    use crate::growth::GrowthLaw;
    use crate::parameter::OrganTypeTable;
    use crate::plant::TAP_ROOT_TYPE;
    use glam::DVec3;

    fn axis(la: f64, r: f64, growth: GrowthLaw) -> OrganRandomParameter {
        OrganRandomParameter {
            la,
            r,
            growth,
            dx: 0.5,
            beta_dev: 0.0,
            branching: BranchingPolicy::Unbranched,
            ..OrganRandomParameter::new(OrganKind::Root, TAP_ROOT_TYPE)
        }
    }

    /// A tap root with zones 1 | 2 | 2 | 1 and one lateral type.
    fn branched(branching: BranchingPolicy) -> Plant {
        let tap = OrganRandomParameter {
            lb: 1.0,
            ln: 2.0,
            nob: 3.0,
            branching,
            successors: vec![Successor::new(OrganKind::Root, 2, 1.0)],
            ..axis(1.0, 1.0, GrowthLaw::Linear)
        };
        let lateral = OrganRandomParameter {
            subtype: 2,
            rot_beta: 1.0,
            ..axis(3.0, 1.0, GrowthLaw::Linear)
        };
        let table = OrganTypeTable::default().with_type(tap).with_type(lateral);
        Plant::new(table, 11).unwrap()
    }

    fn segment_length(plant: &Plant, id: OrganId) -> f64 {
        plant
            .nodes(id)
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    #[test]
    fn negative_time_step_is_rejected() {
        let mut plant = branched(BranchingPolicy::Alternate);
        assert!(matches!(
            plant.simulate(-1.0),
            Err(PlantError::InvalidArgument(_))
        ));
        assert!(plant.simulate(f64::NAN).is_err());
        assert_eq!(plant.time(), 0.0);
    }

    #[test]
    fn laterals_emerge_at_every_branching_point() {
        let mut plant = branched(BranchingPolicy::Alternate);
        plant.simulate(10.0).unwrap();

        let tap = plant.organ(1);
        assert_eq!(tap.length(), 6.0);
        assert_eq!(tap.node_count(), 13);
        assert!(!tap.is_active());

        let bases: Vec<f64> = tap
            .children()
            .iter()
            .map(|&c| plant.organ(c).parent_base_length())
            .collect();
        assert_eq!(bases, vec![1.0, 3.0, 5.0]);
        let nodes: Vec<usize> = tap
            .children()
            .iter()
            .map(|&c| plant.organ(c).parent_node_index())
            .collect();
        assert_eq!(nodes, vec![2, 6, 10]);

        // created once the parent grew la = 1 further, at r = 1
        let first = plant.organ(tap.children()[0]);
        assert_eq!(first.node_times()[0], 2.0);
        assert_eq!(first.age(), 8.0);
        assert_eq!(first.length(), 3.0);
    }

    #[test]
    fn laterals_are_created_incrementally() {
        let mut plant = branched(BranchingPolicy::Alternate);
        for _ in 0..40 {
            plant.simulate(0.25).unwrap();
        }
        let bases: Vec<f64> = plant
            .organ(1)
            .children()
            .iter()
            .map(|&c| plant.organ(c).parent_base_length())
            .collect();
        assert_eq!(bases, vec![1.0, 3.0, 5.0]);
        assert_eq!(plant.organ(1).length(), 6.0);
    }

    #[test]
    fn opposite_branching_creates_pairs() {
        let mut plant = branched(BranchingPolicy::Opposite);
        plant.simulate(10.0).unwrap();

        let tap = plant.organ(1);
        assert_eq!(tap.children().len(), 6);
        let a = plant.absolute_heading(tap.children()[0]) * DVec3::X;
        let b = plant.absolute_heading(tap.children()[1]) * DVec3::X;
        assert!(!a.abs_diff_eq(b, 1e-9), "paired laterals share a node but not a direction");
        assert_eq!(
            plant.organ(tap.children()[0]).parent_node_index(),
            plant.organ(tap.children()[1]).parent_node_index()
        );
    }

    #[test]
    fn segments_follow_the_tracked_length() {
        let mut plant = branched(BranchingPolicy::Alternate);
        for dt in [0.3, 0.7, 1.1, 0.05, 2.0, 4.0] {
            plant.simulate(dt).unwrap();
        }
        for id in 1..plant.len() {
            let organ = plant.organ(id);
            assert!(
                (segment_length(&plant, id) - organ.length()).abs() < 1e-9,
                "organ {id}"
            );
        }
    }

    #[test]
    fn lateral_base_coincides_with_its_parent_node() {
        let mut plant = branched(BranchingPolicy::Alternate);
        plant.simulate(7.0).unwrap();
        for &c in plant.organ(1).children() {
            let child = plant.organ(c);
            let at_parent = plant.node(1, child.parent_node_index());
            assert!(plant.node(c, 0).abs_diff_eq(at_parent, 1e-12));
            assert!(plant.absolute_origin(c).abs_diff_eq(at_parent, 1e-12));
            assert_eq!(
                child.node_ids()[0],
                plant.organ(1).node_ids()[child.parent_node_index()]
            );
        }
    }

    #[test]
    fn node_times_do_not_decrease_along_an_organ() {
        let mut plant = branched(BranchingPolicy::Alternate);
        for _ in 0..9 {
            plant.simulate(0.9).unwrap();
        }
        for organ in plant.organs() {
            let times = organ.node_times();
            assert!(times.windows(2).all(|w| w[0] <= w[1] + 1e-12), "{organ}");
            if organ.age() > 0.0 {
                assert!(times.iter().all(|&t| t <= plant.time() + 1e-9), "{organ}");
            }
        }
    }

    #[test]
    fn numeric_length_matches_the_growth_law() {
        let table = OrganTypeTable::default().with_type(axis(50.0, 2.0, GrowthLaw::NegativeExponential));
        let mut plant = Plant::new(table, 1).unwrap();
        for _ in 0..10 {
            plant.simulate(1.0).unwrap();
        }
        let expected = 50.0 * (1.0 - (-2.0 * 10.0 / 50.0f64).exp());
        assert!((plant.organ(1).length() - expected).abs() < 1e-9);
        assert_eq!(plant.organ(1).age(), 10.0);
        assert_eq!(plant.time(), 10.0);
    }

    #[test]
    fn organ_dies_at_its_life_time() {
        let tap = OrganRandomParameter {
            rlt: 2.0,
            ..axis(10.0, 1.0, GrowthLaw::Linear)
        };
        let mut plant = Plant::new(OrganTypeTable::default().with_type(tap), 1).unwrap();
        plant.simulate(5.0).unwrap();

        let organ = plant.organ(1);
        assert_eq!(organ.age(), 2.0);
        assert_eq!(organ.length(), 2.0);
        assert!(!organ.is_alive());
        assert!(!organ.is_active());

        plant.simulate(1.0).unwrap();
        assert_eq!(plant.organ(1).age(), 2.0);
        assert_eq!(plant.organ(1).length(), 2.0);
    }

    #[test]
    fn laterals_of_a_dying_organ_keep_wall_time() {
        let tap = OrganRandomParameter {
            lb: 1.0,
            ln: 2.0,
            nob: 3.0,
            rlt: 5.0,
            branching: BranchingPolicy::Alternate,
            successors: vec![Successor::new(OrganKind::Root, 2, 1.0)],
            ..axis(1.0, 1.0, GrowthLaw::Linear)
        };
        let lateral = OrganRandomParameter {
            subtype: 2,
            ..axis(3.0, 1.0, GrowthLaw::Linear)
        };
        let table = OrganTypeTable::default().with_type(tap).with_type(lateral);
        let mut plant = Plant::new(table, 11).unwrap();
        plant.simulate(4.0).unwrap();
        plant.simulate(3.0).unwrap();

        let tap = plant.organ(1);
        assert!(!tap.is_alive());
        assert_eq!(tap.age(), 5.0);
        assert_eq!(tap.length(), 5.0);

        let bases: Vec<f64> = tap
            .children()
            .iter()
            .map(|&c| plant.organ(c).parent_base_length())
            .collect();
        assert_eq!(bases, vec![1.0, 3.0, 5.0]);
        for &c in tap.children() {
            let child = plant.organ(c);
            assert!(
                (child.age() + child.node_times()[0] - plant.time()).abs() < 1e-9,
                "{child}"
            );
        }
        // created in the step the tap root died, one day before its end
        let last = plant.organ(*tap.children().last().unwrap());
        assert_eq!(last.age(), 1.0);
        assert_eq!(last.length(), 1.0);
    }

    #[test]
    fn emergence_follows_the_per_step_probability() {
        let emerged = |dt: f64| {
            (0..400)
                .filter(|&seed| {
                    let tap = OrganRandomParameter {
                        emergence_probability: Some(Arc::new(Constant(0.5))),
                        ..axis(10.0, 1.0, GrowthLaw::Linear)
                    };
                    let mut plant =
                        Plant::new(OrganTypeTable::default().with_type(tap), seed).unwrap();
                    plant.simulate(dt).unwrap();
                    plant.organ(1).age() > 0.0
                })
                .count()
        };
        // 1 - 0.5^dt: one half for a day, three quarters for two
        let one_day = emerged(1.0);
        assert!((150..=250).contains(&one_day), "{one_day}");
        let two_days = emerged(2.0);
        assert!((250..=350).contains(&two_days), "{two_days}");
    }

    #[test]
    fn certain_emergence_draws_no_random_number() {
        let build = |emergence: Option<Arc<dyn crate::environment::SpatialFunction>>| {
            let tap = OrganRandomParameter {
                emergence_probability: emergence,
                tropism: crate::tropism::Tropism::new(
                    crate::tropism::TropismKind::Gravitropism,
                    1.0,
                    0.3,
                ),
                ..axis(10.0, 1.0, GrowthLaw::Linear)
            };
            let mut plant = Plant::new(OrganTypeTable::default().with_type(tap), 5).unwrap();
            for _ in 0..4 {
                plant.simulate(1.0).unwrap();
            }
            plant
        };
        let gated = build(Some(Arc::new(Constant(1.0))));
        let free = build(None);
        assert_eq!(gated.nodes(1), free.nodes(1));
        assert_eq!(gated.organ(1).length(), 4.0);
    }

    #[test]
    fn emergence_step_only_grows_after_emergence() {
        let seed = crate::config::SeedRandomParameter {
            max_b: 1,
            first_b: 2.0,
            ..crate::config::SeedRandomParameter::default()
        };
        let tap = axis(10.0, 2.0, GrowthLaw::NegativeExponential);
        let mut plant = Plant::new(OrganTypeTable::new(seed).with_type(tap), 1).unwrap();
        plant.simulate(3.0).unwrap();

        let basal = plant.organ(2);
        assert_eq!(basal.age(), 1.0);
        assert!((basal.length() - plant.calc_length(2, 1.0)).abs() < 1e-12);
        assert!((plant.organ(1).length() - plant.calc_length(1, 3.0)).abs() < 1e-12);
    }

    #[test]
    fn zero_step_only_resets_bookkeeping() {
        let mut plant = branched(BranchingPolicy::Alternate);
        plant.simulate(0.5).unwrap();
        plant.simulate(0.1).unwrap();
        plant.simulate(0.1).unwrap();
        assert!(plant.organ(1).has_moved());

        let before = plant.clone();
        plant.simulate(0.0).unwrap();
        assert_eq!(plant.len(), before.len());
        for (a, b) in plant.organs().iter().zip(before.organs()) {
            assert_eq!(a.age(), b.age());
            assert_eq!(a.length(), b.length());
            assert_eq!(a.relative_nodes(), b.relative_nodes());
            assert!(!a.has_moved());
            assert_eq!(a.old_node_count(), a.node_count());
        }
    }

    #[test]
    fn emergence_probability_zero_keeps_organ_dormant() {
        let tap = OrganRandomParameter {
            emergence_probability: Some(Arc::new(Constant(0.0))),
            ..axis(10.0, 1.0, GrowthLaw::Linear)
        };
        let mut plant = Plant::new(OrganTypeTable::default().with_type(tap), 1).unwrap();
        for _ in 0..5 {
            plant.simulate(1.0).unwrap();
        }
        assert_eq!(plant.organ(1).age(), 0.0);
        assert_eq!(plant.organ(1).length(), 0.0);
        assert_eq!(plant.organ(1).node_count(), 1);
    }

    #[test]
    fn elongation_scale_slows_growth() {
        let tap = OrganRandomParameter {
            elongation_scale: Some(Arc::new(Constant(0.5))),
            ..axis(10.0, 1.0, GrowthLaw::Linear)
        };
        let mut plant = Plant::new(OrganTypeTable::default().with_type(tap), 1).unwrap();
        plant.simulate(2.0).unwrap();
        assert_eq!(plant.organ(1).length(), 1.0);
        plant.simulate(2.0).unwrap();
        assert_eq!(plant.organ(1).length(), 2.0);
        assert_eq!(plant.organ(1).age(), 4.0);
    }

    #[test]
    fn same_seed_same_plant() {
        let build = || {
            let tap = OrganRandomParameter {
                lb: 1.0,
                ln: 1.5,
                ln_dev: 0.3,
                nob: 5.0,
                theta_dev: 0.2,
                beta_dev: 2.0,
                successors: vec![Successor::new(OrganKind::Root, 2, 1.0)],
                tropism: crate::tropism::Tropism::new(
                    crate::tropism::TropismKind::Gravitropism,
                    1.0,
                    0.3,
                ),
                ..axis(2.0, 1.0, GrowthLaw::NegativeExponential)
            };
            let lateral = OrganRandomParameter {
                subtype: 2,
                ..axis(3.0, 1.0, GrowthLaw::Linear)
            };
            let mut plant =
                Plant::new(OrganTypeTable::default().with_type(tap).with_type(lateral), 42).unwrap();
            for _ in 0..20 {
                plant.simulate(0.5).unwrap();
            }
            plant
        };
        let (a, b) = (build(), build());
        assert_eq!(a.len(), b.len());
        for id in 0..a.len() {
            assert_eq!(a.nodes(id), b.nodes(id));
        }
    }
}
