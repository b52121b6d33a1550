//! Organ type templates.
//!
//! A template holds the mean and standard deviation of every organ
//! parameter for one `(kind, subtype)` pair. Organs draw their own
//! realized parameters from it when they are created.

use std::f64::consts::PI;
use std::sync::Arc;

use glam::DVec3;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::environment::SpatialFunction;
use crate::growth::GrowthLaw;
use crate::parameter::{OrganSpecificParameter, SeedSpecificParameter};
use crate::tropism::Tropism;
use crate::types::OrganKind;

/// Smallest realized inter-lateral distance.
const MIN_SPACING: f64 = 1e-5;

/// How many laterals emerge per branching point and how the distances
/// between branching points evolve along the organ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BranchingPolicy {
    /// No branching zone; the organ is a single axis.
    Unbranched,
    /// One lateral per branching point, constant spacing.
    #[default]
    Alternate,
    /// Two laterals per branching point, constant spacing.
    Opposite,
    /// One lateral per branching point, geometrically decaying spacing.
    DecayingAlternate,
    /// Two laterals per branching point, geometrically decaying spacing.
    DecayingOpposite,
}

impl BranchingPolicy {
    pub fn laterals_per_node(self) -> usize {
        match self {
            BranchingPolicy::Unbranched => 0,
            BranchingPolicy::Alternate | BranchingPolicy::DecayingAlternate => 1,
            BranchingPolicy::Opposite | BranchingPolicy::DecayingOpposite => 2,
        }
    }

    /// Mean distance between branching point `i` and `i + 1`.
    pub fn spacing(self, ln: f64, decay: f64, i: usize) -> f64 {
        match self {
            BranchingPolicy::DecayingAlternate | BranchingPolicy::DecayingOpposite => {
                ln * decay.powi(i as i32)
            }
            _ => ln,
        }
    }
}

/// A lateral organ type that may emerge from a branching point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Successor {
    pub kind: OrganKind,
    pub subtype: i32,
    pub probability: f64,
}

impl Successor {
    pub fn new(kind: OrganKind, subtype: i32, probability: f64) -> Self {
        Self {
            kind,
            subtype,
            probability,
        }
    }
}

/// Template for roots, stems and leaves of one subtype.
///
/// Lengths are in cm, times in days, angles in radians.
#[derive(Clone, Debug)]
pub struct OrganRandomParameter {
    pub kind: OrganKind,
    pub subtype: i32,
    pub name: String,

    /// Basal zone length.
    pub lb: f64,
    pub lb_dev: f64,
    /// Apical zone length.
    pub la: f64,
    pub la_dev: f64,
    /// Inter-lateral distance.
    pub ln: f64,
    pub ln_dev: f64,
    /// Ratio between consecutive distances for the decaying policies.
    pub ln_decay: f64,
    /// Number of branching points.
    pub nob: f64,
    pub nob_dev: f64,
    /// Initial growth rate.
    pub r: f64,
    pub r_dev: f64,
    /// Radius.
    pub a: f64,
    pub a_dev: f64,
    /// Insertion angle relative to the parent heading.
    pub theta: f64,
    pub theta_dev: f64,
    /// Life time.
    pub rlt: f64,
    pub rlt_dev: f64,

    /// Azimuth step per lateral (in units of pi).
    pub rot_beta: f64,
    /// Random azimuth range (in units of pi).
    pub beta_dev: f64,
    /// Constant azimuth offset.
    pub init_beta: f64,

    pub branching: BranchingPolicy,
    pub successors: Vec<Successor>,
    pub growth: GrowthLaw,
    pub tropism: Tropism,

    /// Axial resolution.
    pub dx: f64,
    /// Segments shorter than this are not created.
    pub dx_min: f64,

    /// Scales the elongation at the organ tip; `None` means 1.
    pub elongation_scale: Option<Arc<dyn SpatialFunction>>,
    /// Emergence probability per day at the organ tip; `None` means 1.
    pub emergence_probability: Option<Arc<dyn SpatialFunction>>,
}

impl OrganRandomParameter {
    pub fn new(kind: OrganKind, subtype: i32) -> Self {
        Self {
            kind,
            subtype,
            name: String::new(),
            lb: 0.0,
            lb_dev: 0.0,
            la: 10.0,
            la_dev: 0.0,
            ln: 1.0,
            ln_dev: 0.0,
            ln_decay: 0.9,
            nob: 1.0,
            nob_dev: 0.0,
            r: 1.0,
            r_dev: 0.0,
            a: 0.1,
            a_dev: 0.0,
            theta: 70.0 / 180.0 * PI,
            theta_dev: 0.0,
            rlt: 1e9,
            rlt_dev: 0.0,
            rot_beta: 0.0,
            beta_dev: 2.0,
            init_beta: 0.0,
            branching: BranchingPolicy::default(),
            successors: Vec::new(),
            growth: GrowthLaw::default(),
            tropism: Tropism::default(),
            dx: 0.25,
            dx_min: 1e-6,
            elongation_scale: None,
            emergence_probability: None,
        }
    }

    /// Template of the seed organ itself: it never elongates and never dies.
    pub(crate) fn seed() -> Self {
        Self {
            name: "seed".into(),
            la: 0.0,
            rlt: f64::INFINITY,
            theta: 0.0,
            beta_dev: 0.0,
            branching: BranchingPolicy::Unbranched,
            ..Self::new(OrganKind::Seed, 0)
        }
    }

    /// Draws the realized parameters of one organ.
    ///
    /// Draw order: lb, la, nob, inter-lateral distances, r, a, theta, rlt.
    /// Values with zero deviation consume no random numbers.
    pub fn realize(&self, rng: &mut impl Rng) -> OrganSpecificParameter {
        let lb = jitter(rng, self.lb, self.lb_dev).max(0.0);
        let la = jitter(rng, self.la, self.la_dev).max(0.0);

        let mut ln = Vec::new();
        if self.branching != BranchingPolicy::Unbranched {
            let nob = jitter(rng, self.nob, self.nob_dev).round().max(1.0) as usize;
            ln.reserve(nob - 1);
            for i in 0..nob - 1 {
                let mean = self.branching.spacing(self.ln, self.ln_decay, i);
                ln.push(jitter(rng, mean, self.ln_dev).max(MIN_SPACING));
            }
        }

        let r = jitter(rng, self.r, self.r_dev).max(0.0);
        let a = jitter(rng, self.a, self.a_dev).max(0.0);
        let theta = jitter(rng, self.theta, self.theta_dev).max(0.0);
        let rlt = jitter(rng, self.rlt, self.rlt_dev).max(0.0);

        let k = lb + ln.iter().sum::<f64>() + la;
        OrganSpecificParameter {
            subtype: self.subtype,
            r,
            k,
            lb,
            la,
            ln,
            rlt,
            a,
            theta,
        }
    }

    /// Picks the lateral type for a new branching point.
    ///
    /// A single successor is chosen without drawing; otherwise one uniform
    /// number selects by cumulative probability, and probabilities summing
    /// to less than one leave room for no lateral at all.
    pub fn draw_successor(&self, rng: &mut impl Rng) -> Option<Successor> {
        match self.successors.as_slice() {
            [] => None,
            [only] => Some(*only),
            all => {
                let d = rng.random::<f64>();
                let mut p = 0.0;
                for s in all {
                    p += s.probability;
                    if d <= p {
                        return Some(*s);
                    }
                }
                None
            }
        }
    }
}

/// Template of the seed: where it lies and how many basal roots it emits.
#[derive(Clone, Debug, PartialEq)]
pub struct SeedRandomParameter {
    pub seed_pos: DVec3,
    /// Maximal number of basal roots.
    pub max_b: usize,
    /// Emergence time of the first basal root.
    pub first_b: f64,
    pub first_b_dev: f64,
    /// Time between two basal roots.
    pub delay_b: f64,
    pub delay_b_dev: f64,
    /// Root subtype of the basal roots.
    pub basal_type: i32,
    /// Horizon used to cap the number of basal roots.
    pub simulation_time: f64,
}

impl Default for SeedRandomParameter {
    fn default() -> Self {
        Self {
            seed_pos: DVec3::new(0.0, 0.0, -3.0),
            max_b: 0,
            first_b: 0.0,
            first_b_dev: 0.0,
            delay_b: 0.0,
            delay_b_dev: 0.0,
            basal_type: 4,
            simulation_time: 365.0,
        }
    }
}

impl SeedRandomParameter {
    pub fn realize(&self, rng: &mut impl Rng) -> SeedSpecificParameter {
        let first_b = jitter(rng, self.first_b, self.first_b_dev).max(0.0);
        let delay_b = jitter(rng, self.delay_b, self.delay_b_dev).max(0.0);

        let mut max_b = self.max_b;
        if delay_b > 0.0 {
            let fit = ((self.simulation_time - first_b) / delay_b).ceil().max(0.0) as usize;
            max_b = max_b.min(fit);
        }

        SeedSpecificParameter {
            seed_pos: self.seed_pos,
            max_b,
            first_b,
            delay_b,
            basal_type: self.basal_type,
        }
    }
}

fn jitter(rng: &mut impl Rng, mean: f64, dev: f64) -> f64 {
    if dev > 0.0 {
        let z: f64 = rng.sample(StandardNormal);
        mean + z * dev
    } else {
        mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn lateral_template() -> OrganRandomParameter {
        OrganRandomParameter {
            la: 1.5,
            lb: 5.5,
            ln: 1.25,
            nob: 8.0,
            ..OrganRandomParameter::new(OrganKind::Leaf, 1)
        }
    }

    #[test]
    fn realize_without_deviation_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = lateral_template().realize(&mut rng);

        assert_eq!(p.subtype, 1);
        assert_eq!(p.lb, 5.5);
        assert_eq!(p.la, 1.5);
        assert_eq!(p.ln, vec![1.25; 7]);
        assert!((p.k - (5.5 + 7.0 * 1.25 + 1.5)).abs() < 1e-12);
        assert_eq!(p.a, 0.1);
    }

    #[test]
    fn number_of_distances_is_one_less_than_branches() {
        let mut rng = StdRng::seed_from_u64(11);
        let template = OrganRandomParameter {
            ln_dev: 0.12,
            nob_dev: 2.0,
            ..lateral_template()
        };
        for _ in 0..20 {
            let p = template.realize(&mut rng);
            assert!(p.ln.iter().all(|&d| d >= MIN_SPACING));
            let expected_k = p.lb + p.ln.iter().sum::<f64>() + p.la;
            assert!((p.k - expected_k).abs() < 1e-12);
        }
    }

    #[test]
    fn decaying_policies_shrink_the_spacing() {
        let mut rng = StdRng::seed_from_u64(5);
        let template = OrganRandomParameter {
            branching: BranchingPolicy::DecayingOpposite,
            ln_decay: 0.5,
            ln: 4.0,
            nob: 4.0,
            ..lateral_template()
        };
        let p = template.realize(&mut rng);
        assert_eq!(p.ln, vec![4.0, 2.0, 1.0]);
        assert_eq!(template.branching.laterals_per_node(), 2);
    }

    #[test]
    fn unbranched_organs_have_no_branching_zone() {
        let mut rng = StdRng::seed_from_u64(5);
        let template = OrganRandomParameter {
            branching: BranchingPolicy::Unbranched,
            lb: 2.0,
            la: 3.0,
            ..OrganRandomParameter::new(OrganKind::Root, 2)
        };
        let p = template.realize(&mut rng);
        assert!(p.ln.is_empty());
        assert_eq!(p.k, 5.0);
        assert_eq!(template.branching.laterals_per_node(), 0);
    }

    #[test]
    fn single_successor_is_chosen_without_drawing() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut untouched = StdRng::seed_from_u64(9);
        let template = OrganRandomParameter {
            successors: vec![Successor::new(OrganKind::Root, 2, 1.0)],
            ..OrganRandomParameter::new(OrganKind::Root, 1)
        };

        let s = template.draw_successor(&mut rng).unwrap();
        assert_eq!(s.subtype, 2);
        assert_eq!(rng.random::<u64>(), untouched.random::<u64>());
    }

    #[test]
    fn successor_probabilities_are_cumulative() {
        let mut rng = StdRng::seed_from_u64(21);
        let template = OrganRandomParameter {
            successors: vec![
                Successor::new(OrganKind::Leaf, 4, 0.4),
                Successor::new(OrganKind::Leaf, 5, 0.1),
                Successor::new(OrganKind::Leaf, 6, 0.5),
            ],
            ..OrganRandomParameter::new(OrganKind::Stem, 1)
        };

        let mut counts = [0usize; 3];
        for _ in 0..2000 {
            let s = template.draw_successor(&mut rng).unwrap();
            counts[(s.subtype - 4) as usize] += 1;
        }
        assert!(counts[0] > 650 && counts[0] < 950, "{counts:?}");
        assert!(counts[1] > 120 && counts[1] < 290, "{counts:?}");
        assert!(counts[2] > 850 && counts[2] < 1150, "{counts:?}");
    }

    #[test]
    fn missing_probability_mass_means_no_lateral() {
        let mut rng = StdRng::seed_from_u64(2);
        let template = OrganRandomParameter {
            successors: vec![
                Successor::new(OrganKind::Root, 2, 0.0),
                Successor::new(OrganKind::Root, 3, 0.0),
            ],
            ..OrganRandomParameter::new(OrganKind::Root, 1)
        };
        assert!(template.draw_successor(&mut rng).is_none());
    }

    #[test]
    fn basal_root_count_is_capped_by_the_horizon() {
        let mut rng = StdRng::seed_from_u64(1);
        let seed = SeedRandomParameter {
            max_b: 100,
            first_b: 5.0,
            delay_b: 10.0,
            simulation_time: 50.0,
            ..SeedRandomParameter::default()
        };
        let p = seed.realize(&mut rng);
        assert_eq!(p.max_b, 5);
        assert_eq!(p.first_b, 5.0);
    }
}
