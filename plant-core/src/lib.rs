//! Core organ growth and branching library.
//!
//! A [`Plant`] is a tree of organs (seed, roots, stems, leaves) growing
//! from a seed. Each organ elongates along an analytical growth law,
//! branches at fixed distances along its axis and discretizes its growth
//! into polyline nodes with exact creation times.
//!
//! Main components:
//! - [`types`]: organ kinds, filters and ids.
//! - [`geometry`]: orthonormal frames and heading rotations.
//! - [`growth`]: growth laws and their inverses.
//! - [`config`]: organ type templates (mean and deviation per parameter).
//! - [`parameter`]: realized organ parameters and the type table.
//! - [`tropism`]: stochastic steering of new segments.
//! - [`environment`]: spatial functions for impedance and emergence.
//! - [`organ`]: a single organ with its relative geometry.
//! - [`plant`]: the organ arena, seed initialization and absolute geometry.
//! - [`simulate`]: time stepping, elongation and lateral creation.
//! - [`segments`]: discretization of growth into nodes.
//! - [`query`]: organ collection and scalar attributes.
//! - [`export`]: polylines and RSML output.
//! - [`error`]: the crate's error type.

pub mod config;
pub mod environment;
pub mod error;
pub mod export;
pub mod geometry;
pub mod growth;
pub mod organ;
pub mod parameter;
pub mod plant;
pub mod query;
pub mod segments;
pub mod simulate;
pub mod tropism;
pub mod types;

pub use config::{BranchingPolicy, OrganRandomParameter, SeedRandomParameter, Successor};
pub use error::PlantError;
pub use export::{Polyline, write_rsml};
pub use growth::{GrowthLaw, SampledCurve};
pub use organ::Organ;
pub use parameter::{OrganSpecificParameter, OrganTypeTable, SeedSpecificParameter};
pub use plant::Plant;
pub use query::OrganScalar;
pub use tropism::{Tropism, TropismKind};
pub use types::{NodeId, OrganFilter, OrganId, OrganKind};
