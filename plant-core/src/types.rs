use std::fmt;
use std::str::FromStr;

use crate::error::PlantError;

/// Identifier for an organ in a [`crate::plant::Plant`].
///
/// This is an index into the plant's organ arena. Ids are handed out in
/// creation order and are only meaningful within the `Plant` that
/// created them (or a clone of it).
pub type OrganId = usize;

/// Identifier for a geometry node.
///
/// Node ids are unique per physical node of a plant. The first node of a
/// lateral is the parent's node it emerges from, so it carries the
/// parent's id.
pub type NodeId = usize;

/// The closed set of organ variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrganKind {
    Seed,
    Root,
    Stem,
    Leaf,
}

impl OrganKind {
    /// Numeric organ type code (seed 1, root 2, stem 3, leaf 4).
    pub fn code(self) -> i32 {
        match self {
            OrganKind::Seed => 1,
            OrganKind::Root => 2,
            OrganKind::Stem => 3,
            OrganKind::Leaf => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OrganKind::Seed => "seed",
            OrganKind::Root => "root",
            OrganKind::Stem => "stem",
            OrganKind::Leaf => "leaf",
        }
    }
}

impl fmt::Display for OrganKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selects organs in tree queries.
///
/// `Organ` matches every kind, `Shoot` matches stems and leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrganFilter {
    Organ,
    Seed,
    Root,
    Stem,
    Leaf,
    Shoot,
}

impl OrganFilter {
    pub fn matches(self, kind: OrganKind) -> bool {
        match self {
            OrganFilter::Organ => true,
            OrganFilter::Seed => kind == OrganKind::Seed,
            OrganFilter::Root => kind == OrganKind::Root,
            OrganFilter::Stem => kind == OrganKind::Stem,
            OrganFilter::Leaf => kind == OrganKind::Leaf,
            OrganFilter::Shoot => matches!(kind, OrganKind::Stem | OrganKind::Leaf),
        }
    }
}

impl From<OrganKind> for OrganFilter {
    fn from(kind: OrganKind) -> Self {
        match kind {
            OrganKind::Seed => OrganFilter::Seed,
            OrganKind::Root => OrganFilter::Root,
            OrganKind::Stem => OrganFilter::Stem,
            OrganKind::Leaf => OrganFilter::Leaf,
        }
    }
}

/// Converts a numeric organ type code: 0 is any organ, 1–4 follow
/// [`OrganKind::code`], 5 is the shoot (stem or leaf).
impl TryFrom<i32> for OrganFilter {
    type Error = PlantError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(OrganFilter::Organ),
            1 => Ok(OrganFilter::Seed),
            2 => Ok(OrganFilter::Root),
            3 => Ok(OrganFilter::Stem),
            4 => Ok(OrganFilter::Leaf),
            5 => Ok(OrganFilter::Shoot),
            _ => Err(PlantError::InvalidArgument(format!(
                "unknown organ type code {code}"
            ))),
        }
    }
}

impl FromStr for OrganFilter {
    type Err = PlantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organ" => Ok(OrganFilter::Organ),
            "seed" => Ok(OrganFilter::Seed),
            "root" => Ok(OrganFilter::Root),
            "stem" => Ok(OrganFilter::Stem),
            "leaf" => Ok(OrganFilter::Leaf),
            "shoot" => Ok(OrganFilter::Shoot),
            _ => Err(PlantError::InvalidArgument(format!(
                "unknown organ type name {s:?}"
            ))),
        }
    }
}
