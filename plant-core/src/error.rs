//! Error type shared by the plant simulation.

use crate::types::OrganKind;

#[derive(Debug, thiserror::Error)]
pub enum PlantError {
    #[error("no parameters registered for {kind} subtype {subtype}")]
    MissingParameter { kind: OrganKind, subtype: i32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
