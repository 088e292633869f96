//! Assembly classification shared by the validator and its consumers.
//!
//! Messages are keys with parameters. Rendering them into a language is the
//! caller's job (see the bridge's locale module).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Geometric class of a stage or carrier path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyKind {
    /// No sun-ring closure to satisfy.
    Open,
    /// Planet centres colinear with the stage axis.
    Straight,
    /// Planet chain bends to reach a smaller ring.
    Curved,
    Impossible,
}

impl fmt::Display for AssemblyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssemblyKind::Open => "open",
            AssemblyKind::Straight => "straight",
            AssemblyKind::Curved => "curved",
            AssemblyKind::Impossible => "impossible",
        };
        f.write_str(s)
    }
}

/// Explanation attached to an [`AssemblyStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", rename_all = "camelCase")]
pub enum AssemblyMessage {
    /// No ring: nothing closes the planet chain.
    OpenStage,
    /// Sun and ring with nothing between them.
    MissingPlanet,
    /// No sun; the ring clears every planet copy.
    RingClearance { ring: u32, required: u64 },
    /// No sun; the ring is too small for the contact planet copies.
    RingTooSmall { ring: u32, required: u64, copies: u32 },
    /// Single planet whose ring size does not match the sun and planet.
    ModulusMismatch { ring: u32, expected: u64 },
    /// Ring exactly at the reach of the planet chain.
    StraightArm { ring: u32, limit: u64 },
    /// Ring inside the reach of the planet chain.
    CurvedArm { ring: u32, limit: u64 },
    /// Ring larger than the planet chain can reach.
    ExceedsReach { ring: u32, limit: u64 },
}

/// Result of validating one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyStatus {
    pub kind: AssemblyKind,
    pub valid: bool,
    pub message: AssemblyMessage,
}

impl AssemblyStatus {
    pub fn new(kind: AssemblyKind, message: AssemblyMessage) -> Self {
        Self {
            kind,
            valid: kind != AssemblyKind::Impossible,
            message,
        }
    }
}
