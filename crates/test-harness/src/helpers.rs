//! Shared error type, member shorthands and float helpers.

use thiserror::Error;

use epicycle_types::{MemberRef, StageSpec};

/// Errors from harness operations.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("stage not found: {id}")]
    StageNotFound { id: u32 },

    #[error("duplicate stage: {id}")]
    DuplicateStage { id: u32 },

    #[error("dispatch error: {message}")]
    DispatchError { message: String },

    #[error("not solved: {status}")]
    NotSolved { status: String },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },
}

// ── Member Shorthands ───────────────────────────────────────────────────────

pub fn sun(stage: u32) -> MemberRef {
    MemberRef::sun(stage)
}

pub fn ring(stage: u32) -> MemberRef {
    MemberRef::ring(stage)
}

pub fn carrier(stage: u32) -> MemberRef {
    MemberRef::carrier(stage)
}

/// Planet at zero-based chain position `index`.
pub fn planet(stage: u32, index: usize) -> MemberRef {
    MemberRef::planet(stage, index)
}

// ── Stage Presets ───────────────────────────────────────────────────────────

/// Single-planet stage whose ring closes the chain exactly.
pub fn simple_stage(id: u32, sun: u32, planet: u32) -> StageSpec {
    StageSpec::new(id, Some(sun), vec![planet], Some(sun + 2 * planet))
}

/// Two-planet stage with the ring `shrink` teeth inside the chain reach.
pub fn double_planet_stage(id: u32, sun: u32, p1: u32, p2: u32, shrink: u32) -> StageSpec {
    let reach = sun + 2 * (p1 + p2);
    StageSpec::new(id, Some(sun), vec![p1, p2], Some(reach - shrink))
}

// ── Float Helpers ───────────────────────────────────────────────────────────

/// Relative-or-absolute closeness used by all speed assertions.
pub fn close(actual: f64, expected: f64, tol: f64) -> bool {
    (actual - expected).abs() <= tol * (1.0 + expected.abs())
}
