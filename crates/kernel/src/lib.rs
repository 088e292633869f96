pub mod assembly;
pub mod builder;
pub mod layout;
pub mod phasing;
pub mod pipeline;
pub mod topology;

use serde::{Deserialize, Serialize};

pub use epicycle_solver::SolverConfig;

// Re-export the main entry points at crate root for convenience.
pub use assembly::validate_stage_assembly;
pub use builder::{BuildError, build_model};
pub use layout::{StageLayout, stage_layout};
pub use phasing::{PhasingError, PhasingInput, PhasingResult, compute_phasing};
pub use pipeline::{Evaluation, EvaluationError, StageReport, evaluate};
pub use topology::{TopologyReport, analyze_topology};

/// Upper bound on planet chain copies around one carrier.
pub const MAX_COPIES: u32 = 5;

/// Geometry parameters for carrier layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Gear module: pitch diameter per tooth.
    pub module: f64,
    /// Bisection steps for the bend angle of 3+ planet chains.
    pub bisection_steps: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            module: 1.0,
            bisection_steps: 32,
        }
    }
}

/// Parameters for copy placement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhasingConfig {
    pub max_copies: u32,
}

impl Default for PhasingConfig {
    fn default() -> Self {
        Self {
            max_copies: MAX_COPIES,
        }
    }
}

/// Everything one evaluation needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub solver: SolverConfig,
    pub layout: LayoutConfig,
    pub phasing: PhasingConfig,
}

/// Reduce an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let wrapped = ((angle % tau) + tau) % tau;
    // `x % τ + τ` can round up to exactly τ for tiny negative x.
    if wrapped >= tau { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn normalize_wraps_both_directions() {
        assert!((normalize_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((normalize_angle(5.0 * PI) - PI).abs() < 1e-12);
        assert_eq!(normalize_angle(TAU), 0.0);
        assert_eq!(normalize_angle(0.0), 0.0);
    }

    #[test]
    fn normalize_tiny_negative_stays_in_range() {
        let a = normalize_angle(-1e-18);
        assert!((0.0..TAU).contains(&a));
    }
}
