//! One-shot evaluation of a transmission.
//!
//! Stages are validated, laid out and phased independently; the model is
//! built once and handed to the topology check and the solver. Nothing is
//! cached between calls.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use epicycle_solver::{SolveError, SolveOutcome, solve};
use epicycle_types::{AssemblyStatus, StageSpec, Transmission};

use crate::builder::{BuildError, build_model};
use crate::layout::{StageLayout, stage_layout};
use crate::phasing::{PhasingError, PhasingInput, PhasingResult, compute_phasing};
use crate::topology::{TopologyReport, analyze_topology};
use crate::{EvaluationConfig, validate_stage_assembly};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    #[error("model build failed: {0}")]
    Build(#[from] BuildError),
    #[error("solve failed: {0}")]
    Solve(#[from] SolveError),
    #[error("phasing failed: {0}")]
    Phasing(#[from] PhasingError),
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub id: u32,
    pub assembly: AssemblyStatus,
    pub layout: StageLayout,
    pub phasing: PhasingResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub stages: Vec<StageReport>,
    pub topology: TopologyReport,
    pub solve: SolveOutcome,
}

impl Evaluation {
    pub fn stage(&self, id: u32) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Velocity of `var` when the model solved.
    pub fn velocity(&self, var: &str) -> Option<f64> {
        self.solve.solution().and_then(|s| s.velocity(var))
    }
}

/// Evaluate every stage, the carrier topology and the kinematics.
#[instrument(skip(transmission, config), fields(stages = transmission.stages.len()))]
pub fn evaluate(transmission: &Transmission, config: &EvaluationConfig) -> Result<Evaluation, EvaluationError> {
    let model = build_model(transmission)?;
    let stages = transmission
        .stages
        .iter()
        .map(|stage| stage_report(stage, config))
        .collect::<Result<Vec<_>, _>>()?;
    let topology = analyze_topology(&model);
    let solve = solve(&model, &config.solver)?;

    info!(
        stages = stages.len(),
        topology = %topology.summary,
        solved = solve.is_solved(),
        "transmission evaluated"
    );
    Ok(Evaluation {
        stages,
        topology,
        solve,
    })
}

fn stage_report(stage: &StageSpec, config: &EvaluationConfig) -> Result<StageReport, PhasingError> {
    let assembly = validate_stage_assembly(stage.sun, &stage.planets, stage.ring, stage.copies);
    if !assembly.valid {
        warn!(stage = stage.id, kind = %assembly.kind, "stage cannot be assembled");
    }
    let layout = stage_layout(stage.sun, &stage.planets, stage.ring, &config.layout);
    let phasing = compute_phasing(
        &PhasingInput {
            stage_id: stage.id,
            sun: stage.sun,
            ring: stage.ring,
            planets: stage.planets.clone(),
            copies: stage.copies,
            base_positions: layout.positions.clone(),
        },
        &config.phasing,
    )?;
    Ok(StageReport {
        id: stage.id,
        assembly,
        layout,
        phasing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use epicycle_types::{AssemblyKind, Coupling, MemberRef, RatioSpec};

    fn simple() -> Transmission {
        Transmission {
            stages: vec![StageSpec::new(1, Some(20), vec![20], Some(60)).with_copies(4)],
            couplings: vec![
                Coupling::Known { member: MemberRef::sun(1), rpm: 10.0 },
                Coupling::Lock { member: MemberRef::ring(1) },
            ],
            ratios: vec![RatioSpec {
                id: "reduction".to_string(),
                num: MemberRef::sun(1),
                den: MemberRef::carrier(1),
            }],
        }
    }

    #[test]
    fn evaluates_simple_stage() {
        let evaluation = evaluate(&simple(), &EvaluationConfig::default()).unwrap();
        assert_relative_eq!(evaluation.velocity("omega_c1").unwrap(), 2.5, epsilon = 1e-9);
        let stage = evaluation.stage(1).unwrap();
        assert_eq!(stage.assembly.kind, AssemblyKind::Straight);
        assert_eq!(stage.phasing.copy_angles.len(), 4);
        assert!(stage.phasing.evenly_spaced);
        assert_eq!(evaluation.topology.summary, AssemblyKind::Straight);
    }

    #[test]
    fn build_errors_propagate() {
        let mut t = simple();
        t.couplings.push(Coupling::Lock { member: MemberRef::sun(7) });
        assert!(matches!(
            evaluate(&t, &EvaluationConfig::default()),
            Err(EvaluationError::Build(BuildError::UnknownStage { stage: 7 }))
        ));
    }

    #[test]
    fn infeasible_stage_still_reports() {
        let mut t = simple();
        t.stages[0].ring = Some(61);
        let evaluation = evaluate(&t, &EvaluationConfig::default()).unwrap();
        assert!(!evaluation.stage(1).unwrap().assembly.valid);
        assert_eq!(evaluation.topology.summary, AssemblyKind::Impossible);
        // Kinematics do not depend on assemblability.
        assert!(evaluation.solve.is_solved());
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let config = EvaluationConfig::default();
        let a = serde_json::to_string(&evaluate(&simple(), &config).unwrap()).unwrap();
        let b = serde_json::to_string(&evaluate(&simple(), &config).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
