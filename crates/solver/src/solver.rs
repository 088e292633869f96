use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use epicycle_types::Model;

use crate::linalg;
use crate::system::{LinearSystem, SystemClass};

/// Structural problems in a model. Expected states such as missing or
/// conflicting constraints are reported through [`SolveOutcome`] instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SolveError {
    #[error("element not found for variable {var}")]
    ElementNotFound { var: String },
    #[error("element {element} has no tooth count")]
    MissingToothCount { element: String },
    #[error("unknown variable {var}")]
    UnknownVariable { var: String },
    #[error("known speed for {var} is not finite: {value}")]
    InvalidValue { var: String, value: f64 },
    #[error("normal equations are singular despite full rank")]
    Singular,
}

/// Configuration for the kinematic solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverConfig {
    /// Smallest magnitude accepted as a pivot when computing ranks.
    pub pivot_tolerance: f64,
    /// Ratio denominators smaller than this yield NaN.
    pub ratio_epsilon: f64,
    /// Relative pivot threshold when solving the normal equations.
    pub singular_tolerance: f64,
    /// Residual correction passes after the least-squares solve.
    pub refinement_steps: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pivot_tolerance: 1e-9,
            ratio_epsilon: 1e-12,
            singular_tolerance: 1e-14,
            refinement_steps: 2,
        }
    }
}

/// A reported ratio between two solved speeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioValue {
    pub id: String,
    pub num_var: String,
    pub den_var: String,
    /// NaN when the denominator is (numerically) zero.
    pub value: f64,
}

/// Speeds of every variable plus the requested ratios.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Solution {
    /// Speed in rpm keyed by variable name.
    pub velocities: BTreeMap<String, f64>,
    pub ratios: Vec<RatioValue>,
}

impl Solution {
    pub fn velocity(&self, var: &str) -> Option<f64> {
        self.velocities.get(var).copied()
    }

    pub fn ratio(&self, id: &str) -> Option<f64> {
        self.ratios.iter().find(|r| r.id == id).map(|r| r.value)
    }
}

/// Outcome of a solve. Only [`SolveOutcome::Solved`] carries speeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SolveOutcome {
    Solved(Solution),
    Underdetermined {
        #[serde(rename = "missingConstraints")]
        missing_constraints: usize,
    },
    /// `conflicting` is an upper-bound hint, not an exact count.
    Overdetermined {
        #[serde(rename = "conflictingConstraints")]
        conflicting_constraints: usize,
    },
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved(_))
    }
}

/// `num / den`, or NaN when `|den| < epsilon`.
pub fn ratio(num: f64, den: f64, epsilon: f64) -> f64 {
    if den.abs() < epsilon { f64::NAN } else { num / den }
}

/// Solve a model for the angular velocity of every variable.
///
/// Builds the stacked mesh/constraint system, compares `rank(A)` with
/// `rank([A|b])`, and for a full-rank consistent system returns the
/// least-squares solution. Least squares is used even when the system is
/// square because equation emission routinely produces redundant rows.
#[instrument(skip(model, config), fields(
    elements = model.elements.len(),
    meshes = model.meshes.len(),
    constraints = model.constraints.len(),
))]
pub fn solve(model: &Model, config: &SolverConfig) -> Result<SolveOutcome, SolveError> {
    let system = LinearSystem::from_model(model)?;

    for request in &model.ratio_requests {
        for var in [&request.num_var, &request.den_var] {
            if system.vars.id(var).is_none() {
                return Err(SolveError::UnknownVariable { var: var.clone() });
            }
        }
    }

    let analysis = system.analyze(config.pivot_tolerance);
    debug!(
        rows = analysis.rows,
        unknowns = analysis.unknowns,
        rank = analysis.rank,
        rank_augmented = analysis.rank_augmented,
        "rank analysis"
    );

    match analysis.classify() {
        SystemClass::Overdetermined { conflicting } => {
            info!(conflicting, "system is overdetermined");
            return Ok(SolveOutcome::Overdetermined {
                conflicting_constraints: conflicting,
            });
        }
        SystemClass::Underdetermined { missing } => {
            info!(missing, "system is underdetermined");
            return Ok(SolveOutcome::Underdetermined {
                missing_constraints: missing,
            });
        }
        SystemClass::Determined => {}
    }

    let omega = linalg::least_squares(
        &system.a,
        &system.b,
        config.singular_tolerance,
        config.refinement_steps,
    )
    .ok_or(SolveError::Singular)?;

    let velocities: BTreeMap<String, f64> = system
        .vars
        .iter()
        .map(|(id, name)| (name.to_string(), omega[id.index()]))
        .collect();

    let ratios = model
        .ratio_requests
        .iter()
        .map(|request| {
            let num = velocities[&request.num_var];
            let den = velocities[&request.den_var];
            RatioValue {
                id: request.id.clone(),
                num_var: request.num_var.clone(),
                den_var: request.den_var.clone(),
                value: ratio(num, den, config.ratio_epsilon),
            }
        })
        .collect();

    info!(unknowns = analysis.unknowns, "system solved");
    Ok(SolveOutcome::Solved(Solution { velocities, ratios }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use epicycle_types::{Constraint, Element, ElementKind, Engagement, Mesh, MeshKind, RatioRequest};

    /// Sun 20, planet 20, ring 60 on carrier `wc`.
    fn simple_stage() -> Model {
        let mut model = Model::new();
        model.add_element(Element::new("sun", ElementKind::Sun, Some(20), "ws"));
        model.add_element(Element::new("planet", ElementKind::Planet, Some(20), "wp"));
        model.add_element(Element::new("ring", ElementKind::Ring, Some(60), "wa"));
        model.add_element(Element::new("carrier", ElementKind::Carrier, None, "wc"));
        model.add_mesh(Mesh::new("ws", "wp", "wc", MeshKind::External));
        model.add_mesh(Mesh::new("wp", "wa", "wc", MeshKind::Internal));
        model
    }

    fn solved(outcome: SolveOutcome) -> Solution {
        match outcome {
            SolveOutcome::Solved(solution) => solution,
            other => panic!("expected a solution, got {:?}", other),
        }
    }

    #[test]
    fn test_locked_ring_reduction() {
        let mut model = simple_stage();
        model.add_constraint(Constraint::known("ws", 10.0));
        model.add_constraint(Constraint::lock("wa"));
        model.add_ratio(RatioRequest::new("in_out", "ws", "wc"));

        let solution = solved(solve(&model, &SolverConfig::default()).unwrap());
        assert_relative_eq!(solution.velocity("wc").unwrap(), 2.5, epsilon = 1e-9);
        assert_relative_eq!(solution.velocity("wa").unwrap(), 0.0, epsilon = 1e-9);
        // Planet relative to carrier: 20·(10 − 2.5) = −20·(ωp − 2.5)
        assert_relative_eq!(solution.velocity("wp").unwrap(), -5.0, epsilon = 1e-9);
        assert_relative_eq!(solution.ratio("in_out").unwrap(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_locked_carrier_reverses_ring() {
        let mut model = simple_stage();
        model.add_constraint(Constraint::known("ws", 30.0));
        model.add_constraint(Constraint::lock("wc"));

        let solution = solved(solve(&model, &SolverConfig::default()).unwrap());
        assert_relative_eq!(solution.velocity("wa").unwrap(), -10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_underdetermined_counts_missing() {
        let mut model = simple_stage();
        model.add_constraint(Constraint::known("ws", 10.0));

        match solve(&model, &SolverConfig::default()).unwrap() {
            SolveOutcome::Underdetermined { missing_constraints } => assert_eq!(missing_constraints, 1),
            other => panic!("expected underdetermined, got {:?}", other),
        }
    }

    #[test]
    fn test_conflicting_knowns() {
        let mut model = simple_stage();
        model.add_constraint(Constraint::known("ws", 10.0));
        model.add_constraint(Constraint::known("ws", 12.0));
        model.add_constraint(Constraint::lock("wa"));

        match solve(&model, &SolverConfig::default()).unwrap() {
            SolveOutcome::Overdetermined { conflicting_constraints } => {
                assert!(conflicting_constraints >= 1)
            }
            other => panic!("expected overdetermined, got {:?}", other),
        }
    }

    #[test]
    fn test_consistent_redundancy_still_solves() {
        let mut model = simple_stage();
        model.add_constraint(Constraint::known("ws", 10.0));
        model.add_constraint(Constraint::known("ws", 10.0));
        model.add_constraint(Constraint::lock("wa"));

        let solution = solved(solve(&model, &SolverConfig::default()).unwrap());
        assert_relative_eq!(solution.velocity("wc").unwrap(), 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_denominator_ratio_is_nan() {
        let mut model = simple_stage();
        model.add_constraint(Constraint::known("ws", 10.0));
        model.add_constraint(Constraint::lock("wa"));
        model.add_ratio(RatioRequest::new("over_ring", "ws", "wa"));

        let solution = solved(solve(&model, &SolverConfig::default()).unwrap());
        let value = solution.ratio("over_ring").unwrap();
        assert!(value.is_nan());
        assert!(!value.is_infinite());
    }

    #[test]
    fn test_raw_sign_matches_kind() {
        let mut by_sign = simple_stage();
        by_sign.meshes[1].engagement = Engagement::Sign { sign: -1.0 };
        by_sign.add_constraint(Constraint::known("ws", 10.0));
        by_sign.add_constraint(Constraint::lock("wa"));

        let solution = solved(solve(&by_sign, &SolverConfig::default()).unwrap());
        assert_relative_eq!(solution.velocity("wc").unwrap(), 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_element_is_error() {
        let mut model = simple_stage();
        model.add_mesh(Mesh::new("wp", "w_missing", "wc", MeshKind::External));
        let err = solve(&model, &SolverConfig::default()).unwrap_err();
        assert_eq!(err, SolveError::ElementNotFound { var: "w_missing".to_string() });
    }

    #[test]
    fn test_missing_teeth_is_error() {
        let mut model = simple_stage();
        model.elements[1].teeth = None;
        let err = solve(&model, &SolverConfig::default()).unwrap_err();
        assert_eq!(err, SolveError::MissingToothCount { element: "planet".to_string() });
    }

    #[test]
    fn test_ratio_with_unknown_variable_is_error() {
        let mut model = simple_stage();
        model.add_ratio(RatioRequest::new("r", "ws", "w_nowhere"));
        assert!(matches!(
            solve(&model, &SolverConfig::default()),
            Err(SolveError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn test_empty_model_solves_trivially() {
        let solution = solved(solve(&Model::new(), &SolverConfig::default()).unwrap());
        assert!(solution.velocities.is_empty());
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(SolveOutcome::Underdetermined { missing_constraints: 2 }).unwrap();
        assert_eq!(json["status"], "underdetermined");
        assert_eq!(json["missingConstraints"], 2);

        let json = serde_json::to_value(SolveOutcome::Solved(Solution::default())).unwrap();
        assert_eq!(json["status"], "solved");
        assert!(json["velocities"].is_object());
    }
}
