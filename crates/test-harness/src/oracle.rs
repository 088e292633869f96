//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics,
//! so a test can collect every failure in one pass.

use std::f64::consts::TAU;

use epicycle_kernel::Evaluation;
use epicycle_solver::Solution;
use epicycle_types::{Constraint, Model};

use crate::helpers::close;

const SPEED_TOL: f64 = 1e-9;
const LENGTH_TOL: f64 = 1e-9;

/// The result of a single oracle check.
#[derive(Debug, Clone)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: Some(value),
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: Some(value),
        }
    }
}

// ── Kinematic Oracles ───────────────────────────────────────────────────────

fn solved<'a>(name: &str, evaluation: &'a Evaluation) -> Result<&'a Solution, OracleVerdict> {
    evaluation
        .solve
        .solution()
        .ok_or_else(|| OracleVerdict::fail(name, "model is not solved".to_string()))
}

/// Every mesh equation holds for the solved speeds.
pub fn check_mesh_equations(model: &Model, evaluation: &Evaluation) -> OracleVerdict {
    const NAME: &str = "mesh_equations";
    let solution = match solved(NAME, evaluation) {
        Ok(s) => s,
        Err(verdict) => return verdict,
    };

    let mut worst = 0.0_f64;
    let mut offenders = Vec::new();
    for mesh in &model.meshes {
        let teeth = |var: &str| model.element_by_var(var).and_then(|e| e.teeth).unwrap_or(0) as f64;
        let speed = |var: &str| solution.velocity(var).unwrap_or(f64::NAN);
        let wc = speed(&mesh.carrier_var);
        let residual = teeth(&mesh.i) * (speed(&mesh.i) - wc)
            + mesh.engagement.sign() * teeth(&mesh.j) * (speed(&mesh.j) - wc);
        let scale = teeth(&mesh.i) * (1.0 + speed(&mesh.i).abs() + wc.abs());
        let relative = residual.abs() / scale.max(1.0);
        if relative.is_nan() || relative > SPEED_TOL {
            offenders.push(format!("{}-{}: {:.3e}", mesh.i, mesh.j, residual));
        }
        worst = worst.max(relative);
    }

    if offenders.is_empty() {
        OracleVerdict::pass_val(
            NAME,
            format!("all {} meshes balanced (worst {:.1e})", model.meshes.len(), worst),
            worst,
        )
    } else {
        OracleVerdict::fail_val(NAME, format!("unbalanced meshes: {}", offenders.join(", ")), worst)
    }
}

/// Every known, equal and lock constraint holds.
pub fn check_constraints(model: &Model, evaluation: &Evaluation) -> OracleVerdict {
    const NAME: &str = "constraints";
    let solution = match solved(NAME, evaluation) {
        Ok(s) => s,
        Err(verdict) => return verdict,
    };
    let speed = |var: &str| solution.velocity(var).unwrap_or(f64::NAN);

    let violated: Vec<String> = model
        .constraints
        .iter()
        .filter(|c| match c {
            Constraint::Known { var, value } => !close(speed(var), *value, SPEED_TOL),
            Constraint::Equal { a, b } => !close(speed(a), speed(b), SPEED_TOL),
            Constraint::Lock { var } => !close(speed(var), 0.0, SPEED_TOL),
        })
        .map(|c| format!("{c:?}"))
        .collect();

    if violated.is_empty() {
        OracleVerdict::pass(NAME, format!("all {} constraints hold", model.constraints.len()))
    } else {
        OracleVerdict::fail(NAME, format!("violated: {}", violated.join("; ")))
    }
}

// ── Geometry Oracles ────────────────────────────────────────────────────────

/// Neighbouring planet centres sit exactly one pitch-radius sum apart.
pub fn check_layout_meshing(evaluation: &Evaluation) -> OracleVerdict {
    const NAME: &str = "layout_meshing";
    let mut worst = 0.0_f64;
    let mut offenders = Vec::new();

    for stage in &evaluation.stages {
        let layout = &stage.layout;
        for k in 1..layout.positions.len() {
            let (Some(a), Some(b)) = (layout.center(k - 1), layout.center(k)) else {
                continue;
            };
            let error = ((b - a).norm() - (layout.planet_radii[k - 1] + layout.planet_radii[k])).abs();
            if error > LENGTH_TOL {
                offenders.push(format!("stage {} link {}: {:.3e}", stage.id, k, error));
            }
            worst = worst.max(error);
        }
    }

    if offenders.is_empty() {
        OracleVerdict::pass_val(NAME, format!("all planet links in mesh (worst {worst:.1e})"), worst)
    } else {
        OracleVerdict::fail_val(NAME, offenders.join(", "), worst)
    }
}

/// Copy angles are normalized and pairwise distinct on every stage.
pub fn check_copy_angles(evaluation: &Evaluation) -> OracleVerdict {
    const NAME: &str = "copy_angles";
    let mut problems = Vec::new();

    for stage in &evaluation.stages {
        let angles = &stage.phasing.copy_angles;
        if let Some(a) = angles.iter().find(|a| !(0.0..TAU).contains(*a)) {
            problems.push(format!("stage {}: angle {} out of range", stage.id, a));
        }
        for i in 0..angles.len() {
            for j in i + 1..angles.len() {
                if (angles[i] - angles[j]).abs() < 1e-9 {
                    problems.push(format!("stage {}: copies {} and {} coincide", stage.id, i, j));
                }
            }
        }
    }

    if problems.is_empty() {
        OracleVerdict::pass(NAME, format!("{} stages placed", evaluation.stages.len()))
    } else {
        OracleVerdict::fail(NAME, problems.join("; "))
    }
}

/// Every gear phase is finite and in `[0, 2π)`.
pub fn check_phases_normalized(evaluation: &Evaluation) -> OracleVerdict {
    const NAME: &str = "phases_normalized";
    let mut count = 0;
    let mut bad = Vec::new();

    for stage in &evaluation.stages {
        for (key, phase) in &stage.phasing.gear_phases {
            count += 1;
            if !phase.is_finite() || !(0.0..TAU).contains(phase) {
                bad.push(format!("{key} = {phase}"));
            }
        }
    }

    if bad.is_empty() {
        OracleVerdict::pass(NAME, format!("{count} phases in range"))
    } else {
        OracleVerdict::fail(NAME, bad.join(", "))
    }
}

// ── Aggregate ───────────────────────────────────────────────────────────────

/// Geometry oracles only; valid for any evaluation.
pub fn run_geometry_checks(evaluation: &Evaluation) -> Vec<OracleVerdict> {
    vec![
        check_layout_meshing(evaluation),
        check_copy_angles(evaluation),
        check_phases_normalized(evaluation),
    ]
}

/// Kinematic and geometry oracles.
pub fn run_all_checks(model: &Model, evaluation: &Evaluation) -> Vec<OracleVerdict> {
    let mut verdicts = vec![
        check_mesh_equations(model, evaluation),
        check_constraints(model, evaluation),
    ];
    verdicts.extend(run_geometry_checks(evaluation));
    verdicts
}
