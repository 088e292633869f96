//! Rich assertion helpers with diagnostic output.
//!
//! Every failure names the context, the expected and actual values, and the
//! solve status, so a failing scenario explains itself.

use epicycle_kernel::Evaluation;
use epicycle_solver::SolveOutcome;
use epicycle_types::AssemblyKind;

use crate::helpers::{HarnessError, close};
use crate::oracle::OracleVerdict;
use crate::workflow::status_label;

/// Assert a solved speed within relative tolerance `tol`.
pub fn assert_velocity(
    evaluation: &Evaluation,
    var: &str,
    expected: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let Some(actual) = evaluation.velocity(var) else {
        return Err(HarnessError::AssertionFailed {
            detail: format!("[{}] no speed for {} ({})", ctx, var, status_label(&evaluation.solve)),
        });
    };
    if close(actual, expected, tol) {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("[{}] {}: expected {:.6}, got {:.6} (tol={})", ctx, var, expected, actual, tol),
        })
    }
}

/// Assert a reported ratio within relative tolerance `tol`.
pub fn assert_ratio(
    evaluation: &Evaluation,
    id: &str,
    expected: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let actual = evaluation
        .solve
        .solution()
        .and_then(|s| s.ratio(id))
        .ok_or_else(|| HarnessError::AssertionFailed {
            detail: format!("[{}] no ratio {} ({})", ctx, id, status_label(&evaluation.solve)),
        })?;
    if close(actual, expected, tol) {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("[{}] ratio {}: expected {:.6}, got {:.6}", ctx, id, expected, actual),
        })
    }
}

/// Assert the solve needs exactly `missing` more constraints.
pub fn assert_missing(evaluation: &Evaluation, missing: usize, ctx: &str) -> Result<(), HarnessError> {
    match evaluation.solve {
        SolveOutcome::Underdetermined { missing_constraints } if missing_constraints == missing => Ok(()),
        ref other => Err(HarnessError::AssertionFailed {
            detail: format!("[{}] expected {} missing, got {}", ctx, missing, status_label(other)),
        }),
    }
}

/// Assert the solve found conflicting constraints.
pub fn assert_overdetermined(evaluation: &Evaluation, ctx: &str) -> Result<(), HarnessError> {
    match evaluation.solve {
        SolveOutcome::Overdetermined { .. } => Ok(()),
        ref other => Err(HarnessError::AssertionFailed {
            detail: format!("[{}] expected overdetermined, got {}", ctx, status_label(other)),
        }),
    }
}

/// Assert one stage's assembly classification.
pub fn assert_stage_kind(
    evaluation: &Evaluation,
    stage: u32,
    expected: AssemblyKind,
    ctx: &str,
) -> Result<(), HarnessError> {
    let report = evaluation
        .stage(stage)
        .ok_or(HarnessError::StageNotFound { id: stage })?;
    if report.assembly.kind == expected {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{}] stage {}: expected {}, got {} ({:?})",
                ctx, stage, expected, report.assembly.kind, report.assembly.message
            ),
        })
    }
}

/// Turn the first failing verdict into an error.
pub fn assert_all_pass(verdicts: &[OracleVerdict]) -> Result<(), HarnessError> {
    match verdicts.iter().find(|v| !v.passed) {
        None => Ok(()),
        Some(v) => Err(HarnessError::OracleFailure {
            oracle: v.oracle_name.clone(),
            detail: v.detail.clone(),
        }),
    }
}
