//! Structured text reports of an evaluation.
//!
//! Plain text, one line per fact, so a failing scenario can be printed and
//! read directly.

use std::fmt;

use epicycle_bridge::{Locale, kind_label, render};
use epicycle_kernel::Evaluation;
use epicycle_solver::SolveOutcome;

use crate::oracle::OracleVerdict;

/// A complete evaluation report with all sections.
pub struct EvaluationReport {
    pub stage_entries: Vec<StageEntry>,
    pub topology: String,
    pub solve_status: String,
    pub velocities: Vec<(String, f64)>,
    pub ratios: Vec<(String, f64)>,
    pub oracle_results: Vec<OracleVerdict>,
}

/// One stage's report entry.
pub struct StageEntry {
    pub id: u32,
    pub kind: String,
    pub valid: bool,
    pub message: String,
    pub copies: usize,
    pub evenly_spaced: bool,
}

impl EvaluationReport {
    pub fn new(evaluation: &Evaluation, locale: Locale) -> Self {
        let stage_entries = evaluation
            .stages
            .iter()
            .map(|s| StageEntry {
                id: s.id,
                kind: kind_label(s.assembly.kind, locale).to_string(),
                valid: s.assembly.valid,
                message: render(&s.assembly.message, locale),
                copies: s.phasing.copy_angles.len(),
                evenly_spaced: s.phasing.evenly_spaced,
            })
            .collect();

        let (solve_status, velocities, ratios) = match &evaluation.solve {
            SolveOutcome::Solved(solution) => (
                "solved".to_string(),
                solution.velocities.iter().map(|(k, v)| (k.clone(), *v)).collect(),
                solution.ratios.iter().map(|r| (r.id.clone(), r.value)).collect(),
            ),
            SolveOutcome::Underdetermined { missing_constraints } => (
                format!("underdetermined, {missing_constraints} constraint(s) missing"),
                Vec::new(),
                Vec::new(),
            ),
            SolveOutcome::Overdetermined { conflicting_constraints } => (
                format!("overdetermined, about {conflicting_constraints} conflicting"),
                Vec::new(),
                Vec::new(),
            ),
        };

        Self {
            stage_entries,
            topology: kind_label(evaluation.topology.summary, locale).to_string(),
            solve_status,
            velocities,
            ratios,
            oracle_results: Vec::new(),
        }
    }

    pub fn with_oracles(mut self, verdicts: Vec<OracleVerdict>) -> Self {
        self.oracle_results = verdicts;
        self
    }

    /// Format the report as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Epicycle Evaluation Report ===\n\n");

        out.push_str(&format!("Stages ({}):\n", self.stage_entries.len()));
        for entry in &self.stage_entries {
            let flag = if entry.valid { "" } else { " [INVALID]" };
            out.push_str(&format!("  [{}] {}{}\n", entry.id, entry.kind, flag));
            out.push_str(&format!("      {}\n", entry.message));
            let spacing = if entry.evenly_spaced { "even" } else { "uneven" };
            out.push_str(&format!("      Copies: {} ({} spacing)\n", entry.copies, spacing));
        }

        out.push_str(&format!("\nTopology: {}\n", self.topology));
        out.push_str(&format!("Solve: {}\n", self.solve_status));

        if !self.velocities.is_empty() {
            out.push_str("\nVelocities (rpm):\n");
            for (var, value) in &self.velocities {
                out.push_str(&format!("  {var}: {value:.4}\n"));
            }
        }

        if !self.ratios.is_empty() {
            out.push_str("\nRatios:\n");
            for (id, value) in &self.ratios {
                if value.is_nan() {
                    out.push_str(&format!("  {id}: undefined\n"));
                } else {
                    out.push_str(&format!("  {id}: {value:.4}\n"));
                }
            }
        }

        if !self.oracle_results.is_empty() {
            out.push_str(&format!("\nOracle Results ({} checks):\n", self.oracle_results.len()));
            for v in &self.oracle_results {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{}] {}: {}\n", status, v.oracle_name, v.detail));
            }
        }

        out
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
