//! Equation emission: a [`Model`] becomes a dense system `A·ω = b`.

use nalgebra::{DMatrix, DVector};

use epicycle_types::{Constraint, Model, VarId, VarTable};

use crate::linalg;
use crate::solver::SolveError;

/// Where a row of the system came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    Mesh(usize),
    Constraint(usize),
}

/// The stacked linear system for one model.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub vars: VarTable,
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
    pub sources: Vec<RowSource>,
}

/// Ranks of `A` and `[A|b]` plus the system's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankAnalysis {
    pub rows: usize,
    pub unknowns: usize,
    pub rank: usize,
    pub rank_augmented: usize,
}

/// Classification of a system by its ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemClass {
    Determined,
    Underdetermined { missing: usize },
    Overdetermined { conflicting: usize },
}

impl RankAnalysis {
    /// Inconsistency wins over rank deficiency.
    pub fn classify(&self) -> SystemClass {
        if self.rank_augmented > self.rank {
            SystemClass::Overdetermined {
                conflicting: self.conflict_estimate(),
            }
        } else if self.rank < self.unknowns {
            SystemClass::Underdetermined {
                missing: self.unknowns - self.rank,
            }
        } else {
            SystemClass::Determined
        }
    }

    /// Upper-bound hint for how many constraints disagree. Not an exact
    /// count of the minimal conflicting set.
    pub fn conflict_estimate(&self) -> usize {
        let excess_rank = self.rank_augmented.saturating_sub(self.rank);
        let excess_rows = self.rows.saturating_sub(self.unknowns);
        excess_rank.max(excess_rows).max(1)
    }
}

impl LinearSystem {
    /// Emit one row per mesh and one per constraint.
    ///
    /// Mesh `(i, j, c, sign)` with teeth `Ni, Nj` gives
    /// `Ni·(ωi − ωc) + sign·Nj·(ωj − ωc) = 0`.
    pub fn from_model(model: &Model) -> Result<Self, SolveError> {
        let vars = model.variables();
        let rows = model.meshes.len() + model.constraints.len();
        let mut a = DMatrix::zeros(rows, vars.len());
        let mut b = DVector::zeros(rows);
        let mut sources = Vec::with_capacity(rows);

        for (row, mesh) in model.meshes.iter().enumerate() {
            let ni = mesh_teeth(model, &mesh.i)?;
            let nj = mesh_teeth(model, &mesh.j)?;
            let i = lookup(&vars, &mesh.i)?.index();
            let j = lookup(&vars, &mesh.j)?.index();
            let c = lookup(&vars, &mesh.carrier_var)?.index();
            let sign = mesh.engagement.sign();

            a[(row, i)] += ni;
            a[(row, c)] -= ni;
            a[(row, j)] += sign * nj;
            a[(row, c)] -= sign * nj;
            sources.push(RowSource::Mesh(row));
        }

        let offset = model.meshes.len();
        for (k, constraint) in model.constraints.iter().enumerate() {
            let row = offset + k;
            match constraint {
                Constraint::Known { var, value } => {
                    if !value.is_finite() {
                        return Err(SolveError::InvalidValue {
                            var: var.clone(),
                            value: *value,
                        });
                    }
                    a[(row, lookup(&vars, var)?.index())] = 1.0;
                    b[row] = *value;
                }
                Constraint::Equal { a: lhs, b: rhs } => {
                    a[(row, lookup(&vars, lhs)?.index())] += 1.0;
                    a[(row, lookup(&vars, rhs)?.index())] -= 1.0;
                }
                Constraint::Lock { var } => {
                    a[(row, lookup(&vars, var)?.index())] = 1.0;
                }
            }
            sources.push(RowSource::Constraint(k));
        }

        Ok(Self { vars, a, b, sources })
    }

    pub fn rows(&self) -> usize {
        self.a.nrows()
    }

    pub fn unknowns(&self) -> usize {
        self.a.ncols()
    }

    pub fn analyze(&self, tolerance: f64) -> RankAnalysis {
        RankAnalysis {
            rows: self.rows(),
            unknowns: self.unknowns(),
            rank: linalg::rank(&self.a, tolerance),
            rank_augmented: linalg::rank(&linalg::augment(&self.a, &self.b), tolerance),
        }
    }
}

fn lookup(vars: &VarTable, name: &str) -> Result<VarId, SolveError> {
    vars.id(name).ok_or_else(|| SolveError::UnknownVariable {
        var: name.to_string(),
    })
}

fn mesh_teeth(model: &Model, var: &str) -> Result<f64, SolveError> {
    let element = model
        .element_by_var(var)
        .ok_or_else(|| SolveError::ElementNotFound { var: var.to_string() })?;
    match element.teeth {
        Some(teeth) if teeth > 0 => Ok(teeth as f64),
        _ => Err(SolveError::MissingToothCount {
            element: element.id.clone(),
        }),
    }
}
