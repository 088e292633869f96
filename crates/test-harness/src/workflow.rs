//! Fluent API for scripting gear trains in tests.
//!
//! Wraps `epicycle_bridge::dispatch()` to test the real message path, not a
//! shortcut into the kernel.

use epicycle_bridge::{Envelope, Locale, Request, Response, StageMessage, dispatch};
use epicycle_kernel::{Evaluation, EvaluationConfig, build_model};
use epicycle_solver::SolveOutcome;
use epicycle_types::{Coupling, MemberRef, Model, RatioSpec, StageSpec, Transmission};

use crate::helpers::HarnessError;
use crate::oracle::{self, OracleVerdict};

/// A fluent builder for constructing and evaluating transmissions in tests.
pub struct TransmissionBuilder {
    transmission: Transmission,
    config: EvaluationConfig,
    locale: Locale,
    messages: Vec<StageMessage>,
    history: Vec<(String, String)>,
}

impl Default for TransmissionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransmissionBuilder {
    pub fn new() -> Self {
        Self {
            transmission: Transmission::new(),
            config: EvaluationConfig::default(),
            locale: Locale::En,
            messages: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    // ── Stages ──────────────────────────────────────────────────────────

    /// Add a stage. Stage ids must be unique.
    pub fn stage(&mut self, stage: StageSpec) -> Result<&mut Self, HarnessError> {
        if self.transmission.stage(stage.id).is_some() {
            return Err(HarnessError::DuplicateStage { id: stage.id });
        }
        self.transmission.stages.push(stage);
        Ok(self)
    }

    /// Set the number of planet chain copies on a stage.
    pub fn copies(&mut self, id: u32, copies: u32) -> Result<&mut Self, HarnessError> {
        self.stage_mut(id)?.copies = copies;
        Ok(self)
    }

    /// Make stage `id` turn on another variable's carrier.
    pub fn share_carrier(&mut self, id: u32, carrier_var: &str) -> Result<&mut Self, HarnessError> {
        self.stage_mut(id)?.carrier = Some(carrier_var.to_string());
        Ok(self)
    }

    // ── Couplings ───────────────────────────────────────────────────────

    pub fn known(&mut self, member: MemberRef, rpm: f64) -> &mut Self {
        self.transmission.couplings.push(Coupling::Known { member, rpm });
        self
    }

    pub fn lock(&mut self, member: MemberRef) -> &mut Self {
        self.transmission.couplings.push(Coupling::Lock { member });
        self
    }

    pub fn couple(&mut self, a: MemberRef, b: MemberRef) -> &mut Self {
        self.transmission.couplings.push(Coupling::Equal { a, b });
        self
    }

    pub fn ratio(&mut self, id: &str, num: MemberRef, den: MemberRef) -> &mut Self {
        self.transmission.ratios.push(RatioSpec {
            id: id.to_string(),
            num,
            den,
        });
        self
    }

    /// Drop the most recent coupling, if any.
    pub fn pop_coupling(&mut self) -> Option<Coupling> {
        self.transmission.couplings.pop()
    }

    // ── Evaluation ──────────────────────────────────────────────────────

    /// Evaluate the transmission through the bridge.
    pub fn evaluate(&mut self) -> Result<Evaluation, HarnessError> {
        let envelope = Envelope::new(Request::Evaluate {
            transmission: self.transmission.clone(),
            config: self.config.clone(),
        })
        .with_locale(self.locale);

        match dispatch(envelope) {
            Response::Evaluated { evaluation, messages } => {
                self.history.push(("Evaluate".to_string(), status_label(&evaluation.solve)));
                self.messages = messages;
                Ok(evaluation)
            }
            Response::Error { message } => {
                self.history.push(("Evaluate".to_string(), "Error".to_string()));
                Err(HarnessError::DispatchError { message })
            }
            _ => Err(HarnessError::DispatchError {
                message: "Evaluate: unexpected response".to_string(),
            }),
        }
    }

    /// Evaluate and require a solved outcome.
    pub fn solve(&mut self) -> Result<Evaluation, HarnessError> {
        let evaluation = self.evaluate()?;
        if evaluation.solve.is_solved() {
            Ok(evaluation)
        } else {
            Err(HarnessError::NotSolved {
                status: status_label(&evaluation.solve),
            })
        }
    }

    /// Evaluate and run every oracle on the result.
    pub fn check_all(&mut self) -> Result<Vec<OracleVerdict>, HarnessError> {
        let evaluation = self.evaluate()?;
        let model = self.model()?;
        Ok(oracle::run_all_checks(&model, &evaluation))
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn transmission(&self) -> &Transmission {
        &self.transmission
    }

    /// The kinematic model the current transmission builds.
    pub fn model(&self) -> Result<Model, HarnessError> {
        build_model(&self.transmission).map_err(|e| HarnessError::DispatchError {
            message: e.to_string(),
        })
    }

    /// Localized stage messages from the last evaluation.
    pub fn messages(&self) -> &[StageMessage] {
        &self.messages
    }

    /// `(request, outcome)` pairs of every evaluation so far.
    pub fn history(&self) -> &[(String, String)] {
        &self.history
    }

    // ── Internal Helpers ────────────────────────────────────────────────

    fn stage_mut(&mut self, id: u32) -> Result<&mut StageSpec, HarnessError> {
        self.transmission
            .stages
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(HarnessError::StageNotFound { id })
    }
}

pub(crate) fn status_label(outcome: &SolveOutcome) -> String {
    match outcome {
        SolveOutcome::Solved(_) => "solved".to_string(),
        SolveOutcome::Underdetermined { missing_constraints } => {
            format!("underdetermined (missing {missing_constraints})")
        }
        SolveOutcome::Overdetermined { conflicting_constraints } => {
            format!("overdetermined (conflicting {conflicting_constraints})")
        }
    }
}
