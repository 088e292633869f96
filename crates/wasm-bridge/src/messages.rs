use serde::{Deserialize, Serialize};

use epicycle_kernel::{EvaluationConfig, Evaluation, PhasingInput, PhasingResult, TopologyReport};
use epicycle_solver::{SolveOutcome, SolverConfig};
use epicycle_types::{AssemblyStatus, Model, Transmission};

use crate::locale::Locale;

/// A request from the host page, with the language its messages should use.
///
/// ```json
/// {"type": "ValidateStage", "locale": "pt", "sun": 20, "planets": [10], "ring": 40}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub locale: Locale,
    #[serde(flatten)]
    pub request: Request,
}

impl Envelope {
    pub fn new(request: Request) -> Self {
        Self {
            locale: Locale::default(),
            request,
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}

/// Messages from the host to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Build, validate, lay out, phase and solve a whole transmission.
    Evaluate {
        transmission: Transmission,
        #[serde(default)]
        config: EvaluationConfig,
    },
    /// Solve a hand-built kinematic model.
    Solve {
        model: Model,
        #[serde(default)]
        config: SolverConfig,
    },
    /// Check whether one stage can be assembled.
    ValidateStage {
        #[serde(default)]
        sun: Option<u32>,
        planets: Vec<u32>,
        #[serde(default)]
        ring: Option<u32>,
        #[serde(default = "one")]
        copies: u32,
    },
    /// Classify every carrier's sun-to-ring paths.
    AnalyzeTopology { model: Model },
    /// Copy angles and gear phases for one stage.
    ComputePhasing {
        #[serde(flatten)]
        input: PhasingInput,
    },
}

fn one() -> u32 {
    1
}

/// A stage's assembly message rendered for the request locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageMessage {
    pub stage: u32,
    pub text: String,
}

/// Messages from the engine to the host.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Response {
    Evaluated {
        evaluation: Evaluation,
        messages: Vec<StageMessage>,
    },
    Solved { outcome: SolveOutcome },
    StageValidated { status: AssemblyStatus, text: String },
    TopologyAnalyzed { report: TopologyReport },
    Phased { result: PhasingResult },
    Error { message: String },
}
