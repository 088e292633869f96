//! JSON message bridge between a host page and the gear engine.

pub mod dispatch;
pub mod locale;
pub mod messages;

#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

use thiserror::Error;

use epicycle_kernel::{EvaluationError, PhasingError};
use epicycle_solver::SolveError;

pub use dispatch::{dispatch, process_json};
pub use locale::{Locale, kind_label, render};
pub use messages::{Envelope, Request, Response, StageMessage};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to parse message: {reason}")]
    Parse { reason: String },

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("solver error: {0}")]
    Solve(#[from] SolveError),

    #[error("phasing error: {0}")]
    Phasing(#[from] PhasingError),
}
