use tracing::debug;

use epicycle_kernel::{analyze_topology, compute_phasing, evaluate, validate_stage_assembly};
use epicycle_solver::solve;

use crate::BridgeError;
use crate::locale::{Locale, render};
use crate::messages::{Envelope, Request, Response, StageMessage};

/// Dispatch one request and return its response.
///
/// Failures become [`Response::Error`] with the error's display text, so
/// the host always gets exactly one answer per message.
pub fn dispatch(envelope: Envelope) -> Response {
    match handle_request(envelope.request, envelope.locale) {
        Ok(response) => response,
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

fn handle_request(request: Request, locale: Locale) -> Result<Response, BridgeError> {
    match request {
        Request::Evaluate { transmission, config } => {
            let evaluation = evaluate(&transmission, &config)?;
            let messages = evaluation
                .stages
                .iter()
                .map(|s| StageMessage {
                    stage: s.id,
                    text: render(&s.assembly.message, locale),
                })
                .collect();
            Ok(Response::Evaluated { evaluation, messages })
        }

        Request::Solve { model, config } => {
            let outcome = solve(&model, &config)?;
            Ok(Response::Solved { outcome })
        }

        Request::ValidateStage { sun, planets, ring, copies } => {
            let status = validate_stage_assembly(sun, &planets, ring, copies);
            let text = render(&status.message, locale);
            debug!(kind = %status.kind, "stage validated");
            Ok(Response::StageValidated { status, text })
        }

        Request::AnalyzeTopology { model } => Ok(Response::TopologyAnalyzed {
            report: analyze_topology(&model),
        }),

        Request::ComputePhasing { input } => Ok(Response::Phased {
            result: compute_phasing(&input, &Default::default())?,
        }),
    }
}

/// Parse a JSON request, dispatch it and serialize the response.
pub fn process_json(input: &str) -> String {
    let response = match serde_json::from_str::<Envelope>(input) {
        Ok(envelope) => dispatch(envelope),
        Err(e) => Response::Error {
            message: BridgeError::Parse { reason: e.to_string() }.to_string(),
        },
    };

    serde_json::to_string(&response).unwrap_or_else(|e| {
        format!(
            r#"{{"type":"Error","message":"serialization failed: {}"}}"#,
            e.to_string().replace('"', "'")
        )
    })
}
