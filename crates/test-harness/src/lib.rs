//! Test harness for gear train scenarios.
//!
//! Provides programmatic tools for scripting multi-stage transmissions,
//! verifying kinematics and geometry at every step, and printing readable
//! diagnostics.
//!
//! # Key Components
//!
//! - [`TransmissionBuilder`] - Fluent API for building and evaluating trains
//! - [`oracle`] - Verification functions returning pass/fail verdicts
//! - [`report`] - Structured text evaluation reports
//! - [`helpers`] - Member shorthands, stage presets, float helpers
//! - [`assertions`] - Rich assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod workflow;

pub use helpers::HarnessError;
pub use oracle::OracleVerdict;
pub use report::EvaluationReport;
pub use workflow::TransmissionBuilder;
