//! Kinematic solver for planetary gear trains.
//!
//! Every mesh and constraint of a [`epicycle_types::Model`] becomes one row of
//! a dense linear system over the angular velocities. The system is
//! classified by rank as determined, underdetermined or overdetermined, and
//! determined systems are solved by least squares.

pub mod linalg;
pub mod solver;
pub mod system;

pub use solver::*;
pub use system::{LinearSystem, RankAnalysis, RowSource, SystemClass};
