//! Copy placement and tooth registration for one stage.
//!
//! Everything here is integer tooth arithmetic plus the mesh-contact
//! direction between neighbouring centres in the base layout; no motion is
//! simulated. Phases are rotations of each gear about its own centre that
//! make its teeth interlock with every neighbour it meshes.

use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use epicycle_types::{planet_var, ring_var, sun_var};

use crate::layout::stage_layout;
use crate::{LayoutConfig, PhasingConfig, normalize_angle};

/// Tooth counts and base layout of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhasingInput {
    pub stage_id: u32,
    pub sun: Option<u32>,
    pub ring: Option<u32>,
    pub planets: Vec<u32>,
    #[serde(default = "default_copies")]
    pub copies: u32,
    /// Copy-0 planet centres. Recomputed with the default layout when the
    /// length does not match `planets`.
    #[serde(default)]
    pub base_positions: Vec<[f64; 2]>,
}

fn default_copies() -> u32 {
    1
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhasingError {
    #[error("stage {stage} has a zero tooth count on its {member}")]
    ZeroTeeth { stage: u32, member: String },
}

impl PhasingInput {
    /// Every present gear needs teeth: phases divide by each count.
    fn check_teeth(&self) -> Result<(), PhasingError> {
        let zero = |member: String| PhasingError::ZeroTeeth {
            stage: self.stage_id,
            member,
        };
        if self.sun == Some(0) {
            return Err(zero("sun".to_string()));
        }
        if self.ring == Some(0) {
            return Err(zero("ring".to_string()));
        }
        if let Some(k) = self.planets.iter().position(|&z| z == 0) {
            return Err(zero(format!("planet {}", k + 1)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhasingResult {
    pub copy_angles: Vec<f64>,
    pub sun_phase: Option<f64>,
    pub ring_phase: Option<f64>,
    /// `{planet var}#copy{m}` for planets, bare variable for sun and ring.
    pub gear_phases: BTreeMap<String, f64>,
    /// `|Zs ± Zr|`, present when both sun and ring exist.
    pub z_eff: Option<u64>,
    /// Whether the copies can sit at exactly equal spacing.
    pub evenly_spaced: bool,
}

/// Half a tooth pitch for gears with an even tooth count.
fn parity_offset(teeth: u32) -> f64 {
    if teeth % 2 == 0 { PI / teeth as f64 } else { 0.0 }
}

/// Phase of a planet driven by its inner neighbour.
///
/// `prev` turns at `phase_prev`; `gamma` is the absolute contact direction
/// from `prev` to the planet.
pub(crate) fn forward_step(phase_prev: f64, z_prev: f64, z: u32, gamma: f64) -> f64 {
    let ratio = z_prev / z as f64;
    -phase_prev * ratio + gamma * (1.0 + ratio) + parity_offset(z)
}

/// Inverse of [`forward_step`]: the inner neighbour's phase given the planet's.
pub(crate) fn backward_step(phase: f64, z_prev: u32, z: u32, gamma: f64) -> f64 {
    let ratio = z_prev as f64 / z as f64;
    (gamma * (1.0 + ratio) + parity_offset(z) - phase) / ratio
}

/// Ring phase meshing a contact planet at `phase_contact` in direction `beta`.
pub(crate) fn ring_from_contact(phase_contact: f64, z_contact: u32, z_ring: u32, beta: f64) -> f64 {
    let ratio = z_contact as f64 / z_ring as f64;
    phase_contact * ratio + beta * (1.0 - ratio)
}

/// Inverse of [`ring_from_contact`].
pub(crate) fn contact_from_ring(phase_ring: f64, z_contact: u32, z_ring: u32, beta: f64) -> f64 {
    let ratio = z_contact as f64 / z_ring as f64;
    (phase_ring - beta * (1.0 - ratio)) / ratio
}

/// Copy angles around the carrier and whether they are exactly even.
fn copy_angles(sun: Option<u32>, ring: Option<u32>, chain_len: usize, copies: u32) -> (Vec<f64>, Option<u64>, bool) {
    let equal: Vec<f64> = (0..copies).map(|m| TAU * m as f64 / copies as f64).collect();
    let (Some(zs), Some(zr)) = (sun, ring) else {
        return (equal, None, true);
    };
    if chain_len == 0 {
        return (equal, None, true);
    }

    // Odd chains turn the ring against the sun; even chains with it.
    let (zs, zr, n) = (u64::from(zs), u64::from(zr), u64::from(copies));
    let z_eff = if chain_len % 2 == 1 { zs + zr } else { zs.abs_diff(zr) };
    let evenly_spaced = z_eff > 0 && z_eff % n == 0;
    if z_eff < n {
        debug!(z_eff, copies, "too few ticks to separate copies; using equal spacing");
        return (equal, Some(z_eff), evenly_spaced);
    }

    let tick = TAU / z_eff as f64;
    let angles = equal
        .iter()
        .map(|&target| normalize_angle((target / tick).round() * tick))
        .collect();
    debug!(z_eff, tick, "copy ticks");
    (angles, Some(z_eff), evenly_spaced)
}

fn direction(v: Vector2<f64>) -> f64 {
    v.y.atan2(v.x)
}

/// Compute copy angles and gear phases for one stage.
#[instrument(skip(input, config), fields(stage = input.stage_id, planets = input.planets.len()))]
pub fn compute_phasing(input: &PhasingInput, config: &PhasingConfig) -> Result<PhasingResult, PhasingError> {
    input.check_teeth()?;
    let copies = input.copies.clamp(1, config.max_copies.max(1));
    let (copy_angles, z_eff, evenly_spaced) =
        copy_angles(input.sun, input.ring, input.planets.len(), copies);

    let centers: Vec<Vector2<f64>> = if input.base_positions.len() == input.planets.len() {
        input.base_positions.iter().map(|p| Vector2::new(p[0], p[1])).collect()
    } else {
        let layout = stage_layout(input.sun, &input.planets, input.ring, &LayoutConfig::default());
        layout.positions.iter().map(|p| Vector2::new(p[0], p[1])).collect()
    };

    let rotation = centers.first().map_or(0.0, |&c| direction(c));
    // Contact direction from planet k-1 to planet k, relative to planet 1.
    let mesh_angles: Vec<f64> = (0..centers.len())
        .map(|k| if k == 0 { 0.0 } else { direction(centers[k] - centers[k - 1]) - rotation })
        .collect();
    let contact_angle = centers.last().map_or(0.0, |&c| direction(c) - rotation);

    let mut gear_phases = BTreeMap::new();
    let sun_phase = input.sun.map(|_| 0.0);
    if sun_phase.is_some() {
        gear_phases.insert(sun_var(input.stage_id), 0.0);
    }

    let mut ring_phase = None;
    let backward = input.sun.is_none() && input.ring.is_some();

    if !input.planets.is_empty() {
        for (m, &theta) in copy_angles.iter().enumerate() {
            let raw = if backward {
                let z_ring = input.ring.unwrap_or_default();
                backward_chain(&input.planets, &mesh_angles, z_ring, contact_angle, theta)
            } else {
                forward_chain(&input.planets, &mesh_angles, input.sun.unwrap_or(0), theta)
            };

            if m == 0 && !backward {
                if let (Some(z_ring), Some(&contact)) = (input.ring, raw.last()) {
                    let z_contact = input.planets[input.planets.len() - 1];
                    let beta = contact_angle + theta;
                    ring_phase = Some(normalize_angle(ring_from_contact(contact, z_contact, z_ring, beta)));
                }
            }

            for (k, phase) in raw.into_iter().enumerate() {
                gear_phases.insert(
                    format!("{}#copy{}", planet_var(input.stage_id, k), m),
                    normalize_angle(phase),
                );
            }
        }
    }

    if input.ring.is_some() && ring_phase.is_none() {
        ring_phase = Some(0.0);
    }
    if let Some(phase) = ring_phase {
        gear_phases.insert(ring_var(input.stage_id), phase);
    }

    debug!(copies, phases = gear_phases.len(), "stage phased");
    Ok(PhasingResult {
        copy_angles,
        sun_phase,
        ring_phase,
        gear_phases,
        z_eff,
        evenly_spaced,
    })
}

/// Unnormalized planet phases for one copy, propagated outward from the sun.
fn forward_chain(planets: &[u32], mesh_angles: &[f64], z_sun: u32, theta: f64) -> Vec<f64> {
    let mut phases = Vec::with_capacity(planets.len());
    let first = planets[0];
    phases.push(theta * (1.0 + z_sun as f64 / first as f64) + parity_offset(first));
    for k in 1..planets.len() {
        let gamma = theta + mesh_angles[k];
        phases.push(forward_step(phases[k - 1], planets[k - 1] as f64, planets[k], gamma));
    }
    phases
}

/// Unnormalized planet phases for one copy, propagated inward from a ring
/// held at phase zero.
fn backward_chain(planets: &[u32], mesh_angles: &[f64], z_ring: u32, contact_angle: f64, theta: f64) -> Vec<f64> {
    let n = planets.len();
    let mut phases = vec![0.0; n];
    phases[n - 1] = contact_from_ring(0.0, planets[n - 1], z_ring, contact_angle + theta);
    for k in (1..n).rev() {
        let gamma = theta + mesh_angles[k];
        phases[k - 1] = backward_step(phases[k], planets[k - 1], planets[k], gamma);
    }
    phases
}
