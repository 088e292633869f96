//! Per-stage assembly check from tooth counts alone.
//!
//! Pitch radius is proportional to tooth count for gears sharing a module,
//! so every reach/clearance condition is expressed directly in teeth.

use std::f64::consts::PI;

use tracing::debug;

use epicycle_types::{AssemblyKind, AssemblyMessage, AssemblyStatus};

use crate::MAX_COPIES;

/// Validate one stage.
///
/// Rules in order:
/// - sun and ring with no planet between them is impossible;
/// - no ring leaves the stage open;
/// - no sun: the ring must clear every copy of the contact planet;
/// - one planet: the ring must equal `Ns + 2·Np` exactly;
/// - more planets: the ring may not exceed `Ns + 2·ΣNp`; equality gives a
///   straight arm, anything smaller a curved one.
pub fn validate_stage_assembly(
    sun: Option<u32>,
    planets: &[u32],
    ring: Option<u32>,
    copies: u32,
) -> AssemblyStatus {
    let status = match (sun, ring) {
        (Some(_), Some(_)) if planets.is_empty() => {
            AssemblyStatus::new(AssemblyKind::Impossible, AssemblyMessage::MissingPlanet)
        }
        (_, None) => AssemblyStatus::new(AssemblyKind::Open, AssemblyMessage::OpenStage),
        (None, Some(ring)) => ring_clearance(planets, ring, copies),
        (Some(sun), Some(ring)) => closure_status(sun, planets, ring),
    };
    debug!(kind = %status.kind, valid = status.valid, "stage assembly checked");
    status
}

/// Smallest ring that holds `copies` copies of a planet with `contact` teeth.
///
/// `c` equal circles of radius `r` tangent inside a circle of radius `R`
/// need `R ≥ r·(1 + 1/sin(π/c))`. A single copy only needs `R > r`.
pub fn minimum_ring_teeth(contact: u32, copies: u32) -> u64 {
    let c = copies.clamp(1, MAX_COPIES);
    if c == 1 {
        return u64::from(contact) + 1;
    }
    let required = contact as f64 * (1.0 + 1.0 / (PI / c as f64).sin());
    // Guard against sin() rounding pushing an exact integer over the edge.
    (required - 1e-9).ceil() as u64
}

/// Reach of a planet chain from the sun: `Ns + 2·ΣNp`.
///
/// Summed in `u64`: the total of `u32` counts can exceed `u32::MAX`.
pub fn chain_reach(sun: u32, planets: &[u32]) -> u64 {
    u64::from(sun) + 2 * planets.iter().map(|&p| u64::from(p)).sum::<u64>()
}

/// Classify a closed sun–chain–ring loop with at least one planet.
pub fn closure_kind(sun: u32, planets: &[u32], ring: u32) -> AssemblyKind {
    let limit = chain_reach(sun, planets);
    let ring = u64::from(ring);
    match planets.len() {
        0 => AssemblyKind::Impossible,
        1 if ring == limit => AssemblyKind::Straight,
        1 => AssemblyKind::Impossible,
        _ if ring == limit => AssemblyKind::Straight,
        _ if ring < limit => AssemblyKind::Curved,
        _ => AssemblyKind::Impossible,
    }
}

fn ring_clearance(planets: &[u32], ring: u32, copies: u32) -> AssemblyStatus {
    let Some(&contact) = planets.last() else {
        return AssemblyStatus::new(AssemblyKind::Open, AssemblyMessage::OpenStage);
    };
    let required = minimum_ring_teeth(contact, copies);
    if u64::from(ring) >= required {
        AssemblyStatus::new(AssemblyKind::Open, AssemblyMessage::RingClearance { ring, required })
    } else {
        AssemblyStatus::new(
            AssemblyKind::Impossible,
            AssemblyMessage::RingTooSmall {
                ring,
                required,
                copies: copies.clamp(1, MAX_COPIES),
            },
        )
    }
}

fn closure_status(sun: u32, planets: &[u32], ring: u32) -> AssemblyStatus {
    let limit = chain_reach(sun, planets);
    let kind = closure_kind(sun, planets, ring);
    let message = match kind {
        AssemblyKind::Straight => AssemblyMessage::StraightArm { ring, limit },
        AssemblyKind::Curved => AssemblyMessage::CurvedArm { ring, limit },
        _ if planets.len() == 1 => AssemblyMessage::ModulusMismatch { ring, expected: limit },
        _ => AssemblyMessage::ExceedsReach { ring, limit },
    };
    AssemblyStatus::new(kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_planet_requires_equality() {
        let ok = validate_stage_assembly(Some(20), &[10], Some(40), 1);
        assert!(ok.valid);
        assert_eq!(ok.kind, AssemblyKind::Straight);

        let bad = validate_stage_assembly(Some(20), &[10], Some(41), 1);
        assert!(!bad.valid);
        assert_eq!(bad.kind, AssemblyKind::Impossible);
        assert_eq!(bad.message, AssemblyMessage::ModulusMismatch { ring: 41, expected: 40 });

        let small = validate_stage_assembly(Some(20), &[10], Some(39), 3);
        assert_eq!(small.kind, AssemblyKind::Impossible);
    }

    #[test]
    fn two_planet_boundary() {
        // Reach is 30 + 2·(10 + 10) = 70.
        assert_eq!(validate_stage_assembly(Some(30), &[10, 10], Some(70), 1).kind, AssemblyKind::Straight);

        let curved = validate_stage_assembly(Some(30), &[10, 10], Some(65), 1);
        assert_eq!(curved.kind, AssemblyKind::Curved);
        assert!(curved.valid);
        assert_eq!(curved.message, AssemblyMessage::CurvedArm { ring: 65, limit: 70 });

        let over = validate_stage_assembly(Some(30), &[10, 10], Some(71), 1);
        assert_eq!(over.kind, AssemblyKind::Impossible);
        assert_eq!(over.message, AssemblyMessage::ExceedsReach { ring: 71, limit: 70 });
    }

    #[test]
    fn three_planets_use_same_inequality() {
        assert_eq!(validate_stage_assembly(Some(20), &[8, 9, 10], Some(74), 1).kind, AssemblyKind::Straight);
        assert_eq!(validate_stage_assembly(Some(20), &[8, 9, 10], Some(60), 1).kind, AssemblyKind::Curved);
        assert_eq!(validate_stage_assembly(Some(20), &[8, 9, 10], Some(75), 1).kind, AssemblyKind::Impossible);
    }

    #[test]
    fn sun_and_ring_without_planet() {
        let status = validate_stage_assembly(Some(20), &[], Some(60), 1);
        assert_eq!(status.kind, AssemblyKind::Impossible);
        assert_eq!(status.message, AssemblyMessage::MissingPlanet);
    }

    #[test]
    fn no_ring_is_open() {
        let status = validate_stage_assembly(Some(20), &[10, 11], None, 3);
        assert_eq!(status.kind, AssemblyKind::Open);
        assert!(status.valid);
        assert_eq!(validate_stage_assembly(None, &[], None, 1).kind, AssemblyKind::Open);
    }

    #[test]
    fn ringed_stage_without_sun() {
        // One copy only needs the ring larger than the planet.
        assert!(validate_stage_assembly(None, &[18], Some(19), 1).valid);
        assert!(!validate_stage_assembly(None, &[18], Some(18), 1).valid);

        // Two copies: ring at least twice the planet.
        assert!(validate_stage_assembly(None, &[18], Some(36), 2).valid);
        let tight = validate_stage_assembly(None, &[18], Some(35), 2);
        assert_eq!(tight.message, AssemblyMessage::RingTooSmall { ring: 35, required: 36, copies: 2 });
    }

    #[test]
    fn minimum_ring_for_copies() {
        // 3 copies: 1 + 1/sin(60°) = 2.1547
        assert_eq!(minimum_ring_teeth(10, 3), 22);
        // 4 copies: 1 + √2 = 2.4142
        assert_eq!(minimum_ring_teeth(10, 4), 25);
        // 5 copies: 1 + 1/sin(36°) = 2.7013
        assert_eq!(minimum_ring_teeth(10, 5), 28);
        // Copies are clamped to the supported range.
        assert_eq!(minimum_ring_teeth(10, 9), minimum_ring_teeth(10, 5));
        assert_eq!(minimum_ring_teeth(10, 0), 11);
    }

    #[test]
    fn tooth_sums_past_u32_range() {
        let max = u32::MAX;
        assert_eq!(chain_reach(max, &[max, max]), 5 * u64::from(max));
        assert_eq!(minimum_ring_teeth(max, 1), u64::from(max) + 1);

        let huge = validate_stage_assembly(Some(4_000_000_000), &[200_000_000], Some(10), 1);
        assert_eq!(huge.kind, AssemblyKind::Impossible);
        assert_eq!(huge.message, AssemblyMessage::ModulusMismatch { ring: 10, expected: 4_400_000_000 });

        let curved = validate_stage_assembly(Some(max), &[max, max], Some(max), 1);
        assert_eq!(curved.kind, AssemblyKind::Curved);
    }
}
