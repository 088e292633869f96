//! Property-based tests for layout and phasing invariants using the `proptest` crate.

use std::f64::consts::TAU;

use proptest::prelude::*;

use epicycle_kernel::layout::{bend_chain_bisection, closed_form_two_planet, stage_layout};
use epicycle_kernel::phasing::{PhasingInput, compute_phasing};
use epicycle_kernel::{LayoutConfig, PhasingConfig, validate_stage_assembly};
use epicycle_types::AssemblyKind;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_teeth() -> impl Strategy<Value = u32> {
    8u32..60
}

fn arb_copies() -> impl Strategy<Value = u32> {
    1u32..=5
}

const TOL: f64 = 1e-6;

fn phasing(sun: Option<u32>, planets: Vec<u32>, ring: Option<u32>, copies: u32) -> epicycle_kernel::PhasingResult {
    compute_phasing(
        &PhasingInput {
            stage_id: 1,
            sun,
            ring,
            planets,
            copies,
            base_positions: Vec::new(),
        },
        &PhasingConfig::default(),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// 1. Copy angles lie in [0, 2π) and are pairwise distinct
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn copy_angles_distinct_and_normalized(
        sun in arb_teeth(),
        planet in arb_teeth(),
        extra in 0u32..4,
        copies in arb_copies(),
    ) {
        let ring = sun + 2 * planet + extra;
        let result = phasing(Some(sun), vec![planet], Some(ring), copies);
        let angles = &result.copy_angles;
        prop_assert_eq!(angles.len(), copies as usize);
        prop_assert_eq!(angles[0], 0.0);
        for a in angles {
            prop_assert!((0.0..TAU).contains(a), "angle {} out of range", a);
        }
        for i in 0..angles.len() {
            for j in i + 1..angles.len() {
                prop_assert!((angles[i] - angles[j]).abs() > 1e-9,
                    "copies {} and {} coincide at {}", i, j, angles[i]);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Every gear phase is normalized
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn gear_phases_normalized(
        sun in proptest::option::of(arb_teeth()),
        planets in proptest::collection::vec(arb_teeth(), 1..4),
        ring_extra in proptest::option::of(0u32..20),
        copies in arb_copies(),
    ) {
        let reach = sun.unwrap_or(0) + 2 * planets.iter().sum::<u32>();
        let ring = ring_extra.map(|e| reach.saturating_sub(e).max(planets[planets.len() - 1] + 1));
        let result = phasing(sun, planets.clone(), ring, copies);
        for (key, value) in &result.gear_phases {
            prop_assert!(value.is_finite(), "{} is not finite", key);
            prop_assert!((0.0..TAU).contains(value), "{} = {}", key, value);
        }
        let expected = planets.len() * copies as usize
            + usize::from(sun.is_some())
            + usize::from(ring.is_some());
        prop_assert_eq!(result.gear_phases.len(), expected);
    }
}

// ---------------------------------------------------------------------------
// 3. Uniform-bend bisection agrees with the two-planet closed form
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn bisection_matches_closed_form(
        start in 5.0f64..50.0,
        link in 2.0f64..30.0,
        fraction in 0.05f64..0.95,
    ) {
        // Any target strictly between the folded and straight reach.
        let folded = (start - link).abs();
        let straight = start + link;
        let target = folded + fraction * (straight - folded);

        let closed = closed_form_two_planet(start, link, target);
        prop_assume!(closed.is_some());
        let closed = closed.unwrap();
        let bent = bend_chain_bisection(start, &[link], target, 48);
        let p2 = bent.positions[1];
        prop_assert!((p2 - closed).norm() < TOL,
            "bisection {:?} vs closed form {:?}", p2, closed);
    }
}

// ---------------------------------------------------------------------------
// 4. Layout keeps meshing centres exactly one pitch-sum apart
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn curved_layout_preserves_center_distances(
        sun in arb_teeth(),
        planets in proptest::collection::vec(arb_teeth(), 2..5),
        shrink in 1u32..8,
    ) {
        let reach = sun + 2 * planets.iter().sum::<u32>();
        let ring = reach - shrink;
        prop_assert_eq!(
            validate_stage_assembly(Some(sun), &planets, Some(ring), 1).kind,
            AssemblyKind::Curved
        );

        let layout = stage_layout(Some(sun), &planets, Some(ring), &LayoutConfig::default());
        for k in 1..planets.len() {
            let d = (layout.center(k).unwrap() - layout.center(k - 1).unwrap()).norm();
            let expected = layout.planet_radii[k] + layout.planet_radii[k - 1];
            prop_assert!((d - expected).abs() < 1e-9, "link {} is {} not {}", k, d, expected);
        }
        let first = layout.center(0).unwrap().norm();
        prop_assert!((first - (sun as f64 / 2.0 + planets[0] as f64 / 2.0)).abs() < 1e-9);
    }
}
