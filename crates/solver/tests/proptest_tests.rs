//! Property-based tests for solver invariants using the `proptest` crate.

use proptest::prelude::*;

use epicycle_solver::{SolveOutcome, SolverConfig, solve};
use epicycle_types::{Constraint, Element, ElementKind, Mesh, MeshKind, Model};

// ---------------------------------------------------------------------------
// Model helpers
// ---------------------------------------------------------------------------

/// Simple stage `s` with a single planet: ring = sun + 2·planet.
fn add_stage(model: &mut Model, s: u32, sun: u32, planet: u32) {
    let ws = format!("omega_s{s}");
    let wp = format!("omega_p{s}_1");
    let wa = format!("omega_a{s}");
    let wc = format!("omega_c{s}");
    model.add_element(Element::new(&format!("sun{s}"), ElementKind::Sun, Some(sun), &ws));
    model.add_element(Element::new(&format!("planet{s}"), ElementKind::Planet, Some(planet), &wp));
    model.add_element(Element::new(&format!("ring{s}"), ElementKind::Ring, Some(sun + 2 * planet), &wa));
    model.add_element(Element::new(&format!("carrier{s}"), ElementKind::Carrier, None, &wc));
    model.add_mesh(Mesh::new(&ws, &wp, &wc, MeshKind::External));
    model.add_mesh(Mesh::new(&wp, &wa, &wc, MeshKind::Internal));
}

fn arb_teeth() -> impl Strategy<Value = u32> {
    12u32..48
}

fn arb_speed() -> impl Strategy<Value = f64> {
    -100.0f64..100.0
}

// ---------------------------------------------------------------------------
// 1. Pinning every solved variable reproduces the solution
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn pinned_resolve_is_idempotent(
        sun in arb_teeth(),
        planet in arb_teeth(),
        input in arb_speed(),
        ring_speed in arb_speed(),
    ) {
        let mut model = Model::new();
        add_stage(&mut model, 1, sun, planet);
        model.add_constraint(Constraint::known("omega_s1", input));
        model.add_constraint(Constraint::known("omega_a1", ring_speed));

        let config = SolverConfig::default();
        let first = match solve(&model, &config).unwrap() {
            SolveOutcome::Solved(solution) => solution,
            other => return Err(TestCaseError::fail(format!("not solved: {:?}", other))),
        };

        let mut pinned = model.clone();
        for (var, value) in &first.velocities {
            pinned.add_constraint(Constraint::known(var, *value));
        }
        let second = match solve(&pinned, &config).unwrap() {
            SolveOutcome::Solved(solution) => solution,
            other => return Err(TestCaseError::fail(format!("pinned model not solved: {:?}", other))),
        };

        for (var, value) in &first.velocities {
            let again = second.velocity(var).unwrap();
            prop_assert!((again - value).abs() < 1e-9 * (1.0 + value.abs()),
                "{} drifted: {} -> {}", var, value, again);
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Adding constraints never increases the missing count
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn missing_constraints_monotone(
        sun1 in arb_teeth(),
        planet1 in arb_teeth(),
        sun2 in arb_teeth(),
        planet2 in arb_teeth(),
        input in arb_speed(),
    ) {
        let mut model = Model::new();
        add_stage(&mut model, 1, sun1, planet1);
        add_stage(&mut model, 2, sun2, planet2);

        let steps = [
            Constraint::equal("omega_c1", "omega_a2"),
            Constraint::equal("omega_a1", "omega_c2"),
            Constraint::known("omega_s1", input),
            Constraint::lock("omega_s2"),
        ];

        let config = SolverConfig::default();
        let mut last_missing = usize::MAX;
        let mut solved = false;
        for step in steps {
            match solve(&model, &config).unwrap() {
                SolveOutcome::Underdetermined { missing_constraints } => {
                    prop_assert!(missing_constraints >= 1);
                    prop_assert!(missing_constraints <= last_missing);
                    last_missing = missing_constraints;
                }
                other => return Err(TestCaseError::fail(format!("expected underdetermined, got {:?}", other))),
            }
            model.add_constraint(step);
        }
        if let SolveOutcome::Solved(_) = solve(&model, &config).unwrap() {
            solved = true;
        }
        prop_assert!(solved);
    }
}

// ---------------------------------------------------------------------------
// 3. Two different knowns on one variable always conflict
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn conflicting_knowns_are_overdetermined(
        sun in arb_teeth(),
        planet in arb_teeth(),
        a in arb_speed(),
        delta in 0.5f64..50.0,
    ) {
        let mut model = Model::new();
        add_stage(&mut model, 1, sun, planet);
        model.add_constraint(Constraint::known("omega_s1", a));
        model.add_constraint(Constraint::known("omega_s1", a + delta));

        match solve(&model, &SolverConfig::default()).unwrap() {
            SolveOutcome::Overdetermined { conflicting_constraints } => {
                prop_assert!(conflicting_constraints >= 1)
            }
            other => return Err(TestCaseError::fail(format!("expected overdetermined, got {:?}", other))),
        }
    }
}
