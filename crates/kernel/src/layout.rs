//! Planet centre placement for one stage.
//!
//! Positions are in the carrier frame with the stage axis at the origin.
//! Pitch radius is `module·Z/2`, so meshing gears sit `r_i + r_j` apart and a
//! planet inside the ring sits `r_a − r_p` from the axis.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use epicycle_types::AssemblyKind;

use crate::LayoutConfig;
use crate::assembly::closure_kind;

/// Planet chain geometry for copy 0 of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageLayout {
    pub sun_radius: Option<f64>,
    pub ring_radius: Option<f64>,
    pub planet_radii: Vec<f64>,
    /// Planet centres in chain order.
    pub positions: Vec<[f64; 2]>,
    pub arm: AssemblyKind,
    /// Distance error of the last planet for bent chains; zero otherwise.
    pub residual: f64,
}

impl StageLayout {
    pub fn center(&self, index: usize) -> Option<Vector2<f64>> {
        self.positions.get(index).map(|p| Vector2::new(p[0], p[1]))
    }

    /// Direction of the first planet, which every phase is measured from.
    pub fn global_rotation(&self) -> f64 {
        self.center(0).map_or(0.0, |c| c.y.atan2(c.x))
    }
}

/// Result of bending a planet chain to reach a target radius.
#[derive(Debug, Clone, PartialEq)]
pub struct BentChain {
    pub positions: Vec<Vector2<f64>>,
    /// Bend applied at every joint after the first planet.
    pub bend: f64,
    pub residual: f64,
}

fn pitch_radius(module: f64, teeth: u32) -> f64 {
    module * teeth as f64 / 2.0
}

/// Place the planet chain of one stage.
#[instrument(skip(planets, config), fields(planets = planets.len()))]
pub fn stage_layout(
    sun: Option<u32>,
    planets: &[u32],
    ring: Option<u32>,
    config: &LayoutConfig,
) -> StageLayout {
    let sun_radius = sun.map(|z| pitch_radius(config.module, z));
    let ring_radius = ring.map(|z| pitch_radius(config.module, z));
    let radii: Vec<f64> = planets.iter().map(|&z| pitch_radius(config.module, z)).collect();
    let links: Vec<f64> = radii.windows(2).map(|w| w[0] + w[1]).collect();

    let mut arm = AssemblyKind::Open;
    let mut residual = 0.0;
    let positions: Vec<Vector2<f64>> = match (sun, ring, radii.first(), radii.last()) {
        (_, _, None, _) | (_, _, _, None) => Vec::new(),
        (Some(zs), Some(za), Some(&first), Some(&last)) => {
            let start = sun_radius.unwrap_or(0.0) + first;
            arm = closure_kind(zs, planets, za);
            if arm == AssemblyKind::Curved {
                let target = ring_radius.unwrap_or(0.0) - last;
                let chain = if links.len() == 1 {
                    closed_form_two_planet(start, links[0], target)
                        .map(|p2| {
                            let p1 = Vector2::new(start, 0.0);
                            let joint = p2 - p1;
                            BentChain {
                                positions: vec![p1, p2],
                                bend: joint.y.atan2(joint.x),
                                residual: 0.0,
                            }
                        })
                        .unwrap_or_else(|| bend_chain_bisection(start, &links, target, config.bisection_steps))
                } else {
                    bend_chain_bisection(start, &links, target, config.bisection_steps)
                };
                residual = chain.residual;
                chain.positions
            } else {
                straight_chain(start, &links)
            }
        }
        (None, Some(_), Some(_), Some(&last)) => {
            // Lay the chain inward from the ring contact point.
            let contact = ring_radius.unwrap_or(0.0) - last;
            let inner = contact - links.iter().sum::<f64>();
            straight_chain(inner, &links)
        }
        (Some(_), None, Some(&first), _) => straight_chain(sun_radius.unwrap_or(0.0) + first, &links),
        (None, None, Some(&first), _) => straight_chain(first, &links),
    };

    debug!(arm = %arm, residual, "stage layout");
    StageLayout {
        sun_radius,
        ring_radius,
        planet_radii: radii,
        positions: positions.iter().map(|p| [p.x, p.y]).collect(),
        arm,
        residual,
    }
}

fn straight_chain(start: f64, links: &[f64]) -> Vec<Vector2<f64>> {
    let mut x = start;
    let mut positions = vec![Vector2::new(x, 0.0)];
    for link in links {
        x += link;
        positions.push(Vector2::new(x, 0.0));
    }
    positions
}

/// Second planet centre of a two-planet chain whose first planet sits at
/// `(start, 0)` and whose second must lie `target` from the axis.
///
/// Law of cosines on the triangle axis–p1–p2. Returns `None` when the
/// triangle does not close.
pub fn closed_form_two_planet(start: f64, link: f64, target: f64) -> Option<Vector2<f64>> {
    if start <= 0.0 || target <= 0.0 {
        return None;
    }
    let cos_alpha = (start * start + target * target - link * link) / (2.0 * start * target);
    if !(-1.0..=1.0).contains(&cos_alpha) {
        return None;
    }
    let alpha = cos_alpha.acos();
    Some(Vector2::new(target * alpha.cos(), target * alpha.sin()))
}

/// Bend a chain uniformly until its last centre is `target` from the axis.
///
/// The first planet sits at `(start, 0)`; segment `k` points at angle
/// `k·δ`. `δ` is bisected on `[0, π]` assuming the reach shrinks as the
/// chain folds. Chains that never reach the target return the closest
/// endpoint found with its residual.
pub fn bend_chain_bisection(start: f64, links: &[f64], target: f64, steps: u32) -> BentChain {
    let reach = |bend: f64| place_bent(start, links, bend);
    let error = |bend: f64| {
        let positions = reach(bend);
        positions.last().map_or(0.0, |p| p.norm()) - target
    };

    let (mut lo, mut hi) = (0.0_f64, std::f64::consts::PI);
    let (e_lo, e_hi) = (error(lo), error(hi));
    if e_lo.signum() == e_hi.signum() {
        let bend = if e_lo.abs() <= e_hi.abs() { lo } else { hi };
        let residual = error(bend).abs();
        warn!(residual, "planet chain cannot be bent onto the ring");
        return BentChain {
            positions: reach(bend),
            bend,
            residual,
        };
    }

    for _ in 0..steps {
        let mid = 0.5 * (lo + hi);
        if error(mid).signum() == e_lo.signum() {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let bend = 0.5 * (lo + hi);
    let residual = error(bend).abs();
    debug!(bend, residual, "bent chain");
    BentChain {
        positions: reach(bend),
        bend,
        residual,
    }
}

fn place_bent(start: f64, links: &[f64], bend: f64) -> Vec<Vector2<f64>> {
    let mut current = Vector2::new(start, 0.0);
    let mut positions = vec![current];
    for (k, link) in links.iter().enumerate() {
        let heading = (k + 1) as f64 * bend;
        current += Vector2::new(heading.cos(), heading.sin()) * *link;
        positions.push(current);
    }
    positions
}
