//! Whole-model carrier geometry check.
//!
//! For each carrier, meshes turning on it form an undirected graph over
//! velocity variables. Every sun that reaches a ring through that graph
//! defines a planet path whose tooth counts decide whether the carrier arm
//! is straight, curved or cannot close. The result is informational; the
//! per-stage validator is what gates a stage.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use epicycle_types::{AssemblyKind, ElementKind, Model, VarId, VarTable};

use crate::assembly::closure_kind;

/// Whether a path's tooth counts were checked numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathValidation {
    Ok,
    Failed,
    Skipped,
}

/// Shortest mesh path from a sun to a ring on one carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyPath {
    pub carrier_var: String,
    /// Variables from sun to ring inclusive.
    pub path: Vec<String>,
    pub planet_count: usize,
    pub validation: PathValidation,
    pub status: AssemblyKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyReport {
    /// `Open` when no sun reaches a ring at all.
    pub summary: AssemblyKind,
    pub paths: Vec<TopologyPath>,
}

/// Adjacency of one carrier's mesh graph, in mesh order.
struct CarrierGraph {
    carrier: VarId,
    adjacency: HashMap<VarId, Vec<VarId>>,
    nodes: Vec<VarId>,
}

impl CarrierGraph {
    fn new(carrier: VarId) -> Self {
        Self {
            carrier,
            adjacency: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    fn link(&mut self, a: VarId, b: VarId) {
        for (from, to) in [(a, b), (b, a)] {
            let neighbors = self.adjacency.entry(from).or_insert_with(|| {
                self.nodes.push(from);
                Vec::new()
            });
            if !neighbors.contains(&to) {
                neighbors.push(to);
            }
        }
    }

    /// Breadth-first search from `start`; returns each reached node's parent.
    ///
    /// Only planets are expanded, so every reached ring is joined to `start`
    /// through planets alone.
    fn bfs(&self, vars: &VarTable, start: VarId) -> HashMap<VarId, Option<VarId>> {
        let mut parent = HashMap::new();
        let mut queue = VecDeque::new();
        parent.insert(start, None);
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            if node != start && vars.tag(node).kind != Some(ElementKind::Planet) {
                continue;
            }
            if let Some(neighbors) = self.adjacency.get(&node) {
                for &next in neighbors {
                    if let std::collections::hash_map::Entry::Vacant(e) = parent.entry(next) {
                        e.insert(Some(node));
                        queue.push_back(next);
                    }
                }
            }
        }
        parent
    }

    fn nodes_of_kind<'a>(&'a self, vars: &'a VarTable, kind: ElementKind) -> impl Iterator<Item = VarId> + 'a {
        self.nodes
            .iter()
            .copied()
            .filter(move |&id| vars.tag(id).kind == Some(kind))
    }
}

fn unwind(parent: &HashMap<VarId, Option<VarId>>, end: VarId) -> Vec<VarId> {
    let mut path = vec![end];
    let mut cursor = end;
    while let Some(Some(prev)) = parent.get(&cursor) {
        path.push(*prev);
        cursor = *prev;
    }
    path.reverse();
    path
}

/// Analyze every carrier's sun-to-ring paths.
#[instrument(skip(model), fields(meshes = model.meshes.len()))]
pub fn analyze_topology(model: &Model) -> TopologyReport {
    let vars = model.variables();
    let mut graphs: Vec<CarrierGraph> = Vec::new();

    for mesh in &model.meshes {
        let (Some(i), Some(j), Some(c)) = (
            vars.id(&mesh.i),
            vars.id(&mesh.j),
            vars.id(&mesh.carrier_var),
        ) else {
            continue;
        };
        let index = match graphs.iter().position(|g| g.carrier == c) {
            Some(index) => index,
            None => {
                graphs.push(CarrierGraph::new(c));
                graphs.len() - 1
            }
        };
        graphs[index].link(i, j);
    }

    let mut paths = Vec::new();
    for graph in &graphs {
        for sun in graph.nodes_of_kind(&vars, ElementKind::Sun) {
            let parent = graph.bfs(&vars, sun);
            for ring in graph.nodes_of_kind(&vars, ElementKind::Ring) {
                if !parent.contains_key(&ring) {
                    continue;
                }
                let ids = unwind(&parent, ring);
                paths.push(classify_path(model, &vars, graph.carrier, &ids));
            }
        }
    }

    let summary = summarize(&paths);
    info!(paths = paths.len(), summary = %summary, "topology analyzed");
    TopologyReport { summary, paths }
}

fn classify_path(model: &Model, vars: &VarTable, carrier: VarId, ids: &[VarId]) -> TopologyPath {
    let names: Vec<String> = ids.iter().map(|&id| vars.name(id).to_string()).collect();
    let planet_count = ids.len().saturating_sub(2);
    let teeth: Option<Vec<u32>> = names
        .iter()
        .map(|name| model.element_by_var(name).and_then(|e| e.teeth))
        .collect();

    let (validation, status) = match (planet_count, teeth) {
        (0, _) => (PathValidation::Failed, AssemblyKind::Impossible),
        (1..=2, Some(teeth)) => {
            let sun = teeth[0];
            let ring = teeth[teeth.len() - 1];
            match closure_kind(sun, &teeth[1..teeth.len() - 1], ring) {
                AssemblyKind::Impossible => (PathValidation::Failed, AssemblyKind::Impossible),
                kind => (PathValidation::Ok, kind),
            }
        }
        _ => (PathValidation::Skipped, AssemblyKind::Curved),
    };

    TopologyPath {
        carrier_var: vars.name(carrier).to_string(),
        path: names,
        planet_count,
        validation,
        status,
    }
}

fn summarize(paths: &[TopologyPath]) -> AssemblyKind {
    if paths.is_empty() {
        AssemblyKind::Open
    } else if paths.iter().any(|p| p.status == AssemblyKind::Impossible) {
        AssemblyKind::Impossible
    } else if paths.iter().any(|p| p.status == AssemblyKind::Straight) {
        AssemblyKind::Straight
    } else {
        AssemblyKind::Curved
    }
}
