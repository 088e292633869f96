use serde::{Deserialize, Serialize};

use crate::vars::{VarTable, VarTag};

/// What a rotating body is within its stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Sun,
    Planet,
    Ring,
    Carrier,
}

/// A rotating body and the velocity variable that drives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    pub kind: ElementKind,
    /// Tooth count. Absent for carriers.
    #[serde(default)]
    pub teeth: Option<u32>,
    pub velocity_var: String,
    #[serde(default)]
    pub stage: Option<u32>,
    /// Zero-based position in the stage's planet chain.
    #[serde(default)]
    pub planet_index: Option<usize>,
}

impl Element {
    pub fn new(id: &str, kind: ElementKind, teeth: Option<u32>, velocity_var: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            teeth,
            velocity_var: velocity_var.to_string(),
            stage: None,
            planet_index: None,
        }
    }

    pub fn tag(&self) -> VarTag {
        VarTag {
            kind: Some(self.kind),
            stage: self.stage,
            planet_index: self.planet_index,
        }
    }
}

/// How two gears engage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshKind {
    /// Convex-to-convex, e.g. sun to planet.
    External,
    /// Convex-to-concave, e.g. planet to ring.
    Internal,
}

/// Either a named engagement kind or a raw sign factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Engagement {
    Kind { kind: MeshKind },
    Sign { sign: f64 },
}

impl Engagement {
    pub fn external() -> Self {
        Engagement::Kind {
            kind: MeshKind::External,
        }
    }

    pub fn internal() -> Self {
        Engagement::Kind {
            kind: MeshKind::Internal,
        }
    }

    /// Sign factor of the mesh equation: +1 external, -1 internal.
    pub fn sign(&self) -> f64 {
        match self {
            Engagement::Kind {
                kind: MeshKind::External,
            } => 1.0,
            Engagement::Kind {
                kind: MeshKind::Internal,
            } => -1.0,
            Engagement::Sign { sign } => *sign,
        }
    }
}

/// Two gears meshing while both rotate relative to a common carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mesh {
    pub i: String,
    pub j: String,
    pub carrier_var: String,
    #[serde(flatten)]
    pub engagement: Engagement,
}

impl Mesh {
    pub fn new(i: &str, j: &str, carrier_var: &str, kind: MeshKind) -> Self {
        Self {
            i: i.to_string(),
            j: j.to_string(),
            carrier_var: carrier_var.to_string(),
            engagement: Engagement::Kind { kind },
        }
    }
}

/// A scalar linear relation among velocity variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Constraint {
    /// Pin a variable to a speed in rpm.
    Known { var: String, value: f64 },
    /// Tie two variables together.
    Equal { a: String, b: String },
    /// Hold a variable at rest.
    Lock { var: String },
}

impl Constraint {
    pub fn known(var: &str, value: f64) -> Self {
        Constraint::Known {
            var: var.to_string(),
            value,
        }
    }

    pub fn equal(a: &str, b: &str) -> Self {
        Constraint::Equal {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    pub fn lock(var: &str) -> Self {
        Constraint::Lock {
            var: var.to_string(),
        }
    }

    /// Variables referenced by this constraint, in declaration order.
    pub fn vars(&self) -> Vec<&str> {
        match self {
            Constraint::Known { var, .. } | Constraint::Lock { var } => vec![var.as_str()],
            Constraint::Equal { a, b } => vec![a.as_str(), b.as_str()],
        }
    }
}

/// A ratio to report once velocities are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioRequest {
    pub id: String,
    pub num_var: String,
    pub den_var: String,
}

impl RatioRequest {
    pub fn new(id: &str, num_var: &str, den_var: &str) -> Self {
        Self {
            id: id.to_string(),
            num_var: num_var.to_string(),
            den_var: den_var.to_string(),
        }
    }
}

/// Everything needed for one kinematic evaluation.
///
/// A model is a value: it is rebuilt from stage descriptions on every edit
/// and never mutated by the solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub ratio_requests: Vec<RatioRequest>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn add_mesh(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn add_ratio(&mut self, ratio: RatioRequest) {
        self.ratio_requests.push(ratio);
    }

    /// First element driven by `var`.
    pub fn element_by_var(&self, var: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.velocity_var == var)
    }

    /// Collect every velocity variable into a symbol table.
    ///
    /// Order: element variables, then mesh carriers, then constraint
    /// variables. Element kinds become variable tags.
    pub fn variables(&self) -> VarTable {
        let mut table = VarTable::new();
        for element in &self.elements {
            table.intern_tagged(&element.velocity_var, element.tag());
        }
        for mesh in &self.meshes {
            table.intern(&mesh.carrier_var);
        }
        for constraint in &self.constraints {
            for var in constraint.vars() {
                table.intern(var);
            }
        }
        table
    }
}
