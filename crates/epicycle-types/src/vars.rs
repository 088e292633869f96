use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ElementKind;

/// Dense index of a velocity variable inside one compiled model.
///
/// Ids are assigned in first-appearance order and are only meaningful
/// together with the [`VarTable`] that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Structural tag of a variable: which member of which stage it drives.
///
/// Variables that only appear in constraints (never on an element) carry
/// no kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarTag {
    pub kind: Option<ElementKind>,
    pub stage: Option<u32>,
    pub planet_index: Option<usize>,
}

/// Symbol table mapping display names to dense [`VarId`]s.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    names: Vec<String>,
    tags: Vec<VarTag>,
    index: HashMap<String, VarId>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, allocating the next id if it is new.
    pub fn intern(&mut self, name: &str) -> VarId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = VarId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.tags.push(VarTag::default());
        self.index.insert(name.to_string(), id);
        id
    }

    /// Intern `name` and attach `tag` unless the variable is already tagged.
    pub fn intern_tagged(&mut self, name: &str, tag: VarTag) -> VarId {
        let id = self.intern(name);
        let slot = &mut self.tags[id.index()];
        if slot.kind.is_none() {
            *slot = tag;
        }
        id
    }

    pub fn id(&self, name: &str) -> Option<VarId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: VarId) -> &str {
        &self.names[id.index()]
    }

    pub fn tag(&self, id: VarId) -> &VarTag {
        &self.tags[id.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (VarId(i as u32), n.as_str()))
    }
}
