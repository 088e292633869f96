//! Derive a [`Model`] from stage descriptions.
//!
//! The model is rebuilt from scratch on every call; element ids and
//! variable names follow the stage naming convention so the same
//! transmission always yields the same model.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, instrument};

use epicycle_types::{
    Constraint, Coupling, Element, ElementKind, Mesh, MeshKind, MemberRef, Model, RatioRequest,
    StageSpec, Transmission,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("stage {stage} is declared more than once")]
    DuplicateStage { stage: u32 },
    #[error("stage {stage} does not exist")]
    UnknownStage { stage: u32 },
    #[error("stage {stage} has no {member}")]
    MissingMember { stage: u32, member: String },
    #[error("stage {stage} has a zero tooth count")]
    ZeroTeeth { stage: u32 },
}

/// Build the kinematic model of a transmission.
///
/// Per stage: sun–planet and planet–planet meshes are external, the last
/// planet meshes the ring internally, and every mesh turns on the stage
/// carrier.
#[instrument(skip(transmission), fields(stages = transmission.stages.len()))]
pub fn build_model(transmission: &Transmission) -> Result<Model, BuildError> {
    let mut model = Model::new();
    let mut seen = HashSet::new();

    for stage in &transmission.stages {
        if !seen.insert(stage.id) {
            return Err(BuildError::DuplicateStage { stage: stage.id });
        }
        add_stage(&mut model, stage)?;
    }

    for coupling in &transmission.couplings {
        let constraint = match coupling {
            Coupling::Equal { a, b } => {
                Constraint::equal(&member_var(transmission, a)?, &member_var(transmission, b)?)
            }
            Coupling::Known { member, rpm } => {
                Constraint::known(&member_var(transmission, member)?, *rpm)
            }
            Coupling::Lock { member } => Constraint::lock(&member_var(transmission, member)?),
        };
        model.add_constraint(constraint);
    }

    for ratio in &transmission.ratios {
        model.add_ratio(RatioRequest::new(
            &ratio.id,
            &member_var(transmission, &ratio.num)?,
            &member_var(transmission, &ratio.den)?,
        ));
    }

    debug!(
        elements = model.elements.len(),
        meshes = model.meshes.len(),
        constraints = model.constraints.len(),
        "model built"
    );
    Ok(model)
}

fn add_stage(model: &mut Model, stage: &StageSpec) -> Result<(), BuildError> {
    let mut teeth = stage.sun.iter().chain(stage.ring.iter()).chain(stage.planets.iter());
    if teeth.any(|&t| t == 0) {
        return Err(BuildError::ZeroTeeth { stage: stage.id });
    }

    let carrier = stage.carrier_var();
    let tagged = |mut element: Element, planet_index: Option<usize>| {
        element.stage = Some(stage.id);
        element.planet_index = planet_index;
        element
    };

    if let Some(sun) = stage.sun {
        model.add_element(tagged(
            Element::new(&format!("sun{}", stage.id), ElementKind::Sun, Some(sun), &stage.sun_var()),
            None,
        ));
    }
    for (k, &planet) in stage.planets.iter().enumerate() {
        model.add_element(tagged(
            Element::new(
                &format!("planet{}_{}", stage.id, k + 1),
                ElementKind::Planet,
                Some(planet),
                &stage.planet_var(k),
            ),
            Some(k),
        ));
    }
    if let Some(ring) = stage.ring {
        model.add_element(tagged(
            Element::new(&format!("ring{}", stage.id), ElementKind::Ring, Some(ring), &stage.ring_var()),
            None,
        ));
    }
    model.add_element(tagged(
        Element::new(&format!("carrier{}", stage.id), ElementKind::Carrier, None, &carrier),
        None,
    ));

    if stage.planets.is_empty() {
        return Ok(());
    }

    if stage.sun.is_some() {
        model.add_mesh(Mesh::new(&stage.sun_var(), &stage.planet_var(0), &carrier, MeshKind::External));
    }
    for k in 1..stage.planets.len() {
        model.add_mesh(Mesh::new(
            &stage.planet_var(k - 1),
            &stage.planet_var(k),
            &carrier,
            MeshKind::External,
        ));
    }
    if stage.ring.is_some() {
        let last = stage.planets.len() - 1;
        model.add_mesh(Mesh::new(&stage.planet_var(last), &stage.ring_var(), &carrier, MeshKind::Internal));
    }
    Ok(())
}

fn member_var(transmission: &Transmission, member: &MemberRef) -> Result<String, BuildError> {
    let stage = transmission
        .stage(member.stage)
        .ok_or(BuildError::UnknownStage { stage: member.stage })?;
    stage.member_var(member.member).ok_or_else(|| BuildError::MissingMember {
        stage: member.stage,
        member: format!("{:?}", member.member).to_lowercase(),
    })
}
