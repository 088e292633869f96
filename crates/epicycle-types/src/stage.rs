//! User-facing stage descriptions.
//!
//! A [`Transmission`] is what an editor holds: stages with tooth counts plus
//! a list of couplings. It is turned into a [`crate::Model`] by the kernel's
//! model builder every time it changes.

use serde::{Deserialize, Serialize};

fn default_copies() -> u32 {
    1
}

/// One sun / planet-chain / ring / carrier grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSpec {
    pub id: u32,
    #[serde(default)]
    pub sun: Option<u32>,
    /// Tooth counts of the planet chain, sun side first.
    #[serde(default)]
    pub planets: Vec<u32>,
    #[serde(default)]
    pub ring: Option<u32>,
    /// Number of copies of the planet chain around the carrier.
    #[serde(default = "default_copies")]
    pub copies: u32,
    /// Overrides the carrier variable so several stages share one carrier.
    #[serde(default)]
    pub carrier: Option<String>,
}

impl StageSpec {
    pub fn new(id: u32, sun: Option<u32>, planets: Vec<u32>, ring: Option<u32>) -> Self {
        Self {
            id,
            sun,
            planets,
            ring,
            copies: 1,
            carrier: None,
        }
    }

    pub fn with_copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    pub fn with_carrier(mut self, carrier: &str) -> Self {
        self.carrier = Some(carrier.to_string());
        self
    }

    pub fn sun_var(&self) -> String {
        sun_var(self.id)
    }

    /// Variable of the planet at zero-based chain position `index`.
    pub fn planet_var(&self, index: usize) -> String {
        planet_var(self.id, index)
    }

    pub fn ring_var(&self) -> String {
        ring_var(self.id)
    }

    pub fn carrier_var(&self) -> String {
        self.carrier.clone().unwrap_or_else(|| carrier_var(self.id))
    }

    /// Variable name of `member`, if the stage has that member.
    pub fn member_var(&self, member: Member) -> Option<String> {
        match member {
            Member::Sun => self.sun.map(|_| self.sun_var()),
            Member::Ring => self.ring.map(|_| self.ring_var()),
            Member::Carrier => Some(self.carrier_var()),
            Member::Planet(index) => (index < self.planets.len()).then(|| self.planet_var(index)),
        }
    }
}

pub fn sun_var(stage: u32) -> String {
    format!("omega_s{stage}")
}

/// Planet variables are numbered from 1 in their names.
pub fn planet_var(stage: u32, index: usize) -> String {
    format!("omega_p{stage}_{}", index + 1)
}

pub fn ring_var(stage: u32) -> String {
    format!("omega_a{stage}")
}

pub fn carrier_var(stage: u32) -> String {
    format!("omega_c{stage}")
}

/// A member of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Member {
    Sun,
    Ring,
    Carrier,
    /// Zero-based planet chain position.
    Planet(usize),
}

/// A member of a specific stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    pub stage: u32,
    pub member: Member,
}

impl MemberRef {
    pub fn new(stage: u32, member: Member) -> Self {
        Self { stage, member }
    }

    pub fn sun(stage: u32) -> Self {
        Self::new(stage, Member::Sun)
    }

    pub fn ring(stage: u32) -> Self {
        Self::new(stage, Member::Ring)
    }

    pub fn carrier(stage: u32) -> Self {
        Self::new(stage, Member::Carrier)
    }

    pub fn planet(stage: u32, index: usize) -> Self {
        Self::new(stage, Member::Planet(index))
    }
}

/// A mechanical coupling or boundary condition between stage members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Coupling {
    Equal { a: MemberRef, b: MemberRef },
    Known { member: MemberRef, rpm: f64 },
    Lock { member: MemberRef },
}

/// A ratio between two stage members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioSpec {
    pub id: String,
    pub num: MemberRef,
    pub den: MemberRef,
}

/// A complete, editable gear train description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transmission {
    #[serde(default)]
    pub stages: Vec<StageSpec>,
    #[serde(default)]
    pub couplings: Vec<Coupling>,
    #[serde(default)]
    pub ratios: Vec<RatioSpec>,
}

impl Transmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self, id: u32) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_naming() {
        let stage = StageSpec::new(2, Some(30), vec![12, 14], Some(72));
        assert_eq!(stage.sun_var(), "omega_s2");
        assert_eq!(stage.planet_var(0), "omega_p2_1");
        assert_eq!(stage.planet_var(1), "omega_p2_2");
        assert_eq!(stage.ring_var(), "omega_a2");
        assert_eq!(stage.carrier_var(), "omega_c2");
    }

    #[test]
    fn shared_carrier_override() {
        let stage = StageSpec::new(3, Some(30), vec![12], None).with_carrier("omega_c1");
        assert_eq!(stage.carrier_var(), "omega_c1");
    }

    #[test]
    fn member_var_requires_member() {
        let stage = StageSpec::new(1, None, vec![18], Some(60));
        assert_eq!(stage.member_var(Member::Sun), None);
        assert_eq!(stage.member_var(Member::Ring).as_deref(), Some("omega_a1"));
        assert_eq!(stage.member_var(Member::Planet(1)), None);
    }

    #[test]
    fn stage_json_defaults() {
        let stage: StageSpec = serde_json::from_str(r#"{"id":1,"sun":20,"planets":[20],"ring":60}"#).unwrap();
        assert_eq!(stage.copies, 1);
        assert_eq!(stage.carrier, None);
    }
}
