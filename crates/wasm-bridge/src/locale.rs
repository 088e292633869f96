//! Human-readable assembly messages.
//!
//! The kernel only produces message keys with parameters; text lives here so
//! the host can switch language without re-running anything.

use serde::{Deserialize, Serialize};

use epicycle_types::{AssemblyKind, AssemblyMessage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Pt,
}

/// Render an assembly message in `locale`.
pub fn render(message: &AssemblyMessage, locale: Locale) -> String {
    match locale {
        Locale::En => render_en(message),
        Locale::Pt => render_pt(message),
    }
}

/// Short label for an assembly kind.
pub fn kind_label(kind: AssemblyKind, locale: Locale) -> &'static str {
    match (locale, kind) {
        (Locale::En, AssemblyKind::Open) => "open",
        (Locale::En, AssemblyKind::Straight) => "straight arm",
        (Locale::En, AssemblyKind::Curved) => "curved arm",
        (Locale::En, AssemblyKind::Impossible) => "impossible",
        (Locale::Pt, AssemblyKind::Open) => "aberto",
        (Locale::Pt, AssemblyKind::Straight) => "braço reto",
        (Locale::Pt, AssemblyKind::Curved) => "braço curvo",
        (Locale::Pt, AssemblyKind::Impossible) => "impossível",
    }
}

fn render_en(message: &AssemblyMessage) -> String {
    match *message {
        AssemblyMessage::OpenStage => "No ring: the planet chain is not closed.".to_string(),
        AssemblyMessage::MissingPlanet => "Sun and ring need at least one planet between them.".to_string(),
        AssemblyMessage::RingClearance { ring, required } => {
            format!("Ring with {ring} teeth clears the planets (minimum {required}).")
        }
        AssemblyMessage::RingTooSmall { ring, required, copies } => {
            format!("Ring with {ring} teeth is too small for {copies} planet copies; needs at least {required}.")
        }
        AssemblyMessage::ModulusMismatch { ring, expected } => {
            format!("With one planet the ring must have exactly {expected} teeth, not {ring}.")
        }
        AssemblyMessage::StraightArm { ring, limit } => {
            format!("Ring with {ring} teeth matches the chain reach {limit}: straight carrier arm.")
        }
        AssemblyMessage::CurvedArm { ring, limit } => {
            format!("Ring with {ring} teeth is inside the chain reach {limit}: curved carrier arm.")
        }
        AssemblyMessage::ExceedsReach { ring, limit } => {
            format!("Ring with {ring} teeth exceeds the chain reach {limit}; the planets cannot reach it.")
        }
    }
}

fn render_pt(message: &AssemblyMessage) -> String {
    match *message {
        AssemblyMessage::OpenStage => "Sem anel: a cadeia de planetas não fecha.".to_string(),
        AssemblyMessage::MissingPlanet => "Sol e anel precisam de pelo menos um planeta entre eles.".to_string(),
        AssemblyMessage::RingClearance { ring, required } => {
            format!("Anel com {ring} dentes comporta os planetas (mínimo {required}).")
        }
        AssemblyMessage::RingTooSmall { ring, required, copies } => {
            format!("Anel com {ring} dentes é pequeno demais para {copies} cópias; precisa de pelo menos {required}.")
        }
        AssemblyMessage::ModulusMismatch { ring, expected } => {
            format!("Com um planeta o anel deve ter exatamente {expected} dentes, não {ring}.")
        }
        AssemblyMessage::StraightArm { ring, limit } => {
            format!("Anel com {ring} dentes coincide com o alcance {limit}: braço do porta-satélites reto.")
        }
        AssemblyMessage::CurvedArm { ring, limit } => {
            format!("Anel com {ring} dentes está dentro do alcance {limit}: braço do porta-satélites curvo.")
        }
        AssemblyMessage::ExceedsReach { ring, limit } => {
            format!("Anel com {ring} dentes excede o alcance {limit}; os planetas não o alcançam.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_parameters_in_both_locales() {
        let message = AssemblyMessage::ModulusMismatch { ring: 41, expected: 40 };
        let en = render(&message, Locale::En);
        let pt = render(&message, Locale::Pt);
        assert!(en.contains("40") && en.contains("41"));
        assert!(pt.contains("40") && pt.contains("41"));
        assert_ne!(en, pt);
    }

    #[test]
    fn locale_parses_lowercase() {
        let locale: Locale = serde_json::from_str("\"pt\"").unwrap();
        assert_eq!(locale, Locale::Pt);
        assert_eq!(Locale::default(), Locale::En);
    }

    #[test]
    fn kind_labels() {
        assert_eq!(kind_label(AssemblyKind::Curved, Locale::En), "curved arm");
        assert_eq!(kind_label(AssemblyKind::Impossible, Locale::Pt), "impossível");
    }
}
