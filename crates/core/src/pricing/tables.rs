use std::fmt;

use serde::{Deserialize, Serialize};

/// Helium volume (m³) consumed by one latex balloon, keyed by diameter label.
/// Listed in the order the size keyboard shows them.
pub const LATEX_SIZE_COEFFICIENTS: &[(&str, f64)] = &[
    ("5", 0.002),
    ("10", 0.009),
    ("12", 0.015),
    ("14", 0.024),
    ("18", 0.056),
    ("24", 0.142),
    ("36", 0.4),
];

/// Helium volume (m³) consumed by one foil balloon of a given shape and size.
pub const FOIL_COEFFICIENTS: &[(FoilForm, FoilSize, f64)] = &[
    (FoilForm::Circle, FoilSize::In18, 0.0145),
    (FoilForm::Heart, FoilSize::In18, 0.0125),
    (FoilForm::Star, FoilSize::In18, 0.011),
    (FoilForm::Circle, FoilSize::In30, 0.0365),
    (FoilForm::Heart, FoilSize::In30, 0.0315),
    (FoilForm::Star, FoilSize::In30, 0.0275),
    (FoilForm::Circle, FoilSize::In32, 0.041),
    (FoilForm::Heart, FoilSize::In32, 0.036),
    (FoilForm::Star, FoilSize::In32, 0.031),
    (FoilForm::Circle, FoilSize::In36, 0.0525),
    (FoilForm::Heart, FoilSize::In36, 0.047),
    (FoilForm::Star, FoilSize::In36, 0.042),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoilForm {
    Circle,
    Heart,
    Star,
}

impl FoilForm {
    pub const ALL: [FoilForm; 3] = [Self::Circle, Self::Heart, Self::Star];

    pub fn label(self) -> &'static str {
        match self {
            Self::Circle => "круг",
            Self::Heart => "сердце",
            Self::Star => "звезда",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Heart => "heart",
            Self::Star => "star",
        }
    }

    /// Case-insensitive match against the user-facing label or the English name.
    pub fn from_label(input: &str) -> Option<Self> {
        let normalized = input.trim().to_lowercase();
        Self::ALL.into_iter().find(|form| form.label() == normalized || form.name() == normalized)
    }
}

impl fmt::Display for FoilForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoilSize {
    #[serde(rename = "18")]
    In18,
    #[serde(rename = "30")]
    In30,
    #[serde(rename = "32")]
    In32,
    #[serde(rename = "36")]
    In36,
}

impl FoilSize {
    pub const ALL: [FoilSize; 4] = [Self::In18, Self::In30, Self::In32, Self::In36];

    /// Bare number as the user types it.
    pub fn input_label(self) -> &'static str {
        match self {
            Self::In18 => "18",
            Self::In30 => "30",
            Self::In32 => "32",
            Self::In36 => "36",
        }
    }

    /// Size key with the inch marker, e.g. `18"`.
    pub fn label(self) -> String {
        format!("{}\"", self.input_label())
    }

    pub fn from_input(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        Self::ALL.into_iter().find(|size| size.input_label() == trimmed)
    }
}

impl fmt::Display for FoilSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Read-only coefficient tables shared by every conversation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricingTables {
    latex: &'static [(&'static str, f64)],
    foil: &'static [(FoilForm, FoilSize, f64)],
}

impl Default for PricingTables {
    fn default() -> Self {
        Self::standard()
    }
}

impl PricingTables {
    pub const fn new(
        latex: &'static [(&'static str, f64)],
        foil: &'static [(FoilForm, FoilSize, f64)],
    ) -> Self {
        Self { latex, foil }
    }

    pub const fn standard() -> Self {
        Self::new(LATEX_SIZE_COEFFICIENTS, FOIL_COEFFICIENTS)
    }

    pub fn latex_coefficient(&self, label: &str) -> Option<f64> {
        let label = label.trim();
        self.latex.iter().find(|(known, _)| *known == label).map(|(_, coefficient)| *coefficient)
    }

    pub fn latex_labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.latex.iter().map(|(label, _)| *label)
    }

    pub fn latex_entries(&self) -> &'static [(&'static str, f64)] {
        self.latex
    }

    pub fn foil_coefficient(&self, form: FoilForm, size: FoilSize) -> Option<f64> {
        self.foil
            .iter()
            .find(|(known_form, known_size, _)| *known_form == form && *known_size == size)
            .map(|(_, _, coefficient)| *coefficient)
    }

    pub fn foil_entries(&self) -> &'static [(FoilForm, FoilSize, f64)] {
        self.foil
    }
}
