use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pricing::figure::FigureDimensions;
use crate::pricing::tables::{FoilForm, FoilSize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalloonType {
    Latex,
    Foil,
    Figure,
}

impl BalloonType {
    pub const ALL: [BalloonType; 3] = [Self::Latex, Self::Foil, Self::Figure];

    pub fn label(self) -> &'static str {
        match self {
            Self::Latex => "Латексный",
            Self::Foil => "Фольгированный",
            Self::Figure => "Фигура",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Latex => "latex",
            Self::Foil => "foil",
            Self::Figure => "figure",
        }
    }

    /// Case-insensitive match against the keyboard label or the English name.
    pub fn from_label(input: &str) -> Option<Self> {
        let normalized = input.trim().to_lowercase();
        Self::ALL.into_iter().find(|balloon| {
            balloon.label().to_lowercase() == normalized || balloon.name() == normalized
        })
    }
}

/// Fieldless name of a state, used for logging and audit metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    Start,
    SelectType,
    LatexSize,
    LatexPrice,
    FoilForm,
    FoilSize,
    FoilPrice,
    FigureHeight,
    FigureWidth,
    FigurePrice,
    Ended,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A resting state of one conversation. Fields collected so far travel with the
/// variant, so a later state cannot exist without the inputs it depends on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConversationState {
    SelectType,
    LatexSize,
    LatexPrice { size: String },
    FoilForm,
    FoilSize { form: FoilForm },
    FoilPrice { form: FoilForm, size: FoilSize },
    FigureHeight,
    FigureWidth { height_cm: f64 },
    FigurePrice { dimensions: FigureDimensions },
}

impl ConversationState {
    pub fn kind(&self) -> StateKind {
        match self {
            Self::SelectType => StateKind::SelectType,
            Self::LatexSize => StateKind::LatexSize,
            Self::LatexPrice { .. } => StateKind::LatexPrice,
            Self::FoilForm => StateKind::FoilForm,
            Self::FoilSize { .. } => StateKind::FoilSize,
            Self::FoilPrice { .. } => StateKind::FoilPrice,
            Self::FigureHeight => StateKind::FigureHeight,
            Self::FigureWidth { .. } => StateKind::FigureWidth,
            Self::FigurePrice { .. } => StateKind::FigurePrice,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputProblem {
    UnknownBalloonType,
    UnknownLatexSize,
    UnknownFoilForm,
    UnknownFoilSize,
    NotAPositiveNumber,
    NotANumber,
}

/// What the transport should do with the reply keyboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyboardHint {
    Choices(Vec<String>),
    Remove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyKind {
    Prompt,
    Reprompt(InputProblem),
    Rejected,
    Estimate,
    NoPricingData,
    CalculationFailed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
    pub keyboard: KeyboardHint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: StateKind,
    /// `None` once the conversation is over.
    pub to: Option<ConversationState>,
    pub reply: Reply,
}

impl TransitionOutcome {
    pub fn to_kind(&self) -> StateKind {
        self.to.as_ref().map(ConversationState::kind).unwrap_or(StateKind::Ended)
    }
}

#[cfg(test)]
mod tests {
    use super::{BalloonType, ConversationState, StateKind};
    use crate::pricing::tables::FoilForm;

    #[test]
    fn balloon_type_matches_labels_case_insensitively() {
        assert_eq!(BalloonType::from_label("латексный"), Some(BalloonType::Latex));
        assert_eq!(BalloonType::from_label("ФОЛЬГИРОВАННЫЙ"), Some(BalloonType::Foil));
        assert_eq!(BalloonType::from_label(" фигура\n"), Some(BalloonType::Figure));
        assert_eq!(BalloonType::from_label("Foil"), Some(BalloonType::Foil));
        assert_eq!(BalloonType::from_label("бумажный"), None);
    }

    #[test]
    fn state_reports_its_kind() {
        let state = ConversationState::FoilSize { form: FoilForm::Heart };
        assert_eq!(state.kind(), StateKind::FoilSize);
        let width = ConversationState::FigureWidth { height_cm: 40.0 };
        assert_eq!(width.kind(), StateKind::FigureWidth);
    }
}
