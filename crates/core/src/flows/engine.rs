use crate::flows::prompts;
use crate::flows::states::{
    BalloonType, ConversationState, InputProblem, KeyboardHint, Reply, ReplyKind, StateKind,
    TransitionOutcome,
};
use crate::pricing::figure::FigureDimensions;
use crate::pricing::tables::{FoilForm, FoilSize};
use crate::pricing::{EstimateRequest, HeliumCalculator, PricingError, StandardCalculator};

pub const DEFAULT_REQUIRED_CHANNEL: &str = "@maxdecorkrd";

/// Pure transition table of the balloon conversation. Holds no per-user data.
pub struct ConversationEngine<C = StandardCalculator> {
    calculator: C,
    required_channel: String,
}

impl Default for ConversationEngine<StandardCalculator> {
    fn default() -> Self {
        Self::new(StandardCalculator::default(), DEFAULT_REQUIRED_CHANNEL)
    }
}

impl<C> ConversationEngine<C>
where
    C: HeliumCalculator,
{
    pub fn new(calculator: C, required_channel: impl Into<String>) -> Self {
        Self { calculator, required_channel: required_channel.into() }
    }

    /// Entry point for `/start` once the membership answer is known.
    pub fn start(&self, is_member: bool) -> TransitionOutcome {
        if !is_member {
            return TransitionOutcome {
                from: StateKind::Start,
                to: None,
                reply: Reply {
                    kind: ReplyKind::Rejected,
                    text: prompts::rejection(&self.required_channel),
                    keyboard: KeyboardHint::Remove,
                },
            };
        }

        let next = ConversationState::SelectType;
        let text = format!("{}\n{}", prompts::GREETING, prompts::prompt_text(&next));
        self.advance(StateKind::Start, next, text)
    }

    pub fn apply(&self, current: &ConversationState, input: &str) -> TransitionOutcome {
        let input = input.trim();
        let from = current.kind();

        let next = match current {
            ConversationState::SelectType => match BalloonType::from_label(input) {
                Some(BalloonType::Latex) => ConversationState::LatexSize,
                Some(BalloonType::Foil) => ConversationState::FoilForm,
                Some(BalloonType::Figure) => ConversationState::FigureHeight,
                None => return self.reprompt(current, InputProblem::UnknownBalloonType),
            },
            ConversationState::LatexSize => {
                if self.calculator.tables().latex_coefficient(input).is_none() {
                    return self.reprompt(current, InputProblem::UnknownLatexSize);
                }
                ConversationState::LatexPrice { size: input.to_owned() }
            }
            ConversationState::FoilForm => match FoilForm::from_label(input) {
                Some(form) => ConversationState::FoilSize { form },
                None => return self.reprompt(current, InputProblem::UnknownFoilForm),
            },
            ConversationState::FoilSize { form } => match FoilSize::from_input(input) {
                Some(size) => ConversationState::FoilPrice { form: *form, size },
                None => return self.reprompt(current, InputProblem::UnknownFoilSize),
            },
            ConversationState::FigureHeight => match parse_positive(input) {
                Some(height_cm) => ConversationState::FigureWidth { height_cm },
                None => return self.reprompt(current, InputProblem::NotAPositiveNumber),
            },
            ConversationState::FigureWidth { height_cm } => {
                let dimensions = parse_positive(input)
                    .and_then(|width_cm| FigureDimensions::new(*height_cm, width_cm).ok());
                match dimensions {
                    Some(dimensions) => ConversationState::FigurePrice { dimensions },
                    None => return self.reprompt(current, InputProblem::NotAPositiveNumber),
                }
            }
            ConversationState::LatexPrice { .. }
            | ConversationState::FoilPrice { .. }
            | ConversationState::FigurePrice { .. } => {
                return match parse_decimal(input) {
                    Some(price) => self.finish(current, price),
                    None => self.reprompt(current, InputProblem::NotANumber),
                };
            }
        };

        let text = match prompts::confirmation(&next) {
            Some(confirmation) => format!("{confirmation}\n{}", prompts::prompt_text(&next)),
            None => prompts::prompt_text(&next).to_owned(),
        };
        self.advance(from, next, text)
    }

    fn advance(&self, from: StateKind, next: ConversationState, text: String) -> TransitionOutcome {
        let keyboard = prompts::keyboard_for(&next, self.calculator.tables());
        TransitionOutcome {
            from,
            to: Some(next),
            reply: Reply { kind: ReplyKind::Prompt, text, keyboard },
        }
    }

    fn reprompt(&self, current: &ConversationState, problem: InputProblem) -> TransitionOutcome {
        TransitionOutcome {
            from: current.kind(),
            to: Some(current.clone()),
            reply: Reply {
                kind: ReplyKind::Reprompt(problem),
                text: format!(
                    "{}\n{}",
                    prompts::warning(current, problem),
                    prompts::prompt_text(current)
                ),
                keyboard: prompts::keyboard_for(current, self.calculator.tables()),
            },
        }
    }

    fn finish(&self, current: &ConversationState, price: f64) -> TransitionOutcome {
        let reply = match price_request(current, price) {
            Some(request) => match self.calculator.estimate(&request) {
                Ok(estimate) => Reply {
                    kind: ReplyKind::Estimate,
                    text: prompts::estimate_text(&estimate),
                    keyboard: KeyboardHint::Remove,
                },
                Err(PricingError::MissingFoilData { .. }) => Reply {
                    kind: ReplyKind::NoPricingData,
                    text: prompts::with_restart_hint(prompts::NO_PRICING_DATA),
                    keyboard: KeyboardHint::Remove,
                },
                Err(_) => calculation_failed(),
            },
            None => calculation_failed(),
        };

        TransitionOutcome { from: current.kind(), to: None, reply }
    }
}

fn calculation_failed() -> Reply {
    Reply {
        kind: ReplyKind::CalculationFailed,
        text: prompts::with_restart_hint(prompts::CALCULATION_FAILED),
        keyboard: KeyboardHint::Remove,
    }
}

fn price_request(state: &ConversationState, price: f64) -> Option<EstimateRequest> {
    match state {
        ConversationState::LatexPrice { size } => {
            Some(EstimateRequest::Latex { size: size.clone(), price })
        }
        ConversationState::FoilPrice { form, size } => {
            Some(EstimateRequest::Foil { form: *form, size: *size, price })
        }
        ConversationState::FigurePrice { dimensions } => {
            Some(EstimateRequest::Figure { dimensions: *dimensions, price })
        }
        _ => None,
    }
}

/// Finite decimal; `NaN` and infinities are not numbers a user meant to type.
pub fn parse_decimal(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn parse_positive(input: &str) -> Option<f64> {
    parse_decimal(input).filter(|value| *value > 0.0)
}

#[cfg(test)]
mod tests {
    use super::{parse_decimal, parse_positive, ConversationEngine};
    use crate::flows::states::{
        ConversationState, InputProblem, KeyboardHint, ReplyKind, StateKind,
    };
    use crate::pricing::figure::FigureDimensions;
    use crate::pricing::tables::{FoilForm, FoilSize, PricingTables};
    use crate::pricing::{
        Estimate, EstimateRequest, HeliumCalculator, PricingError, StandardCalculator,
    };

    fn run(engine: &ConversationEngine, inputs: &[&str]) -> (Option<ConversationState>, String) {
        let mut state = engine.start(true).to;
        let mut last_text = String::new();
        for input in inputs {
            let current = state.expect("conversation ended early");
            let outcome = engine.apply(&current, input);
            last_text = outcome.reply.text;
            state = outcome.to;
        }
        (state, last_text)
    }

    #[test]
    fn member_start_prompts_for_balloon_type() {
        let outcome = ConversationEngine::default().start(true);
        assert_eq!(outcome.from, StateKind::Start);
        assert_eq!(outcome.to, Some(ConversationState::SelectType));
        assert!(matches!(
            outcome.reply.keyboard,
            KeyboardHint::Choices(ref labels) if labels.len() == 3
        ));
    }

    #[test]
    fn non_member_is_rejected_without_entering_a_state() {
        let outcome = ConversationEngine::default().start(false);
        assert_eq!(outcome.to, None);
        assert_eq!(outcome.reply.kind, ReplyKind::Rejected);
        assert!(outcome.reply.text.contains("@maxdecorkrd"));
    }

    #[test]
    fn latex_path_ends_with_estimate() {
        let engine = ConversationEngine::default();
        let (state, text) = run(&engine, &["Латексный", "10", "500"]);
        assert_eq!(state, None);
        assert!(text.contains("0.86 руб."));
        assert!(text.contains("583 шаров"));
    }

    #[test]
    fn foil_path_stores_size_with_inch_marker() {
        let engine = ConversationEngine::default();
        let (state, text) = run(&engine, &["фольгированный", "Сердце", "30"]);
        assert_eq!(
            state,
            Some(ConversationState::FoilPrice { form: FoilForm::Heart, size: FoilSize::In30 })
        );
        assert!(text.starts_with("✅ Размер 30\" выбран."));
    }

    #[test]
    fn figure_path_reports_volume_and_whole_figures() {
        let engine = ConversationEngine::default();
        let (state, text) = run(&engine, &["фигура", "40", "30", "5000"]);
        assert_eq!(state, None);
        assert!(text.contains("1608 фигур"));
    }

    #[test]
    fn unknown_label_keeps_state_and_reissues_prompt() {
        let engine = ConversationEngine::default();
        let outcome = engine.apply(&ConversationState::LatexSize, "11");

        assert_eq!(outcome.to, Some(ConversationState::LatexSize));
        assert_eq!(outcome.reply.kind, ReplyKind::Reprompt(InputProblem::UnknownLatexSize));
        assert!(outcome.reply.text.ends_with("📏 Выберите размер латексного шара:"));
        assert!(matches!(outcome.reply.keyboard, KeyboardHint::Choices(_)));
    }

    #[test]
    fn non_numeric_input_in_numeric_states_changes_nothing() {
        let engine = ConversationEngine::default();
        let dimensions = FigureDimensions::new(40.0, 30.0).expect("dimensions");
        let states = [
            ConversationState::FigureHeight,
            ConversationState::FigureWidth { height_cm: 40.0 },
            ConversationState::LatexPrice { size: "12".to_owned() },
            ConversationState::FoilPrice { form: FoilForm::Star, size: FoilSize::In18 },
            ConversationState::FigurePrice { dimensions },
        ];

        for state in states {
            for input in ["abc", "", "NaN", "inf", "1,5"] {
                let first = engine.apply(&state, input);
                let second = engine.apply(&state, input);
                assert_eq!(first.to.as_ref(), Some(&state), "{state:?} moved on `{input}`");
                assert!(matches!(first.reply.kind, ReplyKind::Reprompt(_)));
                assert_eq!(first.reply, second.reply, "prompt must be re-issued verbatim");
            }
        }
    }

    #[test]
    fn figure_dimensions_must_be_positive() {
        let engine = ConversationEngine::default();
        for input in ["0", "-12", "-0.5"] {
            let outcome = engine.apply(&ConversationState::FigureHeight, input);
            assert_eq!(outcome.to, Some(ConversationState::FigureHeight));
        }
        let outcome = engine.apply(&ConversationState::FigureWidth { height_cm: 12.5 }, "0");
        assert_eq!(outcome.to, Some(ConversationState::FigureWidth { height_cm: 12.5 }));
    }

    #[test]
    fn missing_foil_entry_ends_with_explanation() {
        static FOIL: &[(FoilForm, FoilSize, f64)] = &[];
        let engine = ConversationEngine::new(
            StandardCalculator::new(PricingTables::new(&[("10", 0.009)], FOIL)),
            "@channel",
        );
        let outcome = engine.apply(
            &ConversationState::FoilPrice { form: FoilForm::Circle, size: FoilSize::In36 },
            "900",
        );

        assert_eq!(outcome.to, None);
        assert_eq!(outcome.reply.kind, ReplyKind::NoPricingData);
        assert!(outcome.reply.text.contains("Нет данных"));
    }

    #[test]
    fn calculator_failure_ends_with_generic_message() {
        struct BrokenCalculator(PricingTables);

        impl HeliumCalculator for BrokenCalculator {
            fn tables(&self) -> &PricingTables {
                &self.0
            }

            fn estimate(&self, _request: &EstimateRequest) -> Result<Estimate, PricingError> {
                Err(PricingError::NonFiniteResult("cost per unit"))
            }
        }

        let engine = ConversationEngine::new(BrokenCalculator(PricingTables::standard()), "@c");
        let outcome = engine.apply(&ConversationState::LatexPrice { size: "5".to_owned() }, "100");

        assert_eq!(outcome.to, None);
        assert_eq!(outcome.reply.kind, ReplyKind::CalculationFailed);
        assert_eq!(outcome.to_kind(), StateKind::Ended);
    }

    #[test]
    fn decimal_parsing_accepts_plain_numbers_only() {
        assert_eq!(parse_decimal(" 1500.50 "), Some(1500.5));
        assert_eq!(parse_decimal("-3"), Some(-3.0));
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("1,5"), None);
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("2e1"), Some(20.0));
    }
}
