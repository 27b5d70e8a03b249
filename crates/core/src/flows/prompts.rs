//! User-facing texts and keyboard hints for every conversation state.

use crate::flows::states::{BalloonType, ConversationState, InputProblem, KeyboardHint};
use crate::pricing::figure::FigureEstimate;
use crate::pricing::tables::{FoilForm, FoilSize, PricingTables};
use crate::pricing::{Estimate, UnitEstimate};

pub const GREETING: &str = "👋 Привет! Я бот для расчёта стоимости гелия в шарах.";
pub const RESTART_HINT: &str = "🔁 Чтобы начать заново, нажмите /start";
pub const NO_PRICING_DATA: &str = "⚠️ Нет данных для выбранной формы и размера.";
pub const CALCULATION_FAILED: &str = "❌ Не удалось выполнить расчёт.";

pub fn prompt_text(state: &ConversationState) -> &'static str {
    match state {
        ConversationState::SelectType => "🎈 Выбери тип шара:",
        ConversationState::LatexSize => "📏 Выберите размер латексного шара:",
        ConversationState::LatexPrice { .. } => "💵 Введите стоимость баллона гелия 5.25 м³:",
        ConversationState::FoilForm => {
            "🔶 Введите форму фольгированного шара (круг, сердце, звезда):"
        }
        ConversationState::FoilSize { .. } => "📏 Введите размер шара (18, 30, 32, 36):",
        ConversationState::FigureHeight => "📐 Введите высоту фигуры в см:",
        ConversationState::FigureWidth { .. } => "↔️ Введите ширину фигуры в см:",
        ConversationState::FoilPrice { .. } | ConversationState::FigurePrice { .. } => {
            "💵 Введите стоимость гелия в баллоне 40л 5.25 м³:"
        }
    }
}

pub fn keyboard_for(state: &ConversationState, tables: &PricingTables) -> KeyboardHint {
    let choices: Vec<String> = match state {
        ConversationState::SelectType => {
            BalloonType::ALL.iter().map(|balloon| balloon.label().to_owned()).collect()
        }
        ConversationState::LatexSize => tables.latex_labels().map(str::to_owned).collect(),
        ConversationState::FoilForm => {
            FoilForm::ALL.iter().map(|form| form.label().to_owned()).collect()
        }
        ConversationState::FoilSize { .. } => {
            FoilSize::ALL.iter().map(|size| size.input_label().to_owned()).collect()
        }
        _ => return KeyboardHint::Remove,
    };
    KeyboardHint::Choices(choices)
}

/// Line acknowledging the input that led into `state`, if that state has one.
pub fn confirmation(state: &ConversationState) -> Option<String> {
    match state {
        ConversationState::LatexPrice { size } => Some(format!("✅ Размер {size} выбран.")),
        ConversationState::FoilPrice { size, .. } => Some(format!("✅ Размер {size} выбран.")),
        _ => None,
    }
}

pub fn warning(state: &ConversationState, problem: InputProblem) -> &'static str {
    match (state, problem) {
        (_, InputProblem::UnknownBalloonType) => "⚠️ Неверный выбор. Попробуйте снова.",
        (_, InputProblem::UnknownLatexSize) | (_, InputProblem::UnknownFoilSize) => {
            "⚠️ Неверный размер. Попробуйте снова."
        }
        (_, InputProblem::UnknownFoilForm) => "⚠️ Неверная форма. Попробуйте снова.",
        (ConversationState::FigureHeight, _) => "⚠️ Введите положительное число для высоты.",
        (ConversationState::FigureWidth { .. }, _) => {
            "⚠️ Введите положительное число для ширины."
        }
        (_, InputProblem::NotAPositiveNumber) | (_, InputProblem::NotANumber) => {
            "⚠️ Введите корректное число для стоимости."
        }
    }
}

pub fn rejection(channel: &str) -> String {
    format!(
        "🚫 Бот доступен только для подписчиков канала {channel}.\n\
         Пожалуйста, подпишитесь и снова нажмите /start."
    )
}

pub fn estimate_text(estimate: &Estimate) -> String {
    match estimate {
        Estimate::Latex(unit) | Estimate::Foil(unit) => unit_estimate_text(unit),
        Estimate::Figure(figure) => figure_estimate_text(figure),
    }
}

pub fn with_restart_hint(text: &str) -> String {
    format!("{text}\n\n{RESTART_HINT}")
}

fn unit_estimate_text(estimate: &UnitEstimate) -> String {
    with_restart_hint(&format!(
        "💰 Стоимость гелия на 1 шар: {:.2} руб.\n🎈 Можно надуть {} шаров.",
        estimate.cost_per_unit,
        estimate.display_unit_count()
    ))
}

fn figure_estimate_text(estimate: &FigureEstimate) -> String {
    with_restart_hint(&format!(
        "📦 Объём фигуры: {} литров ({} м³)\n🎈 Можно надуть {} фигур.\n\
         💰 Стоимость гелия на 1 фигуру: {:.2} руб.",
        estimate.reported_liters,
        estimate.reported_m3,
        estimate.figure_count,
        estimate.cost_per_unit
    ))
}

#[cfg(test)]
mod tests {
    use super::{estimate_text, keyboard_for, warning};
    use crate::flows::states::{ConversationState, InputProblem, KeyboardHint};
    use crate::pricing::figure::{figure_estimate, FigureDimensions};
    use crate::pricing::tables::PricingTables;
    use crate::pricing::{unit_estimate, Estimate};

    #[test]
    fn choice_states_offer_their_labels() {
        let tables = PricingTables::standard();
        assert_eq!(
            keyboard_for(&ConversationState::SelectType, &tables),
            KeyboardHint::Choices(vec![
                "Латексный".to_owned(),
                "Фольгированный".to_owned(),
                "Фигура".to_owned()
            ])
        );
        assert_eq!(keyboard_for(&ConversationState::FigureHeight, &tables), KeyboardHint::Remove);
    }

    #[test]
    fn numeric_warnings_name_the_missing_value() {
        assert!(warning(&ConversationState::FigureHeight, InputProblem::NotAPositiveNumber)
            .contains("высоты"));
        assert!(warning(
            &ConversationState::FigureWidth { height_cm: 40.0 },
            InputProblem::NotAPositiveNumber
        )
        .contains("ширины"));
        assert!(warning(
            &ConversationState::LatexPrice { size: "10".to_owned() },
            InputProblem::NotANumber
        )
        .contains("стоимости"));
    }

    #[test]
    fn unit_estimate_text_shows_rounded_cost_and_count() {
        let estimate = Estimate::Latex(unit_estimate(0.009, 500.0).expect("estimate"));
        let text = estimate_text(&estimate);
        assert!(text.contains("0.86 руб."));
        assert!(text.contains("Можно надуть 583 шаров"));
        assert!(text.ends_with("/start"));
    }

    #[test]
    fn figure_estimate_text_reports_rounded_volumes() {
        let dimensions = FigureDimensions::new(40.0, 30.0).expect("dimensions");
        let estimate = Estimate::Figure(figure_estimate(dimensions, 5000.0).expect("estimate"));
        let text = estimate_text(&estimate);
        assert!(text.contains("3.26 литров (0.00326 м³)"));
        assert!(text.contains("1608 фигур"));
        assert!(text.contains("3.10 руб."));
    }
}
