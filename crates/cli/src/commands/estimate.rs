use balloonbot_core::flows::prompts::estimate_text;
use balloonbot_core::pricing::figure::FigureDimensions;
use balloonbot_core::pricing::tables::{FoilForm, FoilSize};
use balloonbot_core::pricing::{
    Estimate, EstimateRequest, HeliumCalculator, PricingError, StandardCalculator,
};
use serde::Serialize;

use super::{CommandResult, EXIT_CONFIG_FAILURE, EXIT_NO_PRICING_DATA};

const COMMAND: &str = "estimate";

#[derive(Debug, Serialize)]
struct EstimateOutput<'a> {
    command: &'static str,
    status: &'static str,
    request: &'a EstimateRequest,
    estimate: &'a Estimate,
    text: String,
}

pub fn latex(size: &str, price: f64, json_output: bool) -> CommandResult {
    let request = EstimateRequest::Latex { size: size.trim().to_string(), price };
    run(&request, json_output)
}

pub fn foil(form: &str, size: &str, price: f64, json_output: bool) -> CommandResult {
    let Some(form) = FoilForm::from_label(form) else {
        let known: Vec<&str> = FoilForm::ALL.iter().map(|form| form.name()).collect();
        return CommandResult::failure(
            COMMAND,
            "invalid_input",
            format!(
                "unknown foil form `{}` (expected one of {})",
                form.trim(),
                known.join(", ")
            ),
            EXIT_CONFIG_FAILURE,
        );
    };
    let Some(size) = FoilSize::from_input(size) else {
        return CommandResult::failure(
            COMMAND,
            "no_pricing_data",
            format!("no coefficient for foil {} of size `{}`", form.name(), size.trim()),
            EXIT_NO_PRICING_DATA,
        );
    };

    run(&EstimateRequest::Foil { form, size, price }, json_output)
}

pub fn figure(height_cm: f64, width_cm: f64, price: f64, json_output: bool) -> CommandResult {
    match FigureDimensions::new(height_cm, width_cm) {
        Ok(dimensions) => run(&EstimateRequest::Figure { dimensions, price }, json_output),
        Err(error) => failure(&error),
    }
}

fn run(request: &EstimateRequest, json_output: bool) -> CommandResult {
    let calculator = StandardCalculator::default();
    let estimate = match calculator.estimate(request) {
        Ok(estimate) => estimate,
        Err(error) => return failure(&error),
    };

    if !json_output {
        return CommandResult::output(estimate_text(&estimate));
    }

    let payload = EstimateOutput {
        command: COMMAND,
        status: "ok",
        request,
        estimate: &estimate,
        text: estimate_text(&estimate),
    };
    match serde_json::to_string_pretty(&payload) {
        Ok(output) => CommandResult::output(output),
        Err(error) => CommandResult::failure(
            COMMAND,
            "serialization",
            error.to_string(),
            EXIT_CONFIG_FAILURE,
        ),
    }
}

fn failure(error: &PricingError) -> CommandResult {
    match error {
        PricingError::MissingFoilData { .. } | PricingError::UnknownLatexSize(_) => {
            CommandResult::failure(
                COMMAND,
                "no_pricing_data",
                error.to_string(),
                EXIT_NO_PRICING_DATA,
            )
        }
        PricingError::InvalidDimension { .. }
        | PricingError::InvalidPrice(_)
        | PricingError::NonFiniteResult(_) => {
            CommandResult::failure(COMMAND, "invalid_input", error.to_string(), EXIT_CONFIG_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use balloonbot_core::pricing::PricingError;

    use super::failure;
    use crate::commands::{EXIT_CONFIG_FAILURE, EXIT_NO_PRICING_DATA};

    #[test]
    fn missing_table_entries_map_to_the_no_data_exit_code() {
        let result = failure(&PricingError::UnknownLatexSize("7".to_string()));
        assert_eq!(result.exit_code, EXIT_NO_PRICING_DATA);
        assert!(result.output.contains("no_pricing_data"));
    }

    #[test]
    fn bad_numbers_map_to_the_validation_exit_code() {
        let result = failure(&PricingError::InvalidDimension { name: "height", value: -1.0 });
        assert_eq!(result.exit_code, EXIT_CONFIG_FAILURE);
        assert!(result.output.contains("invalid_input"));
    }
}
