pub mod figure;
pub mod tables;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::figure::{figure_estimate, FigureDimensions, FigureEstimate};
use self::tables::{FoilForm, FoilSize, PricingTables};

/// Volume of the helium cylinder every yield is computed against.
pub const TANK_VOLUME_M3: f64 = 5.25;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("no coefficient for foil balloon {form} {size}")]
    MissingFoilData { form: FoilForm, size: FoilSize },
    #[error("unknown latex balloon size `{0}`")]
    UnknownLatexSize(String),
    #[error("{name} must be a positive number, got {value}")]
    InvalidDimension { name: &'static str, value: f64 },
    #[error("price must be a finite number, got {0}")]
    InvalidPrice(f64),
    #[error("{0} is not a finite number")]
    NonFiniteResult(&'static str),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum EstimateRequest {
    Latex { size: String, price: f64 },
    Foil { form: FoilForm, size: FoilSize, price: f64 },
    Figure { dimensions: FigureDimensions, price: f64 },
}

/// Yield of one tank for a table-priced balloon.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitEstimate {
    pub coefficient: f64,
    pub unit_count: f64,
    pub cost_per_unit: f64,
}

impl UnitEstimate {
    /// Balloon count as shown to the user: nearest integer, ties to even.
    pub fn display_unit_count(&self) -> String {
        format!("{:.0}", self.unit_count)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Estimate {
    Latex(UnitEstimate),
    Foil(UnitEstimate),
    Figure(FigureEstimate),
}

pub trait HeliumCalculator: Send + Sync {
    fn tables(&self) -> &PricingTables;
    fn estimate(&self, request: &EstimateRequest) -> Result<Estimate, PricingError>;
}

#[derive(Clone, Debug, Default)]
pub struct StandardCalculator {
    tables: PricingTables,
}

impl StandardCalculator {
    pub fn new(tables: PricingTables) -> Self {
        Self { tables }
    }
}

impl HeliumCalculator for StandardCalculator {
    fn tables(&self) -> &PricingTables {
        &self.tables
    }

    fn estimate(&self, request: &EstimateRequest) -> Result<Estimate, PricingError> {
        match request {
            EstimateRequest::Latex { size, price } => {
                let coefficient = self
                    .tables
                    .latex_coefficient(size)
                    .ok_or_else(|| PricingError::UnknownLatexSize(size.clone()))?;
                unit_estimate(coefficient, *price).map(Estimate::Latex)
            }
            EstimateRequest::Foil { form, size, price } => {
                let coefficient = self
                    .tables
                    .foil_coefficient(*form, *size)
                    .ok_or(PricingError::MissingFoilData { form: *form, size: *size })?;
                unit_estimate(coefficient, *price).map(Estimate::Foil)
            }
            EstimateRequest::Figure { dimensions, price } => {
                figure_estimate(*dimensions, *price).map(Estimate::Figure)
            }
        }
    }
}

/// Shared latex/foil model: how many balloons one tank fills and what each costs.
pub fn unit_estimate(coefficient: f64, price: f64) -> Result<UnitEstimate, PricingError> {
    if !price.is_finite() {
        return Err(PricingError::InvalidPrice(price));
    }
    if !(coefficient.is_finite() && coefficient > 0.0) {
        return Err(PricingError::NonFiniteResult("helium coefficient"));
    }

    let unit_count = TANK_VOLUME_M3 / coefficient;
    let cost_per_unit = price / unit_count;
    if !cost_per_unit.is_finite() {
        return Err(PricingError::NonFiniteResult("cost per unit"));
    }

    Ok(UnitEstimate { coefficient, unit_count, cost_per_unit })
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}
