use serde::{Deserialize, Serialize};

use super::{round_to, PricingError, TANK_VOLUME_M3};

/// Assumed figure thickness as a share of its height.
pub const THICKNESS_RATIO: f64 = 0.10;
/// Share of the bounding box a flat figure balloon actually fills.
pub const SHAPE_FILL_COEFFICIENT: f64 = 0.68;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FigureDimensions {
    pub height_cm: f64,
    pub width_cm: f64,
}

impl FigureDimensions {
    pub fn new(height_cm: f64, width_cm: f64) -> Result<Self, PricingError> {
        check_dimension("height", height_cm)?;
        check_dimension("width", width_cm)?;
        Ok(Self { height_cm, width_cm })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FigureVolume {
    pub thickness_cm: f64,
    pub volume_cm3: f64,
    pub volume_liters: f64,
    pub volume_m3: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FigureEstimate {
    pub dimensions: FigureDimensions,
    pub volume: FigureVolume,
    /// Liters rounded to 2 decimals.
    pub reported_liters: f64,
    /// Cubic meters rounded to 5 decimals.
    pub reported_m3: f64,
    /// Whole figures one tank fills.
    pub figure_count: u64,
    pub cost_per_unit: f64,
}

pub fn figure_volume(dimensions: FigureDimensions) -> FigureVolume {
    let thickness_cm = dimensions.height_cm * THICKNESS_RATIO;
    let volume_cm3 =
        dimensions.height_cm * dimensions.width_cm * thickness_cm * SHAPE_FILL_COEFFICIENT;
    let volume_liters = volume_cm3 / 1000.0;
    let volume_m3 = volume_liters / 1000.0;
    FigureVolume { thickness_cm, volume_cm3, volume_liters, volume_m3 }
}

/// The count floors against the exact volume; the cost uses the rounded
/// cubic-meter figure shown to the user.
pub fn figure_estimate(
    dimensions: FigureDimensions,
    price: f64,
) -> Result<FigureEstimate, PricingError> {
    if !price.is_finite() {
        return Err(PricingError::InvalidPrice(price));
    }

    let volume = figure_volume(dimensions);
    let raw_count = (TANK_VOLUME_M3 / volume.volume_m3).floor();
    if !raw_count.is_finite() || raw_count > u64::MAX as f64 {
        return Err(PricingError::NonFiniteResult("figure count"));
    }

    let reported_liters = round_to(volume.volume_liters, 2);
    let reported_m3 = round_to(volume.volume_m3, 5);
    let cost_per_unit = price * (reported_m3 / TANK_VOLUME_M3);
    if !cost_per_unit.is_finite() {
        return Err(PricingError::NonFiniteResult("figure cost per unit"));
    }

    Ok(FigureEstimate {
        dimensions,
        volume,
        reported_liters,
        reported_m3,
        figure_count: raw_count as u64,
        cost_per_unit,
    })
}

fn check_dimension(name: &'static str, value: f64) -> Result<(), PricingError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PricingError::InvalidDimension { name, value })
    }
}
