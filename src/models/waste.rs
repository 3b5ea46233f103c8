//! Waste summary as served by the shop backend's waste summary endpoint.

use serde::Deserialize;

use super::numeric::{lenient_f64, lenient_i64};

/// Aggregate waste figures for the reporting period.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WasteSummary {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_waste_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub waste_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_waste_quantity: Option<f64>,
    /// Total waste value of the preceding period, when the backend reports it.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub previous_total_waste_value: Option<f64>,
}

impl WasteSummary {
    pub fn total_value(&self) -> f64 {
        self.total_waste_value.unwrap_or(0.0)
    }

    pub fn count(&self) -> u64 {
        self.waste_count
            .and_then(|count| u64::try_from(count).ok())
            .unwrap_or(0)
    }

    pub fn total_quantity(&self) -> f64 {
        self.total_waste_quantity.unwrap_or(0.0)
    }
}
