use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::{Result, RoutingError};

/// Monetary cost model.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct CostConfig {
    /// Fee charged every time consecutive legs switch transport mode.
    pub transshipment_fee: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            transshipment_fee: 12.50,
        }
    }
}

/// Weather degradation rules applied to road edges.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct WeatherConfig {
    /// Weight multiplier for every road edge.
    pub light_factor: f64,
    /// Extra weight multiplier for road edges in a severe category.
    pub severe_factor: f64,
    /// Failure probability multiplier for severe edges.
    pub amplification: f64,
    /// Upper bound on an amplified failure probability.
    pub probability_cap: f64,
    pub severe_categories: Vec<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            light_factor: 1.10,
            severe_factor: 1.60,
            amplification: 2.5,
            probability_cap: 0.95,
            severe_categories: ["unpaved", "precarious", "escape-route", "critical"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl WeatherConfig {
    pub fn is_severe(&self, category: Option<&str>) -> bool {
        category.is_some_and(|c| self.severe_categories.iter().any(|s| s == c))
    }
}

/// Monte Carlo sampling and reporting parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct RiskConfig {
    /// Trials used when a query asks for risk without a count.
    pub default_iterations: usize,
    /// Hard bound on trials accepted from a query.
    pub max_iterations: usize,
    /// Percentile marking the start of the risk tail.
    pub tail_percentile: f64,
    pub histogram_bins: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            default_iterations: 500,
            max_iterations: 100_000,
            tail_percentile: 95.0,
            histogram_bins: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct PlannerConfig {
    pub cost: CostConfig,
    pub weather: WeatherConfig,
    pub risk: RiskConfig,
}

impl PlannerConfig {
    /// Reject values that would let derived views break edge invariants
    /// (negative weights, probabilities outside `[0, 1]`) or make risk
    /// reports meaningless.
    pub fn validate(&self) -> Result<()> {
        non_negative("transshipment_fee", self.cost.transshipment_fee)?;
        non_negative("light_factor", self.weather.light_factor)?;
        non_negative("severe_factor", self.weather.severe_factor)?;
        non_negative("amplification", self.weather.amplification)?;
        within("probability_cap", self.weather.probability_cap, 0.0, 1.0)?;
        within("tail_percentile", self.risk.tail_percentile, 0.0, 100.0)?;
        if self.risk.histogram_bins == 0 {
            return Err(invalid("histogram_bins must be positive".to_string()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> RoutingError {
    RoutingError::InvalidParameter(msg)
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite and non-negative, got {value}")))
    }
}

fn within(name: &str, value: f64, lo: f64, hi: f64) -> Result<()> {
    if (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be within [{lo}, {hi}], got {value}")))
    }
}
