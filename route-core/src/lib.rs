use wasm_bindgen::prelude::*;

pub mod cascade;
pub mod conditions;
pub mod config;
pub mod cost;
pub mod error;
pub mod network;
pub mod query;
pub mod risk;
pub mod scenario;
pub mod search;
pub mod snapshot;
pub mod topology;
pub mod types;

#[cfg(feature = "instrument")]
pub use instrument;

pub use cascade::{Attempt, CascadeResult, Outcome, escalation, evaluate_cascade};
pub use conditions::{Conditions, apply_manual_blocks, apply_weather_mode};
pub use config::{CostConfig, PlannerConfig, RiskConfig, WeatherConfig};
pub use cost::CostModel;
pub use error::{Result, RoutingError};
pub use network::{Edge, Network, NetworkBuilder};
pub use query::{CostComparison, CostStatus, Planner, QueryReport, RiskReport, RouteQuery};
pub use risk::{HistogramBin, RiskSample, RiskStatistics, RiskSummary, run_simulation};
pub use search::{RouteSearch, for_each_simple_path, route_by_first_hop};
pub use snapshot::{CascadeSnapshot, RouteSnapshot, TopologySnapshot};
pub use topology::{EdgeRecord, TopologyInput};
pub use types::{EdgeKey, Modal, NodeId, Path, RouteResult};

// ============================================================================
// WASM API - Dashboard
// ============================================================================

/// Entry point for the browser dashboard.
///
/// Holds the base network and the topology document it came from (for node
/// positions). Block toggling and weather switches live in the UI and are
/// passed in with every query.
#[wasm_bindgen]
pub struct Dashboard {
    planner: Planner,
    topology: TopologyInput,
}

#[wasm_bindgen]
impl Dashboard {
    /// Build from a topology JSON document. Without a seed, Monte Carlo
    /// draws from a fresh random stream.
    #[wasm_bindgen(constructor)]
    pub fn new(topology_json: &str, seed: Option<u64>) -> std::result::Result<Dashboard, JsError> {
        console_error_panic_hook::set_once();
        let topology = TopologyInput::from_json(topology_json)?;
        Ok(Self::from_topology(topology, seed)?)
    }

    /// Dashboard over the built-in soy export corridor.
    #[wasm_bindgen]
    pub fn soy_corridor(seed: Option<u64>) -> std::result::Result<Dashboard, JsError> {
        console_error_panic_hook::set_once();
        Ok(Self::from_topology(scenario::soy_corridor_topology()?, seed)?)
    }

    /// Fails without changing anything when the config is out of range.
    #[wasm_bindgen]
    pub fn set_config(&mut self, config: PlannerConfig) -> std::result::Result<(), JsError> {
        Ok(self.planner.set_config(config)?)
    }

    /// Best route under the query's conditions, compared to the baseline.
    #[wasm_bindgen]
    pub fn evaluate(&mut self, query: RouteQuery) -> std::result::Result<QueryReport, JsError> {
        Ok(self.planner.evaluate(&query)?)
    }

    /// Like `evaluate`, always running Monte Carlo.
    #[wasm_bindgen]
    pub fn analyze_risk(&mut self, query: RouteQuery) -> std::result::Result<QueryReport, JsError> {
        Ok(self.planner.evaluate_with_risk(&query)?)
    }

    /// Every route on the base network as `RouteSnapshot[]`, cheapest first.
    #[wasm_bindgen]
    pub fn all_routes(&self, origin: &str, destinations: JsValue) -> std::result::Result<JsValue, JsError> {
        let destinations: Vec<String> = serde_wasm_bindgen::from_value(destinations)?;
        let routes = self.planner.all_routes(origin, &destinations)?;
        let snapshots: Vec<RouteSnapshot> = routes
            .iter()
            .map(|r| RouteSnapshot::new(self.planner.base(), r))
            .collect();
        Ok(serde_wasm_bindgen::to_value(&snapshots)?)
    }

    /// Cascade over `string[][]` attempts; all but the last failed.
    #[wasm_bindgen]
    pub fn cascade(&self, attempts: JsValue, weather: bool) -> std::result::Result<CascadeSnapshot, JsError> {
        let attempts: Vec<Vec<String>> = serde_wasm_bindgen::from_value(attempts)?;
        let result = self.planner.cascade(&attempts, weather)?;
        Ok(CascadeSnapshot::new(self.planner.base(), &result))
    }

    /// Contingency ladder as `CascadeSnapshot[]`.
    #[wasm_bindgen]
    pub fn escalation(&self, strategies: JsValue, weather: bool) -> std::result::Result<JsValue, JsError> {
        let strategies: Vec<Vec<String>> = serde_wasm_bindgen::from_value(strategies)?;
        let ladder = self.planner.escalation(&strategies, weather)?;
        let snapshots: Vec<CascadeSnapshot> = ladder
            .iter()
            .map(|c| CascadeSnapshot::new(self.planner.base(), c))
            .collect();
        Ok(serde_wasm_bindgen::to_value(&snapshots)?)
    }

    /// Map data for the network seen under `weather`.
    #[wasm_bindgen]
    pub fn topology(&self, weather: bool) -> TopologySnapshot {
        let view = self.planner.view(&Conditions::clear().with_weather(weather));
        TopologySnapshot::new(&self.topology, &view)
    }
}

impl Dashboard {
    pub fn from_topology(topology: TopologyInput, seed: Option<u64>) -> Result<Dashboard> {
        let base = topology.to_network()?;
        let seed = seed.unwrap_or_else(entropy_seed);
        Ok(Dashboard {
            planner: Planner::new(base, PlannerConfig::default(), seed),
            topology,
        })
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }
}

#[cfg(target_arch = "wasm32")]
fn entropy_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn entropy_seed() -> u64 {
    rand::random()
}

// ============================================================================
// Tests
// ============================================================================
