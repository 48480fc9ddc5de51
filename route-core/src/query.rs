//! Route queries from the dashboard.
//!
//! A [`Planner`] owns the immutable base network. Every query carries its
//! full condition set (blocks, weather, optional Monte Carlo), a fresh
//! working view is derived for it, and nothing persists between calls
//! except the planner's RNG stream.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::cascade::{self, CascadeResult};
use crate::conditions::{Conditions, apply_weather_mode};
use crate::config::PlannerConfig;
use crate::cost::CostModel;
use crate::error::{Result, RoutingError};
use crate::network::Network;
use crate::risk::{self, HistogramBin, RiskSample, RiskSummary};
use crate::search::{RouteSearch, route_by_first_hop};
use crate::snapshot::RouteSnapshot;
use crate::types::{Path, RouteResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct RouteQuery {
    pub origin: String,
    pub destinations: Vec<String>,
    /// Blocked `(from, to)` edges by node name.
    pub blocked: Vec<(String, String)>,
    pub weather: bool,
    /// Monte Carlo trials; no risk analysis when unset.
    pub iterations: Option<usize>,
}

impl RouteQuery {
    pub fn new<S: Into<String>>(origin: impl Into<String>, destinations: impl IntoIterator<Item = S>) -> Self {
        Self {
            origin: origin.into(),
            destinations: destinations.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn block(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.blocked.push((from.into(), to.into()));
        self
    }

    pub fn with_weather(mut self, weather: bool) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn conditions(&self) -> Conditions {
        Conditions {
            blocked: self.blocked.iter().cloned().collect(),
            weather: self.weather,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum CostStatus {
    /// Current conditions cost the same as the ideal.
    Normal,
    Overpriced,
    Unreachable,
}

/// Current route cost against the unconstrained baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct CostComparison {
    pub baseline: Option<f64>,
    pub current: Option<f64>,
    /// Percentage above baseline; 0 for a zero-cost baseline.
    pub overprice_pct: Option<f64>,
    pub status: CostStatus,
}

impl CostComparison {
    pub fn new(baseline: &RouteResult, current: &RouteResult) -> Self {
        let base = baseline.is_reachable().then_some(baseline.cost);
        let cur = current.is_reachable().then_some(current.cost);
        let overprice_pct = match (base, cur) {
            (Some(b), Some(c)) if b > 0.0 => Some((c - b) / b * 100.0),
            (Some(_), Some(_)) => Some(0.0),
            _ => None,
        };
        let status = match overprice_pct {
            None if cur.is_none() => CostStatus::Unreachable,
            Some(pct) if pct > 1e-9 => CostStatus::Overpriced,
            _ => CostStatus::Normal,
        };
        Self {
            baseline: base,
            current: cur,
            overprice_pct,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RiskReport {
    pub iterations: usize,
    pub summary: RiskSummary,
    pub histogram: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct QueryReport {
    pub route: RouteSnapshot,
    pub baseline: RouteSnapshot,
    pub comparison: CostComparison,
    pub risk: Option<RiskReport>,
}

/// Evaluates queries against one immutable base network.
#[derive(Debug, Clone)]
pub struct Planner {
    base: Network,
    config: PlannerConfig,
    rng: StdRng,
}

impl Planner {
    pub fn new(base: Network, config: PlannerConfig, seed: u64) -> Self {
        Self {
            base,
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn base(&self) -> &Network {
        &self.base
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Replace the configuration. An invalid config is rejected and the
    /// current one kept.
    pub fn set_config(&mut self, config: PlannerConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn search(&self) -> RouteSearch {
        RouteSearch::new(self.cost_model())
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::from_config(&self.config.cost)
    }

    /// Fresh working view for `conditions`.
    pub fn view(&self, conditions: &Conditions) -> Network {
        conditions.derive_view(&self.base, &self.config.weather)
    }

    /// Best route on the untouched base network.
    pub fn baseline<S: AsRef<str>>(&self, origin: &str, destinations: &[S]) -> Result<RouteResult> {
        self.search().find_best_route(&self.base, origin, destinations)
    }

    pub fn best_route<S: AsRef<str>>(
        &self,
        origin: &str,
        destinations: &[S],
        conditions: &Conditions,
    ) -> Result<RouteResult> {
        self.search()
            .find_best_route(&self.view(conditions), origin, destinations)
    }

    /// Route, baseline comparison and, when the query asks for it, Monte
    /// Carlo risk on the query's working view.
    pub fn evaluate(&mut self, query: &RouteQuery) -> Result<QueryReport> {
        let view = self.view(&query.conditions());
        let search = self.search();

        let baseline = self.baseline(&query.origin, &query.destinations)?;
        let route = search.find_best_route(&view, &query.origin, &query.destinations)?;
        let risk = match query.iterations {
            Some(iterations) => Some(self.risk_report(&view, query, iterations)?),
            None => None,
        };

        Ok(QueryReport {
            comparison: CostComparison::new(&baseline, &route),
            route: RouteSnapshot::new(&view, &route),
            baseline: RouteSnapshot::new(&self.base, &baseline),
            risk,
        })
    }

    /// [`Planner::evaluate`] with risk analysis forced on, using the
    /// configured default trial count when the query has none.
    pub fn evaluate_with_risk(&mut self, query: &RouteQuery) -> Result<QueryReport> {
        let mut query = query.clone();
        query
            .iterations
            .get_or_insert(self.config.risk.default_iterations);
        self.evaluate(&query)
    }

    /// Raw Monte Carlo sample on `view`, bounded by the configured maximum.
    pub fn simulate<S: AsRef<str>>(
        &mut self,
        view: &Network,
        origin: &str,
        destinations: &[S],
        iterations: usize,
    ) -> Result<RiskSample> {
        let max = self.config.risk.max_iterations;
        if iterations > max {
            return Err(RoutingError::InvalidParameter(format!(
                "iterations {iterations} exceeds the maximum of {max}"
            )));
        }
        let search = self.search();
        risk::run_simulation(view, &search, origin, destinations, iterations, &mut self.rng)
    }

    fn risk_report(&mut self, view: &Network, query: &RouteQuery, iterations: usize) -> Result<RiskReport> {
        let sample = self.simulate(view, &query.origin, &query.destinations, iterations)?;
        let summary = sample.summary(self.config.risk.tail_percentile);
        let histogram = match summary.statistics() {
            Some(stats) => sample.histogram(self.config.risk.histogram_bins, stats.tail_threshold),
            None => Vec::new(),
        };
        Ok(RiskReport {
            iterations,
            summary,
            histogram,
        })
    }

    /// Every route to every destination on the base, cheapest first.
    pub fn all_routes<S: AsRef<str>>(&self, origin: &str, destinations: &[S]) -> Result<Vec<RouteResult>> {
        self.search().find_all_routes(&self.base, origin, destinations)
    }

    /// Cheapest base route for each initial direction in `hops`, in order.
    ///
    /// Fails with `UnknownNode` for an unknown hop and `InvalidParameter`
    /// when no route leaves through a hop.
    pub fn strategies<S: AsRef<str>>(
        &self,
        origin: &str,
        destinations: &[S],
        hops: &[S],
    ) -> Result<Vec<Path>> {
        let routes = self.all_routes(origin, destinations)?;
        hops.iter()
            .map(|hop| {
                let hop = hop.as_ref();
                let id = self.base.require(hop)?;
                route_by_first_hop(&routes, id)
                    .map(|r| r.path.clone())
                    .ok_or_else(|| {
                        RoutingError::InvalidParameter(format!("no route from {origin} via {hop}"))
                    })
            })
            .collect()
    }

    /// Cascade over named attempts.
    ///
    /// Blocks are not applied: a failed attempt still drives its first leg
    /// before turning back. Weather reprices every leg when enabled.
    pub fn cascade<S: AsRef<str>>(&self, attempts: &[Vec<S>], weather: bool) -> Result<CascadeResult> {
        let view = apply_weather_mode(&self.base, weather, &self.config.weather);
        let paths = resolve_paths(&view, attempts)?;
        cascade::evaluate_cascade(&view, &self.cost_model(), &paths)
    }

    pub fn escalation<S: AsRef<str>>(&self, strategies: &[Vec<S>], weather: bool) -> Result<Vec<CascadeResult>> {
        let view = apply_weather_mode(&self.base, weather, &self.config.weather);
        let paths = resolve_paths(&view, strategies)?;
        cascade::escalation(&view, &self.cost_model(), &paths)
    }
}

fn resolve_paths<S: AsRef<str>>(view: &Network, named: &[Vec<S>]) -> Result<Vec<Path>> {
    named.iter().map(|names| view.path(names)).collect()
}
