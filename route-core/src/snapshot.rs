// ============================================================================
// Serializable Snapshots for rendering and reporting (node names, no ids)
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::cascade::{CascadeResult, Outcome};
use crate::network::Network;
use crate::topology::TopologyInput;
use crate::types::{Modal, RouteResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RouteSnapshot {
    /// `None` when no destination is reachable.
    pub cost: Option<f64>,
    pub path: Vec<String>,
}

impl RouteSnapshot {
    pub fn new(net: &Network, route: &RouteResult) -> Self {
        Self {
            cost: route.is_reachable().then_some(route.cost),
            path: net.path_names(&route.path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct AttemptSnapshot {
    pub path: Vec<String>,
    pub outcome: Outcome,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct CascadeSnapshot {
    pub total_cost: f64,
    pub failures: usize,
    pub attempts: Vec<AttemptSnapshot>,
}

impl CascadeSnapshot {
    pub fn new(net: &Network, cascade: &CascadeResult) -> Self {
        Self {
            total_cost: cascade.total_cost,
            failures: cascade.failures(),
            attempts: cascade
                .attempts
                .iter()
                .map(|a| AttemptSnapshot {
                    path: net.path_names(&a.path),
                    outcome: a.outcome,
                    cost: a.cost,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct EdgeSnapshot {
    pub u: String,
    pub v: String,
    pub weight: f64,
    pub distance: f64,
    pub modal: Modal,
    pub failure_probability: f64,
    pub category: Option<String>,
    pub label: String,
    pub info: String,
}

/// Current view of the network plus input positions, for map rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct TopologySnapshot {
    pub nodes: BTreeMap<String, (f64, f64)>,
    pub edges: Vec<EdgeSnapshot>,
}

impl TopologySnapshot {
    pub fn new(input: &TopologyInput, view: &Network) -> Self {
        let name = |id| view.name(id).unwrap_or_default().to_string();
        Self {
            nodes: input.nodes.clone(),
            edges: view
                .edges()
                .map(|((from, to), e)| EdgeSnapshot {
                    u: name(from),
                    v: name(to),
                    weight: e.weight,
                    distance: e.distance,
                    modal: e.modal,
                    failure_probability: e.failure_probability,
                    category: e.category.clone(),
                    label: e.label.clone(),
                    info: e.info.clone(),
                })
                .collect(),
        }
    }
}
