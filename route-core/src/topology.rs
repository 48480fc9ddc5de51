//! Topology input records handed over by the loading collaborator

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::Result;
use crate::network::{Network, NetworkBuilder};
use crate::types::Modal;

/// One directed edge as it appears in a topology document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct EdgeRecord {
    pub u: String,
    pub v: String,
    pub weight: f64,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub info: String,
    #[serde(rename = "type", default)]
    pub modal: Modal,
    #[serde(default, alias = "failure_prob")]
    pub failure_probability: f64,
    /// Weather classification. Falls back to a normalized `info` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl EdgeRecord {
    pub fn new(u: impl Into<String>, v: impl Into<String>, weight: f64, modal: Modal) -> Self {
        Self {
            u: u.into(),
            v: v.into(),
            weight,
            distance: 0.0,
            label: String::new(),
            info: String::new(),
            modal,
            failure_probability: 0.0,
            category: None,
        }
    }

    pub fn road(u: impl Into<String>, v: impl Into<String>, weight: f64) -> Self {
        Self::new(u, v, weight, Modal::Road)
    }

    pub fn rail(u: impl Into<String>, v: impl Into<String>, weight: f64) -> Self {
        Self::new(u, v, weight, Modal::Rail)
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_failure_probability(mut self, p: f64) -> Self {
        self.failure_probability = p;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    /// Category used by weather rules: explicit tag first, then `info`.
    pub fn resolved_category(&self) -> Option<String> {
        self.category
            .as_deref()
            .or(Some(self.info.as_str()))
            .map(normalize_category)
            .filter(|c| !c.is_empty())
    }
}

/// Lowercase kebab-case: "Escape Route" and "escape_route" both become "escape-route".
pub fn normalize_category(raw: &str) -> String {
    raw.trim()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// A full topology document: node positions (rendering only) and edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TopologyInput {
    #[serde(default)]
    pub nodes: BTreeMap<String, (f64, f64)>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl TopologyInput {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_network(&self) -> Result<Network> {
        let mut builder = NetworkBuilder::new();
        for name in self.nodes.keys() {
            builder = builder.node(name.as_str());
        }
        for record in &self.edges {
            builder = builder.edge(record.clone());
        }
        builder.build()
    }
}

impl Network {
    pub fn from_topology(input: &TopologyInput) -> Result<Network> {
        input.to_network()
    }

    pub fn from_json(json: &str) -> Result<Network> {
        TopologyInput::from_json(json)?.to_network()
    }
}
