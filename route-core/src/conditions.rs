//! Working views reflecting manual blocks and weather

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::config::WeatherConfig;
use crate::network::Network;
use crate::types::{EdgeKey, Modal};

/// Copy of `base` without the edges in `blocked`. Absent edges are ignored.
pub fn apply_manual_blocks<'a, I>(base: &Network, blocked: I) -> Network
where
    I: IntoIterator<Item = &'a EdgeKey>,
{
    let mut view = base.clone_working_view();
    for &(from, to) in blocked {
        view.remove_edge(from, to);
    }
    view
}

/// Copy of `base` with weather penalties applied when `enabled`.
///
/// Road edges are reweighted by the light factor; road edges in a severe
/// category are further reweighted by the severe factor and get an
/// amplified, capped failure probability. Rail is untouched.
pub fn apply_weather_mode(base: &Network, enabled: bool, cfg: &WeatherConfig) -> Network {
    let mut view = base.clone_working_view();
    if !enabled {
        return view;
    }

    let keys: Vec<EdgeKey> = view.edges().map(|(key, _)| key).collect();
    let mut severe = 0u64;
    for (from, to) in keys {
        let Some(edge) = view.edge_mut(from, to) else {
            continue;
        };
        if edge.modal != Modal::Road {
            continue;
        }
        edge.weight *= cfg.light_factor;
        if cfg.is_severe(edge.category.as_deref()) {
            edge.weight *= cfg.severe_factor;
            edge.failure_probability =
                (edge.failure_probability * cfg.amplification).min(cfg.probability_cap);
            severe += 1;
        }
    }

    #[cfg(feature = "instrument")]
    tracing::debug!(target: "conditions", severe_edges = severe, "weather applied");
    let _ = severe;

    view
}

/// Conditions for one evaluation, given by node names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct Conditions {
    /// Blocked `(from, to)` edges.
    pub blocked: BTreeSet<(String, String)>,
    pub weather: bool,
}

impl Conditions {
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn with_weather(mut self, weather: bool) -> Self {
        self.weather = weather;
        self
    }

    pub fn block(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.blocked.insert((from.into(), to.into()));
        self
    }

    /// Flip a block on or off; returns whether the edge is now blocked.
    pub fn toggle(&mut self, from: &str, to: &str) -> bool {
        let key = (from.to_string(), to.to_string());
        if self.blocked.remove(&key) {
            false
        } else {
            self.blocked.insert(key);
            true
        }
    }

    /// Fresh working view: weather from the base first, then blocks.
    ///
    /// Always derived from `base`, so repeated derivation never compounds
    /// penalties. Block names not in the network are ignored.
    pub fn derive_view(&self, base: &Network, cfg: &WeatherConfig) -> Network {
        let weathered = apply_weather_mode(base, self.weather, cfg);
        let keys: Vec<EdgeKey> = self
            .blocked
            .iter()
            .filter_map(|(from, to)| Some((base.id(from)?, base.id(to)?)))
            .collect();
        apply_manual_blocks(&weathered, &keys)
    }
}
