//! Monetary cost of a concrete path

use crate::config::CostConfig;
use crate::error::{Result, RoutingError};
use crate::network::{Edge, Network};
use crate::types::NodeId;

/// Sums edge weights along a path and charges a transshipment fee every
/// time consecutive legs change mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub transshipment_fee: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::from_config(&CostConfig::default())
    }
}

impl CostModel {
    pub fn from_config(cfg: &CostConfig) -> Self {
        Self {
            transshipment_fee: cfg.transshipment_fee,
        }
    }

    /// Cost of `path` on `view`.
    ///
    /// A single-node path costs 0. Fails with `InvalidPath` when the path is
    /// empty or a consecutive pair is not an edge of `view`.
    pub fn path_cost(&self, view: &Network, path: &[NodeId]) -> Result<f64> {
        let legs = legs(view, path)?;
        let weights: f64 = legs.iter().map(|e| e.weight).sum();
        Ok(weights + self.transshipment_fee * transitions(&legs) as f64)
    }
}

/// Edges traversed by `path`, in order.
pub fn legs<'a>(view: &'a Network, path: &[NodeId]) -> Result<Vec<&'a Edge>> {
    match path {
        [] => Err(RoutingError::InvalidPath("empty path".to_string())),
        [only] if !view.contains(*only) => Err(RoutingError::InvalidPath(
            "single-node path outside the network".to_string(),
        )),
        _ => path
            .windows(2)
            .map(|pair| {
                view.edge(pair[0], pair[1]).ok_or_else(|| {
                    RoutingError::InvalidPath(format!(
                        "no edge {} -> {}",
                        view.name(pair[0]).unwrap_or("?"),
                        view.name(pair[1]).unwrap_or("?")
                    ))
                })
            })
            .collect(),
    }
}

/// Number of adjacent leg pairs whose mode differs.
pub fn transitions(legs: &[&Edge]) -> usize {
    legs.windows(2)
        .filter(|pair| pair[0].modal != pair[1].modal)
        .count()
}
