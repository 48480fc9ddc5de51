use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use tsify_next::Tsify;

// ============================================================================
// IDs - Interned node names
// ============================================================================

new_key_type! {
    pub struct NodeId;
}

/// Ordered sequence of nodes. A single node is the trivial origin == destination path.
pub type Path = Vec<NodeId>;

/// Directed edge key `(from, to)`.
pub type EdgeKey = (NodeId, NodeId);

// ============================================================================
// Transport Mode
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
pub enum Modal {
    #[default]
    Road,
    Rail,
}

// ============================================================================
// Route Result
// ============================================================================

/// Outcome of a route search.
///
/// `cost` is `f64::INFINITY` and `path` is empty exactly when no requested
/// destination can be reached.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub cost: f64,
    pub path: Path,
}

impl RouteResult {
    pub fn unreachable() -> Self {
        Self {
            cost: f64::INFINITY,
            path: Vec::new(),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.cost.is_finite()
    }

    /// Second node of the path: the initial direction the truck takes.
    pub fn first_hop(&self) -> Option<NodeId> {
        self.path.get(1).copied()
    }

    pub fn destination(&self) -> Option<NodeId> {
        self.path.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_route_has_infinite_cost_and_no_path() {
        let r = RouteResult::unreachable();
        assert!(!r.is_reachable());
        assert!(r.cost.is_infinite());
        assert!(r.path.is_empty());
        assert_eq!(r.first_hop(), None);
        assert_eq!(r.destination(), None);
    }

    #[test]
    fn modal_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Modal::Rail).unwrap(), "\"rail\"");
        let m: Modal = serde_json::from_str("\"road\"").unwrap();
        assert_eq!(m, Modal::Road);
    }
}
