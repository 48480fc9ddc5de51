//! Directed multimodal network: the immutable base topology and the
//! working views derived from it.
//!
//! A `Network` built through [`NetworkBuilder`] is the base. Every
//! experiment (blocking edges, weather, random outages) runs on a
//! [`Network::clone_working_view`] copy, so the base is never observed
//! changing.

use std::collections::{BTreeMap, HashMap};

use slotmap::{SecondaryMap, SlotMap};

use crate::error::{Result, RoutingError};
use crate::topology::EdgeRecord;
use crate::types::{EdgeKey, Modal, NodeId, Path};

/// Attributes of one directed edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Monetary cost per unit of cargo.
    pub weight: f64,
    /// Informational only.
    pub distance: f64,
    pub modal: Modal,
    pub failure_probability: f64,
    pub category: Option<String>,
    pub label: String,
    pub info: String,
}

/// Directed graph with at most one edge per ordered node pair.
///
/// Iteration order is deterministic: nodes in declaration order, edges by
/// `(from, to)` in node declaration order, and each node's outgoing
/// neighbours in edge declaration order.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: SlotMap<NodeId, String>,
    index: HashMap<String, NodeId>,
    edges: BTreeMap<EdgeKey, Edge>,
    adjacency: SecondaryMap<NodeId, Vec<NodeId>>,
}

impl Network {
    // === Node queries ===

    pub fn id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Like [`Network::id`], failing with `UnknownNode`.
    pub fn require(&self, name: &str) -> Result<NodeId> {
        self.id(name)
            .ok_or_else(|| RoutingError::UnknownNode(name.to_string()))
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.nodes.iter().map(|(id, name)| (id, name.as_str()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // === Edge queries ===

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.edges.contains_key(&(from, to))
    }

    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.edges.get(&(from, to))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge)> {
        self.edges.iter().map(|(key, edge)| (*key, edge))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing neighbours of `id`, in edge declaration order.
    pub fn neighbours(&self, id: NodeId) -> &[NodeId] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    // === Working views ===

    /// Independent deep copy for destructive experiments.
    pub fn clone_working_view(&self) -> Network {
        self.clone()
    }

    pub fn edge_mut(&mut self, from: NodeId, to: NodeId) -> Option<&mut Edge> {
        self.edges.get_mut(&(from, to))
    }

    /// Remove `(from, to)`. Returns the removed edge, `None` if it was absent.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> Option<Edge> {
        let edge = self.edges.remove(&(from, to))?;
        if let Some(out) = self.adjacency.get_mut(from) {
            out.retain(|n| *n != to);
        }
        Some(edge)
    }

    /// Drop every outgoing edge of `id`.
    pub fn isolate_outgoing(&mut self, id: NodeId) -> usize {
        let targets = self.neighbours(id).to_vec();
        targets
            .into_iter()
            .filter(|to| self.remove_edge(id, *to).is_some())
            .count()
    }

    // === Paths ===

    /// Resolve node names into a path.
    pub fn path<S: AsRef<str>>(&self, names: &[S]) -> Result<Path> {
        names.iter().map(|n| self.require(n.as_ref())).collect()
    }

    pub fn path_names(&self, path: &[NodeId]) -> Vec<String> {
        path.iter()
            .map(|id| self.name(*id).unwrap_or_default().to_string())
            .collect()
    }
}

/// Validating constructor for a base network.
///
/// Nodes must be declared before `build`; edges referencing undeclared
/// nodes, negative or non-finite numbers, probabilities outside `[0, 1]`
/// and duplicate `(u, v)` pairs are rejected as a whole.
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    nodes: Vec<String>,
    edges: Vec<EdgeRecord>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, name: impl Into<String>) -> Self {
        self.nodes.push(name.into());
        self
    }

    pub fn nodes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn edge(mut self, record: EdgeRecord) -> Self {
        self.edges.push(record);
        self
    }

    pub fn build(self) -> Result<Network> {
        let mut net = Network::default();

        for name in self.nodes {
            if net.index.contains_key(&name) {
                continue;
            }
            let id = net.nodes.insert(name.clone());
            net.index.insert(name, id);
            net.adjacency.insert(id, Vec::new());
        }

        for record in self.edges {
            validate_record(&record)?;
            let from = net.id(&record.u).ok_or_else(|| undeclared(&record, &record.u))?;
            let to = net.id(&record.v).ok_or_else(|| undeclared(&record, &record.v))?;
            if net.edges.contains_key(&(from, to)) {
                return Err(RoutingError::InvalidTopology(format!(
                    "duplicate edge {} -> {}",
                    record.u, record.v
                )));
            }

            let category = record.resolved_category();
            net.edges.insert(
                (from, to),
                Edge {
                    weight: record.weight,
                    distance: record.distance,
                    modal: record.modal,
                    failure_probability: record.failure_probability,
                    category,
                    label: record.label,
                    info: record.info,
                },
            );
            if let Some(out) = net.adjacency.get_mut(from) {
                out.push(to);
            }
        }

        Ok(net)
    }
}

fn undeclared(record: &EdgeRecord, node: &str) -> RoutingError {
    RoutingError::InvalidTopology(format!(
        "edge {} -> {} references undeclared node {}",
        record.u, record.v, node
    ))
}

fn validate_record(record: &EdgeRecord) -> Result<()> {
    let edge = format!("{} -> {}", record.u, record.v);
    if !(record.weight.is_finite() && record.weight >= 0.0) {
        return Err(RoutingError::InvalidTopology(format!(
            "edge {edge} has invalid weight {}",
            record.weight
        )));
    }
    if !(record.distance.is_finite() && record.distance >= 0.0) {
        return Err(RoutingError::InvalidTopology(format!(
            "edge {edge} has invalid distance {}",
            record.distance
        )));
    }
    if !(0.0..=1.0).contains(&record.failure_probability) {
        return Err(RoutingError::InvalidTopology(format!(
            "edge {edge} has failure probability {} outside [0, 1]",
            record.failure_probability
        )));
    }
    Ok(())
}
