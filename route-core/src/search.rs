//! Exhaustive route search.
//!
//! Every simple path from the origin to each requested destination is
//! enumerated depth-first and priced with the [`CostModel`]. A shortest-path
//! algorithm would be wrong here: the transshipment fee makes cost
//! non-monotonic in the number of legs, so a longer single-mode path can
//! beat a shorter one that switches mode.
//!
//! Enumeration order is deterministic: destinations in the order given,
//! then outgoing neighbours in edge declaration order. On equal cost the
//! first path found wins.

use slotmap::SecondaryMap;

use crate::cost::CostModel;
use crate::error::Result;
use crate::network::Network;
use crate::types::{NodeId, RouteResult};

/// Visit every simple path from `origin` to `target` on `view`.
///
/// `origin == target` yields the single-node path once. The visitor may
/// abort the walk by returning an error.
pub fn for_each_simple_path<F>(
    view: &Network,
    origin: NodeId,
    target: NodeId,
    mut visit: F,
) -> Result<()>
where
    F: FnMut(&[NodeId]) -> Result<()>,
{
    if !view.contains(origin) || !view.contains(target) {
        return Ok(());
    }
    let mut walker = Walker {
        view,
        target,
        visited: SecondaryMap::new(),
        stack: Vec::new(),
        visit: &mut visit,
    };
    walker.descend(origin)
}

struct Walker<'a, F> {
    view: &'a Network,
    target: NodeId,
    /// Nodes on the current path.
    visited: SecondaryMap<NodeId, ()>,
    stack: Vec<NodeId>,
    visit: &'a mut F,
}

impl<F> Walker<'_, F>
where
    F: FnMut(&[NodeId]) -> Result<()>,
{
    fn descend(&mut self, node: NodeId) -> Result<()> {
        self.stack.push(node);
        self.visited.insert(node, ());

        if node == self.target {
            (self.visit)(&self.stack)?;
        } else {
            let view = self.view;
            for &next in view.neighbours(node) {
                if !self.visited.contains_key(next) {
                    self.descend(next)?;
                }
            }
        }

        self.stack.pop();
        self.visited.remove(node);
        Ok(())
    }
}

/// Collect every simple path from `origin` to `target`.
pub fn simple_paths(view: &Network, origin: NodeId, target: NodeId) -> Result<Vec<Vec<NodeId>>> {
    let mut paths = Vec::new();
    for_each_simple_path(view, origin, target, |path| {
        paths.push(path.to_vec());
        Ok(())
    })?;
    Ok(paths)
}

/// Route search over a network view.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteSearch {
    pub cost: CostModel,
}

impl RouteSearch {
    pub fn new(cost: CostModel) -> Self {
        Self { cost }
    }

    /// Cheapest simple path from `origin` to any of `destinations`.
    ///
    /// Fails with `UnknownNode` when the origin is not in `view`. Unknown
    /// destinations are skipped; if nothing is reachable the result has an
    /// infinite cost and an empty path.
    pub fn find_best_route<S: AsRef<str>>(
        &self,
        view: &Network,
        origin: &str,
        destinations: &[S],
    ) -> Result<RouteResult> {
        let origin = view.require(origin)?;
        let targets = known_destinations(view, destinations);
        self.best_route_between(view, origin, &targets)
    }

    /// Id-level [`RouteSearch::find_best_route`]; destinations not in
    /// `view` are ignored.
    pub fn best_route_between(
        &self,
        view: &Network,
        origin: NodeId,
        destinations: &[NodeId],
    ) -> Result<RouteResult> {
        let mut best = RouteResult::unreachable();
        let mut evaluated = 0usize;

        for &target in destinations {
            for_each_simple_path(view, origin, target, |path| {
                evaluated += 1;
                let cost = self.price(view, path)?;
                if cost < best.cost {
                    best = RouteResult {
                        cost,
                        path: path.to_vec(),
                    };
                }
                Ok(())
            })?;
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "route_search",
            origin = view.name(origin).unwrap_or_default(),
            destinations = destinations.len() as u64,
            paths_evaluated = evaluated as u64,
            best_cost = best.cost,
            reachable = best.is_reachable(),
        );
        let _ = evaluated;

        Ok(best)
    }

    /// Cost of an enumerated path. Failure means the walker produced a path
    /// that is not in `view`, which aborts the search and is logged.
    fn price(&self, view: &Network, path: &[NodeId]) -> Result<f64> {
        let priced = self.cost.path_cost(view, path);
        #[cfg(feature = "instrument")]
        {
            if let Err(err) = &priced {
                tracing::error!(
                    target: "routing",
                    error = %err,
                    path = ?view.path_names(path),
                    "enumerated path could not be priced"
                );
            }
        }
        priced
    }

    /// Every simple path to every destination, cheapest first.
    ///
    /// The sort is stable, so equal-cost routes keep enumeration order.
    pub fn find_all_routes<S: AsRef<str>>(
        &self,
        view: &Network,
        origin: &str,
        destinations: &[S],
    ) -> Result<Vec<RouteResult>> {
        let origin = view.require(origin)?;
        let mut routes = Vec::new();
        for target in known_destinations(view, destinations) {
            for_each_simple_path(view, origin, target, |path| {
                let cost = self.price(view, path)?;
                routes.push(RouteResult {
                    cost,
                    path: path.to_vec(),
                });
                Ok(())
            })?;
        }
        routes.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        Ok(routes)
    }

    /// Best route per destination. An unknown destination gets its own
    /// `UnknownNode` error without aborting the rest of the batch.
    pub fn routes_by_destination<S: AsRef<str>>(
        &self,
        view: &Network,
        origin: &str,
        destinations: &[S],
    ) -> Result<Vec<(String, Result<RouteResult>)>> {
        let origin = view.require(origin)?;
        Ok(destinations
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let result = view
                    .require(name)
                    .and_then(|target| self.best_route_between(view, origin, &[target]));
                (name.to_string(), result)
            })
            .collect())
    }
}

/// Cheapest ranked route whose first leg goes to `hop`.
///
/// `routes` is expected to be sorted by cost, as returned by
/// [`RouteSearch::find_all_routes`].
pub fn route_by_first_hop(routes: &[RouteResult], hop: NodeId) -> Option<&RouteResult> {
    routes.iter().find(|r| r.first_hop() == Some(hop))
}

fn known_destinations<S: AsRef<str>>(view: &Network, destinations: &[S]) -> Vec<NodeId> {
    destinations
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let id = view.id(name);
            #[cfg(feature = "instrument")]
            {
                if id.is_none() {
                    tracing::warn!(target: "routing", destination = name, "unknown destination skipped");
                }
            }
            id
        })
        .collect()
}
