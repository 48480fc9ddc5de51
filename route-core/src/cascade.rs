//! Sequential failure / reroute accounting

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::cost::CostModel;
use crate::error::{Result, RoutingError};
use crate::network::Network;
use crate::types::{NodeId, Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Failed,
    Succeeded,
}

/// One attempt within a cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub path: Path,
    pub outcome: Outcome,
    /// Sunk cost for a failed attempt, full route cost for the success.
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CascadeResult {
    pub total_cost: f64,
    pub attempts: Vec<Attempt>,
}

impl CascadeResult {
    pub fn failures(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome == Outcome::Failed)
            .count()
    }

    /// Total wasted on failed attempts.
    pub fn sunk_cost(&self) -> f64 {
        self.attempts
            .iter()
            .filter(|a| a.outcome == Outcome::Failed)
            .map(|a| a.cost)
            .sum()
    }
}

/// Round trip over the first leg of a failed attempt: the truck sets out,
/// hits the block and comes back to the origin.
pub fn sunk_cost(view: &Network, path: &[NodeId]) -> Result<f64> {
    let [from, to, ..] = path else {
        return Err(RoutingError::InvalidPath(
            "failed attempt needs at least one leg".to_string(),
        ));
    };
    let edge = view.edge(*from, *to).ok_or_else(|| {
        RoutingError::InvalidPath(format!(
            "failed attempt starts with missing edge {} -> {}",
            view.name(*from).unwrap_or("?"),
            view.name(*to).unwrap_or("?")
        ))
    })?;
    Ok(2.0 * edge.weight)
}

/// Total cost of a sequence of attempts where every path but the last
/// failed.
///
/// `view` must contain the first leg of every failed attempt and the whole
/// final path. A single attempt is the no-failure case.
pub fn evaluate_cascade(view: &Network, cost: &CostModel, attempts: &[Path]) -> Result<CascadeResult> {
    let Some((last, failed)) = attempts.split_last() else {
        return Err(RoutingError::EmptyCascade);
    };

    let mut out = Vec::with_capacity(attempts.len());
    let mut total = 0.0;

    for path in failed {
        let sunk = sunk_cost(view, path)?;
        total += sunk;
        out.push(Attempt {
            path: path.clone(),
            outcome: Outcome::Failed,
            cost: sunk,
        });
    }

    let final_cost = cost.path_cost(view, last)?;
    total += final_cost;
    out.push(Attempt {
        path: last.clone(),
        outcome: Outcome::Succeeded,
        cost: final_cost,
    });

    #[cfg(feature = "instrument")]
    {
        for (index, attempt) in out.iter().enumerate() {
            tracing::info!(
                target: "cascade",
                attempt = index as u64,
                failed = attempt.outcome == Outcome::Failed,
                cost = attempt.cost,
                total_cost = total,
            );
        }
    }

    Ok(CascadeResult {
        total_cost: total,
        attempts: out,
    })
}

/// Contingency ladder over ordered strategies.
///
/// Entry `k` is the cascade where the first `k` strategies failed and
/// strategy `k` succeeded.
pub fn escalation(view: &Network, cost: &CostModel, strategies: &[Path]) -> Result<Vec<CascadeResult>> {
    if strategies.is_empty() {
        return Err(RoutingError::EmptyCascade);
    }
    (1..=strategies.len())
        .map(|n| evaluate_cascade(view, cost, &strategies[..n]))
        .collect()
}
