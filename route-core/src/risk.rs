//! Monte Carlo route robustness.
//!
//! Each trial takes an independent copy of the base network, knocks out
//! every edge with its own failure probability, and reruns the best-route
//! search. Trials share no state, so partial samples from several workers
//! can be combined with [`RiskSample::merge`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::{Result, RoutingError};
use crate::network::Network;
use crate::search::RouteSearch;
use crate::types::EdgeKey;

/// Raw Monte Carlo outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RiskSample {
    /// Best-route cost of every trial that reached a destination.
    pub costs: Vec<f64>,
    /// Trials where no destination was reachable.
    pub failure_count: usize,
}

impl RiskSample {
    pub fn iterations(&self) -> usize {
        self.costs.len() + self.failure_count
    }

    pub fn merge(&mut self, other: RiskSample) {
        self.costs.extend(other.costs);
        self.failure_count += other.failure_count;
    }

    fn sorted_costs(&self) -> Vec<f64> {
        let mut sorted = self.costs.clone();
        sorted.sort_by(f64::total_cmp);
        sorted
    }

    /// Summary statistics, or `InsufficientData` when no trial reached a
    /// destination.
    pub fn summary(&self, tail_percentile: f64) -> RiskSummary {
        let sorted = self.sorted_costs();
        let (Some(&min), Some(&max), Some(threshold)) =
            (sorted.first(), sorted.last(), percentile(&sorted, tail_percentile))
        else {
            return RiskSummary::InsufficientData {
                failure_count: self.failure_count,
            };
        };

        let samples = sorted.len();
        let mean = sorted.iter().sum::<f64>() / samples as f64;
        RiskSummary::Measured(RiskStatistics {
            samples,
            mean,
            tail_percentile,
            tail_threshold: threshold,
            min,
            max,
            failure_count: self.failure_count,
            failure_rate: self.failure_count as f64 / self.iterations() as f64,
        })
    }

    /// Costs at or above `threshold`.
    pub fn tail(&self, threshold: f64) -> Vec<f64> {
        self.costs.iter().copied().filter(|c| *c >= threshold).collect()
    }

    /// Equal-width histogram over `[min, max]`.
    ///
    /// A bin is part of the risk tail when its lower edge is at or above
    /// `threshold`. A sample with a single distinct value yields one bin.
    pub fn histogram(&self, bins: usize, threshold: f64) -> Vec<HistogramBin> {
        let sorted = self.sorted_costs();
        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return Vec::new();
        };
        if bins == 0 {
            return Vec::new();
        }
        if max <= min {
            return vec![HistogramBin {
                lower: min,
                upper: max,
                count: sorted.len(),
                risk_tail: min >= threshold,
            }];
        }

        let width = (max - min) / bins as f64;
        let mut out: Vec<HistogramBin> = (0..bins)
            .map(|i| {
                let lower = min + width * i as f64;
                let upper = if i + 1 == bins { max } else { lower + width };
                HistogramBin {
                    lower,
                    upper,
                    count: 0,
                    risk_tail: lower >= threshold,
                }
            })
            .collect();
        for cost in sorted {
            let index = (((cost - min) / width) as usize).min(bins - 1);
            out[index].count += 1;
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct RiskStatistics {
    /// Trials that reached a destination.
    pub samples: usize,
    pub mean: f64,
    pub tail_percentile: f64,
    /// Cost at `tail_percentile`; costs at or above it are the risk tail.
    pub tail_threshold: f64,
    pub min: f64,
    pub max: f64,
    pub failure_count: usize,
    /// Share of all trials that found no route.
    pub failure_rate: f64,
}

impl RiskStatistics {
    pub fn is_risk_tail(&self, cost: f64) -> bool {
        cost >= self.tail_threshold
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskSummary {
    Measured(RiskStatistics),
    InsufficientData { failure_count: usize },
}

impl RiskSummary {
    pub fn statistics(&self) -> Option<&RiskStatistics> {
        match self {
            RiskSummary::Measured(stats) => Some(stats),
            RiskSummary::InsufficientData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub risk_tail: bool,
}

/// Percentile of sorted data with linear interpolation between the two
/// closest ranks. `None` on empty input.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = p.clamp(0.0, 100.0) / 100.0 * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Copy of `base` with each edge independently removed with its failure
/// probability. Draws one uniform value per edge in edge order, so a seeded
/// RNG reproduces the same outages. Returns the view and the removed count.
pub fn sample_outages<R: Rng>(base: &Network, rng: &mut R) -> (Network, usize) {
    let mut view = base.clone_working_view();
    let failed: Vec<EdgeKey> = base
        .edges()
        .filter(|(_, edge)| rng.random::<f64>() < edge.failure_probability)
        .map(|(key, _)| key)
        .collect();
    for &(from, to) in &failed {
        view.remove_edge(from, to);
    }
    (view, failed.len())
}

/// Run `iterations` independent outage trials and collect best-route costs.
///
/// Fails with `InvalidParameter` when `iterations` is zero and with
/// `UnknownNode` when the origin is not in `base`, before any trial runs.
pub fn run_simulation<S, R>(
    base: &Network,
    search: &RouteSearch,
    origin: &str,
    destinations: &[S],
    iterations: usize,
    rng: &mut R,
) -> Result<RiskSample>
where
    S: AsRef<str>,
    R: Rng,
{
    if iterations == 0 {
        return Err(RoutingError::InvalidParameter(
            "iterations must be positive".to_string(),
        ));
    }
    let origin = base.require(origin)?;
    let targets: Vec<_> = destinations
        .iter()
        .filter_map(|d| base.id(d.as_ref()))
        .collect();

    let mut sample = RiskSample {
        costs: Vec::with_capacity(iterations),
        failure_count: 0,
    };

    for trial in 0..iterations {
        let (view, removed) = sample_outages(base, rng);
        let best = search.best_route_between(&view, origin, &targets)?;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "trial",
            trial = trial as u64,
            removed_edges = removed as u64,
            reached = best.is_reachable(),
            cost = best.cost,
        );
        let _ = (trial, removed);

        if best.is_reachable() {
            sample.costs.push(best.cost);
        } else {
            sample.failure_count += 1;
        }
    }

    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkBuilder;
    use crate::topology::EdgeRecord;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn percentile_interpolates() {
        let data: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        assert_eq!(percentile(&data, 0.0), Some(1.0));
        assert_eq!(percentile(&data, 100.0), Some(10.0));
        assert_eq!(percentile(&data, 50.0), Some(5.5));
        let p95 = percentile(&data, 95.0).unwrap();
        assert!((p95 - 9.55).abs() < 1e-9, "p95 = {}", p95);
        assert_eq!(percentile(&[], 95.0), None);
        assert_eq!(percentile(&[42.0], 95.0), Some(42.0));
    }

    #[test]
    fn summary_of_empty_sample_is_insufficient() {
        let sample = RiskSample {
            costs: vec![],
            failure_count: 7,
        };
        assert_eq!(
            sample.summary(95.0),
            RiskSummary::InsufficientData { failure_count: 7 }
        );
        assert!(sample.histogram(20, 0.0).is_empty());
    }

    #[test]
    fn summary_statistics() {
        let sample = RiskSample {
            costs: vec![100.0, 300.0, 200.0, 400.0],
            failure_count: 1,
        };
        let summary = sample.summary(95.0);
        let stats = summary.statistics().unwrap();
        assert_eq!(stats.samples, 4);
        assert_eq!(stats.mean, 250.0);
        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 400.0);
        assert!((stats.tail_threshold - 385.0).abs() < 1e-9);
        assert_eq!(stats.failure_count, 1);
        assert!((stats.failure_rate - 0.2).abs() < 1e-12);
        assert!(stats.is_risk_tail(400.0));
        assert!(!stats.is_risk_tail(300.0));
        assert_eq!(sample.tail(stats.tail_threshold), vec![400.0]);
    }

    #[test]
    fn histogram_covers_every_sample() {
        let sample = RiskSample {
            costs: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
            failure_count: 0,
        };
        let bins = sample.histogram(5, 8.0);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 11);
        assert_eq!(bins[4].count, 3); // 8, 9 and the max 10
        assert!(bins[4].risk_tail);
        assert!(!bins[3].risk_tail);

        let flat = RiskSample {
            costs: vec![5.0; 4],
            failure_count: 0,
        };
        let bins = flat.histogram(20, 5.0);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 4);
        assert!(bins[0].risk_tail);
    }

    #[test]
    fn merge_combines_partials() {
        let mut a = RiskSample {
            costs: vec![1.0],
            failure_count: 2,
        };
        a.merge(RiskSample {
            costs: vec![2.0, 3.0],
            failure_count: 1,
        });
        assert_eq!(a.costs, vec![1.0, 2.0, 3.0]);
        assert_eq!(a.failure_count, 3);
        assert_eq!(a.iterations(), 6);
    }

    fn fragile() -> Network {
        NetworkBuilder::new()
            .nodes(["A", "B", "C"])
            .edge(EdgeRecord::road("A", "B", 10.0).with_failure_probability(0.5))
            .edge(EdgeRecord::road("B", "C", 10.0))
            .edge(EdgeRecord::road("A", "C", 50.0).with_failure_probability(0.5))
            .build()
            .unwrap()
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let net = fragile();
        let search = RouteSearch::default();
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        let s1 = run_simulation(&net, &search, "A", &["C"], 200, &mut rng1).unwrap();
        let s2 = run_simulation(&net, &search, "A", &["C"], 200, &mut rng2).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(s1.iterations(), 200);
    }

    #[test]
    fn outcome_frequencies_follow_probabilities() {
        // P(A->B up) = 0.5 gives 20, else P(A->C up) = 0.5 gives 50, else failure.
        let net = fragile();
        let mut rng = StdRng::seed_from_u64(7);
        let trials = 2000;
        let sample =
            run_simulation(&net, &RouteSearch::default(), "A", &["C"], trials, &mut rng).unwrap();

        let cheap = sample.costs.iter().filter(|c| **c == 20.0).count();
        let detour = sample.costs.iter().filter(|c| **c == 50.0).count();
        assert_eq!(cheap + detour, sample.costs.len());

        let cheap_rate = cheap as f64 / trials as f64;
        let fail_rate = sample.failure_count as f64 / trials as f64;
        assert!(cheap_rate > 0.44 && cheap_rate < 0.56, "cheap_rate = {}", cheap_rate);
        assert!(fail_rate > 0.19 && fail_rate < 0.31, "fail_rate = {}", fail_rate);
    }

    #[test]
    fn zero_iterations_rejected() {
        let net = fragile();
        let mut rng = StdRng::seed_from_u64(1);
        let err = run_simulation(&net, &RouteSearch::default(), "A", &["C"], 0, &mut rng).unwrap_err();
        assert!(matches!(err, RoutingError::InvalidParameter(_)));
    }

    #[test]
    fn unknown_origin_rejected() {
        let net = fragile();
        let mut rng = StdRng::seed_from_u64(1);
        let err = run_simulation(&net, &RouteSearch::default(), "Q", &["C"], 10, &mut rng).unwrap_err();
        assert_eq!(err, RoutingError::UnknownNode("Q".to_string()));
    }

    #[test]
    fn outages_never_touch_base() {
        let net = fragile();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let (view, removed) = sample_outages(&net, &mut rng);
            assert_eq!(view.edge_count() + removed, net.edge_count());
        }
        assert_eq!(net.edge_count(), 3);
    }
}
