//! End-to-end scenarios on the built-in soy export corridor.
//!
//! ## Corridor costs (BRL/t)
//!
//! | direction | first hop     | route                                  | dry   | wet   |
//! |-----------|---------------|----------------------------------------|-------|-------|
//! | north     | Sinop_MT      | Sorriso - Sinop - Miritituba           | 180.0 | 290.4 |
//! | south     | Cuiaba_MT     | Sorriso - Cuiaba - Rondonopolis - Santos (rail) | 270.0 | 279.0 |
//! | east      | Agua_Boa_MT   | Sorriso - Agua Boa - Palmas - Santos (rail)     | 380.0 | 458.4 |
//! | west      | Campo_Novo_MT | Sorriso - Campo Novo - Porto Velho - Santarem   | 390.0 | 640.2 |
//!
//! Both rail routes pay one 12.50 transshipment fee.

use rand::SeedableRng;
use rand::rngs::StdRng;
use route_core::scenario::{self, DESTINATIONS, EAST, NORTH, ORIGIN, SOUTH, STRATEGY_HOPS, WEST};
use route_core::{
    Conditions, CostStatus, Outcome, Planner, PlannerConfig, RouteQuery, RouteSearch, RoutingError,
    TopologyInput, run_simulation,
};

const EPS: f64 = 1e-9;

fn planner() -> Planner {
    Planner::new(scenario::soy_corridor().unwrap(), PlannerConfig::default(), 2024)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPS,
        "expected {expected}, got {actual}"
    );
}

fn names(p: &Planner, path: &[route_core::NodeId]) -> Vec<String> {
    p.base().path_names(path)
}

// === ROUTE SELECTION ===

#[test]
fn clear_weather_goes_north() {
    let p = planner();
    let best = p.baseline(ORIGIN, &DESTINATIONS).unwrap();
    assert_close(best.cost, 180.0);
    assert_eq!(names(&p, &best.path), vec!["Sorriso_MT", "Sinop_MT", "Miritituba_PA"]);
}

#[test]
fn ranked_routes_cover_every_direction() {
    let p = planner();
    let routes = p.all_routes(ORIGIN, &DESTINATIONS).unwrap();
    let costs: Vec<f64> = routes.iter().map(|r| r.cost).collect();
    assert_eq!(costs, vec![180.0, 270.0, 300.0, 380.0, 390.0]);
}

#[test]
fn one_strategy_per_direction() {
    let p = planner();
    let strategies = p.strategies(ORIGIN, &DESTINATIONS, &STRATEGY_HOPS).unwrap();
    assert_eq!(strategies.len(), 4);
    for (path, hop) in strategies.iter().zip([NORTH, SOUTH, EAST, WEST]) {
        assert_eq!(names(&p, path)[1], hop);
    }
    assert_eq!(
        names(&p, &strategies[1]),
        vec!["Sorriso_MT", "Cuiaba_MT", "Rondonopolis_MT", "Santos_SP"]
    );
}

#[test]
fn weather_flips_choice_to_rail() {
    let p = planner();
    let wet = Conditions::clear().with_weather(true);
    let search = p.search();
    let view = p.view(&wet);

    let by_direction: Vec<f64> = p
        .strategies(ORIGIN, &DESTINATIONS, &STRATEGY_HOPS)
        .unwrap()
        .iter()
        .map(|path| search.cost.path_cost(&view, path).unwrap())
        .collect();
    for (actual, expected) in by_direction.iter().zip([290.4, 279.0, 458.4, 640.2]) {
        assert_close(*actual, expected);
    }

    let best = p.best_route(ORIGIN, &DESTINATIONS, &wet).unwrap();
    assert_close(best.cost, 279.0);
    assert_eq!(names(&p, &best.path)[1], SOUTH);
}

#[test]
fn weather_amplifies_severe_road_risk_only() {
    let p = planner();
    let view = p.view(&Conditions::clear().with_weather(true));
    let edge = |u: &str, v: &str| {
        view.edge(view.id(u).unwrap(), view.id(v).unwrap())
            .unwrap()
            .clone()
    };

    // precarious road: 0.15 * 2.5
    assert_close(edge("Sinop_MT", "Miritituba_PA").failure_probability, 0.375);
    // paved road: reweighted, risk untouched
    let paved = edge("Sorriso_MT", "Cuiaba_MT");
    assert_close(paved.weight, 66.0);
    assert_close(paved.failure_probability, 0.03);
    // rail untouched
    assert_eq!(edge("Rondonopolis_MT", "Santos_SP").weight, 167.5);
}

// === QUERIES ===

#[test]
fn blocked_first_leg_costs_fifty_percent() {
    let mut p = planner();
    let report = p
        .evaluate(&RouteQuery::new(ORIGIN, DESTINATIONS).block(ORIGIN, NORTH))
        .unwrap();
    assert_eq!(report.route.cost, Some(270.0));
    assert_eq!(report.baseline.cost, Some(180.0));
    assert_eq!(report.comparison.status, CostStatus::Overpriced);
    assert_close(report.comparison.overprice_pct.unwrap(), 50.0);
}

#[test]
fn weather_and_block_compose() {
    let mut p = planner();
    let report = p
        .evaluate(
            &RouteQuery::new(ORIGIN, DESTINATIONS)
                .with_weather(true)
                .block(ORIGIN, SOUTH),
        )
        .unwrap();
    assert_close(report.route.cost.unwrap(), 290.4);
    assert_eq!(report.route.path[1], NORTH);
}

#[test]
fn all_exits_blocked_is_unreachable() {
    let mut p = planner();
    let query = STRATEGY_HOPS
        .iter()
        .fold(RouteQuery::new(ORIGIN, DESTINATIONS), |q, hop| q.block(ORIGIN, *hop));
    let report = p.evaluate(&query).unwrap();
    assert_eq!(report.route.cost, None);
    assert_eq!(report.comparison.status, CostStatus::Unreachable);
}

#[test]
fn unknown_destination_does_not_abort_batch() {
    let p = planner();
    let dests = ["Atlantis", "Santos_SP"];
    let best = p.baseline(ORIGIN, &dests).unwrap();
    assert_close(best.cost, 270.0);

    let per_destination = RouteSearch::default()
        .routes_by_destination(p.base(), ORIGIN, &dests)
        .unwrap();
    assert!(matches!(per_destination[0].1, Err(RoutingError::UnknownNode(_))));
    assert_close(per_destination[1].1.as_ref().unwrap().cost, 270.0);
}

// === CASCADES ===

#[test]
fn failed_north_attempt_then_south() {
    let p = planner();
    let attempts = vec![
        vec!["Sorriso_MT", "Sinop_MT", "Miritituba_PA"],
        vec!["Sorriso_MT", "Cuiaba_MT", "Rondonopolis_MT", "Santos_SP"],
    ];
    let cascade = p.cascade(&attempts, false).unwrap();
    assert_close(cascade.total_cost, 80.0 + 270.0);
    assert_eq!(cascade.attempts[0].outcome, Outcome::Failed);
    assert_close(cascade.attempts[0].cost, 80.0);
    assert_eq!(cascade.attempts[1].outcome, Outcome::Succeeded);
    assert_close(cascade.sunk_cost(), 80.0);
}

#[test]
fn escalation_ladder() {
    let p = planner();
    let strategies: Vec<Vec<String>> = p
        .strategies(ORIGIN, &DESTINATIONS, &STRATEGY_HOPS)
        .unwrap()
        .iter()
        .map(|path| names(&p, path))
        .collect();

    let dry: Vec<f64> = p
        .escalation(&strategies, false)
        .unwrap()
        .iter()
        .map(|c| c.total_cost)
        .collect();
    assert_eq!(dry, vec![180.0, 350.0, 580.0, 770.0]);

    let wet = p.escalation(&strategies, true).unwrap();
    // turning back on the wet north leg: 2 * 44
    assert_close(wet[1].total_cost, 88.0 + 279.0);
    assert_eq!(wet[3].failures(), 3);
}

#[test]
fn empty_cascade_rejected() {
    let p = planner();
    let none: Vec<Vec<String>> = Vec::new();
    assert!(matches!(p.cascade(&none, false), Err(RoutingError::EmptyCascade)));
}

// === RISK ===

#[test]
fn corridor_risk_profile() {
    let mut p = planner();
    let report = p
        .evaluate(&RouteQuery::new(ORIGIN, DESTINATIONS).with_iterations(400))
        .unwrap();
    let risk = report.risk.unwrap();
    let stats = risk.summary.statistics().unwrap();

    assert_eq!(stats.samples + stats.failure_count, 400);
    assert!(stats.min >= 180.0);
    assert!(stats.mean >= 180.0);
    assert!(stats.tail_threshold >= stats.mean);
    // outages only add cost, and the north route survives most trials
    assert_close(stats.min, 180.0);

    assert!(!risk.histogram.is_empty());
    let binned: usize = risk.histogram.iter().map(|b| b.count).sum();
    assert_eq!(binned, stats.samples);
    assert!(risk.histogram.last().unwrap().risk_tail || stats.min == stats.max);
}

#[test]
fn weather_widens_risk() {
    let base = scenario::soy_corridor().unwrap();
    let search = RouteSearch::default();
    let cfg = PlannerConfig::default();

    let dry_view = Conditions::clear().derive_view(&base, &cfg.weather);
    let wet_view = Conditions::clear().with_weather(true).derive_view(&base, &cfg.weather);

    let mut rng = StdRng::seed_from_u64(77);
    let dry = run_simulation(&dry_view, &search, ORIGIN, &DESTINATIONS, 500, &mut rng).unwrap();
    let mut rng = StdRng::seed_from_u64(77);
    let wet = run_simulation(&wet_view, &search, ORIGIN, &DESTINATIONS, 500, &mut rng).unwrap();

    let dry = dry.summary(95.0);
    let wet = wet.summary(95.0);
    assert!(wet.statistics().unwrap().mean > dry.statistics().unwrap().mean);
}

// === INPUT ===

#[test]
fn topology_errors_surface_before_any_query() {
    let dangling = r#"{
        "nodes": { "A": [0, 0] },
        "edges": [ { "u": "A", "v": "B", "weight": 1.0, "type": "road" } ]
    }"#;
    assert!(matches!(
        TopologyInput::from_json(dangling).and_then(|t| t.to_network()),
        Err(RoutingError::InvalidTopology(_))
    ));

    assert!(matches!(
        TopologyInput::from_json("{ not json"),
        Err(RoutingError::Json(_))
    ));
}
