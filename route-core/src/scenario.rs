//! Built-in scenario: soy export corridor out of northern Mato Grosso

use crate::error::Result;
use crate::network::Network;
use crate::topology::TopologyInput;

const SOY_CORRIDOR_JSON: &str = include_str!("../data/soy_corridor.json");

pub const ORIGIN: &str = "Sorriso_MT";
pub const DESTINATIONS: [&str; 3] = ["Miritituba_PA", "Santos_SP", "Santarem_PA"];

/// First hop of each contingency strategy, in the order they are tried.
pub const NORTH: &str = "Sinop_MT";
pub const SOUTH: &str = "Cuiaba_MT";
pub const EAST: &str = "Agua_Boa_MT";
pub const WEST: &str = "Campo_Novo_MT";
pub const STRATEGY_HOPS: [&str; 4] = [NORTH, SOUTH, EAST, WEST];

pub fn soy_corridor_topology() -> Result<TopologyInput> {
    TopologyInput::from_json(SOY_CORRIDOR_JSON)
}

pub fn soy_corridor() -> Result<Network> {
    soy_corridor_topology()?.to_network()
}
