use thiserror::Error;

/// Errors raised by the routing engine.
///
/// Unreachable destinations and Monte Carlo trials that find no route are
/// not errors; they show up as an infinite cost or a failure count.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    /// Malformed topology. Nothing is loaded when this is returned.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A node name that is not part of the network.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// A path that does not follow edges of the view it was evaluated on.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("cascade needs at least one attempted path")]
    EmptyCascade,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Topology or config JSON that could not be decoded.
    #[error("json error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for RoutingError {
    fn from(err: serde_json::Error) -> Self {
        RoutingError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RoutingError>;
