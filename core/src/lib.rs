// Visor control plane
//
// The object model a visor's control surface operates on (apps, transports,
// routing rules, route groups) and the two backends that implement that
// surface: one forwarding every call to a remote node, one simulating a node
// in memory.

pub mod identity;
pub mod routing;
pub mod rpc;
pub mod transport;
pub mod visor;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use identity::{KeyPair, PubKey};
pub use routing::{RouteGroupInfo, RouteId, RoutingRule, RoutingTable};
pub use rpc::{ChannelError, HttpChannel, RpcChannel, RpcGateway};
pub use transport::{TransportId, TransportInventory, TransportSummary};
pub use visor::{MockVisor, RpcClient, Summary, VisorApi};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors returned by every control surface operation.
///
/// Serializable so a remote node can report the kind of failure and the
/// forwarding client can hand the same kind back to its caller.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum VisorError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Route id space exhausted")]
    Exhausted,

    #[error("Dangling route reference: consume rule {rule} points at missing forward rule {next}")]
    DanglingReference { rule: RouteId, next: RouteId },

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// The serving node could not encode its own reply
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

impl VisorError {
    /// Only failures of the underlying exchange are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, VisorError::Channel(_))
    }
}

impl From<routing::RoutingError> for VisorError {
    fn from(err: routing::RoutingError) -> Self {
        match err {
            routing::RoutingError::RuleNotFound(id) => {
                VisorError::NotFound(format!("routing rule of id '{}'", id))
            }
            routing::RoutingError::Exhausted { .. } => VisorError::Exhausted,
            routing::RoutingError::DanglingReference { rule, next } => {
                VisorError::DanglingReference { rule, next }
            }
        }
    }
}

impl From<transport::InventoryError> for VisorError {
    fn from(err: transport::InventoryError) -> Self {
        match err {
            transport::InventoryError::NotFound(id) => {
                VisorError::NotFound(format!("transport of id '{}'", id))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, VisorError>;
