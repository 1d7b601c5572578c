//! Source routing: rules, the routing table and route group derivation
//!
//! - `rule`: forward and consume rule types
//! - `table`: rule storage, id reservation and keep-alive expiry
//! - `group`: consume/forward pairing computed on demand

pub mod group;
pub mod rule;
pub mod table;

pub use group::{derive_route_groups, RouteGroupInfo};
pub use rule::{
    ConsumeRule, ForwardRule, Port, RouteDescriptor, RouteId, RoutingRule, RuleType,
    DEFAULT_ROUTE_KEEP_ALIVE,
};
pub use table::{RoutingError, RoutingTable};
