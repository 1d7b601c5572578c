//! Routing rules: the entries of a visor's source-routing table.
//!
//! A route through the mesh is a chain of rules keyed by route id. Forward
//! rules describe one hop and name the route id to use on the next hop. A
//! consume rule terminates a route locally and names the first forward rule
//! of the outbound path. Rules refer to each other by id only.

use crate::identity::PubKey;
use crate::transport::TransportId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Keep-alive applied to rules created without an explicit one
pub const DEFAULT_ROUTE_KEEP_ALIVE: Duration = Duration::from_secs(30 * 60);

/// Identifier of a routing rule within one table. 0 is never allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub u32);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RouteId {
    fn from(id: u32) -> Self {
        RouteId(id)
    }
}

/// Application port on a visor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(pub u16);

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0.to_string())
    }
}

/// Endpoints of the route a forward rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub src_pk: PubKey,
    pub dst_pk: PubKey,
    pub src_port: Port,
    pub dst_port: Port,
}

/// One hop of a multi-hop path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardRule {
    pub route_id: RouteId,
    pub next_route_id: RouteId,
    pub next_transport_id: TransportId,
    pub descriptor: RouteDescriptor,
    pub keep_alive: Duration,
}

/// Terminal (local) endpoint of a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeRule {
    pub route_id: RouteId,
    pub local_pk: PubKey,
    pub remote_pk: PubKey,
    pub local_port: Port,
    pub remote_port: Port,
    pub keep_alive: Duration,
    /// First forward rule of the outbound path
    pub next_route_id: RouteId,
}

/// Discriminant of a [`RoutingRule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleType {
    Forward,
    Consume,
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::Forward => write!(f, "Forward"),
            RuleType::Consume => write!(f, "Consume"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingRule {
    Forward(ForwardRule),
    Consume(ConsumeRule),
}

impl RoutingRule {
    pub fn forward(
        keep_alive: Duration,
        route_id: RouteId,
        next_route_id: RouteId,
        next_transport_id: TransportId,
        descriptor: RouteDescriptor,
    ) -> Self {
        RoutingRule::Forward(ForwardRule {
            route_id,
            next_route_id,
            next_transport_id,
            descriptor,
            keep_alive,
        })
    }

    pub fn consume(
        keep_alive: Duration,
        route_id: RouteId,
        local_pk: PubKey,
        remote_pk: PubKey,
        local_port: Port,
        remote_port: Port,
        next_route_id: RouteId,
    ) -> Self {
        RoutingRule::Consume(ConsumeRule {
            route_id,
            local_pk,
            remote_pk,
            local_port,
            remote_port,
            keep_alive,
            next_route_id,
        })
    }

    /// Id the rule is stored under
    pub fn route_id(&self) -> RouteId {
        match self {
            RoutingRule::Forward(r) => r.route_id,
            RoutingRule::Consume(r) => r.route_id,
        }
    }

    /// Id this rule chains to
    pub fn next_route_id(&self) -> RouteId {
        match self {
            RoutingRule::Forward(r) => r.next_route_id,
            RoutingRule::Consume(r) => r.next_route_id,
        }
    }

    pub fn keep_alive(&self) -> Duration {
        match self {
            RoutingRule::Forward(r) => r.keep_alive,
            RoutingRule::Consume(r) => r.keep_alive,
        }
    }

    pub fn rule_type(&self) -> RuleType {
        match self {
            RoutingRule::Forward(_) => RuleType::Forward,
            RoutingRule::Consume(_) => RuleType::Consume,
        }
    }

    pub fn as_forward(&self) -> Option<&ForwardRule> {
        match self {
            RoutingRule::Forward(r) => Some(r),
            RoutingRule::Consume(_) => None,
        }
    }

    pub fn as_consume(&self) -> Option<&ConsumeRule> {
        match self {
            RoutingRule::Consume(r) => Some(r),
            RoutingRule::Forward(_) => None,
        }
    }
}

impl fmt::Display for RoutingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingRule::Forward(r) => write!(
                f,
                "Forward {{ id: {}, next_id: {}, next_tp: {}, keep_alive: {:?} }}",
                r.route_id, r.next_route_id, r.next_transport_id, r.keep_alive
            ),
            RoutingRule::Consume(r) => write!(
                f,
                "Consume {{ id: {}, local: {}:{}, remote: {}:{}, next_id: {}, keep_alive: {:?} }}",
                r.route_id,
                r.local_pk,
                r.local_port,
                r.remote_pk,
                r.remote_port,
                r.next_route_id,
                r.keep_alive
            ),
        }
    }
}
