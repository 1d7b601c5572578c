//! The visor control surface.
//!
//! Every backend (remote forwarding, local simulation) implements the same
//! trait, so callers pick a backend once at construction time and never
//! inspect it again.

use super::types::{AppState, HealthInfo, Summary};
use super::updater::Version;
use crate::identity::PubKey;
use crate::routing::{RouteGroupInfo, RouteId, RoutingRule};
use crate::transport::{EntryWithStatus, TransportId, TransportSummary};
use crate::Result;
use std::time::{Duration, SystemTime};

pub trait VisorApi: Send + Sync {
    fn summary(&self) -> Result<Summary>;

    fn health(&self) -> Result<HealthInfo>;

    /// Seconds since the visor started
    fn uptime(&self) -> Result<f64>;

    fn apps(&self) -> Result<Vec<AppState>>;
    fn start_app(&self, app_name: &str) -> Result<()>;
    fn stop_app(&self, app_name: &str) -> Result<()>;
    fn set_auto_start(&self, app_name: &str, auto_start: bool) -> Result<()>;
    fn set_socks_password(&self, password: &str) -> Result<()>;
    fn set_socks_client_pk(&self, pk: PubKey) -> Result<()>;
    fn logs_since(&self, timestamp: SystemTime, app_name: &str) -> Result<Vec<String>>;

    fn transport_types(&self) -> Result<Vec<String>>;

    /// Transports matching any of `types` and having any of `pks` as an edge.
    /// Empty filters match everything; logs are stripped unless `logs` is set.
    fn transports(
        &self,
        types: &[String],
        pks: &[PubKey],
        logs: bool,
    ) -> Result<Vec<TransportSummary>>;
    fn transport(&self, tid: TransportId) -> Result<TransportSummary>;
    fn add_transport(
        &self,
        remote: PubKey,
        tp_type: &str,
        public: bool,
        timeout: Duration,
    ) -> Result<TransportSummary>;
    fn remove_transport(&self, tid: TransportId) -> Result<()>;

    fn discover_transports_by_pk(&self, pk: PubKey) -> Result<Vec<EntryWithStatus>>;
    fn discover_transport_by_id(&self, id: TransportId) -> Result<EntryWithStatus>;

    fn routing_rules(&self) -> Result<Vec<RoutingRule>>;
    fn routing_rule(&self, key: RouteId) -> Result<RoutingRule>;
    fn save_routing_rule(&self, rule: RoutingRule) -> Result<()>;
    fn remove_routing_rule(&self, key: RouteId) -> Result<()>;

    fn route_groups(&self) -> Result<Vec<RouteGroupInfo>>;

    fn restart(&self) -> Result<()>;
    fn exec(&self, command: &str) -> Result<Vec<u8>>;
    fn update(&self) -> Result<bool>;

    /// `None` when the visor is up to date
    fn update_available(&self) -> Result<Option<Version>>;
}
