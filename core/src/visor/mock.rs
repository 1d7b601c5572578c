//! In-memory visor simulation.
//!
//! All mutable state (apps, routing table, transport inventory) sits behind
//! one `RwLock`. Read operations take it shared and return owned copies;
//! mutations take it exclusive. Collaborators that may block (discovery,
//! update checks, log storage) are called with the lock released.

use super::api::VisorApi;
use super::logstore::{LogStore, MemoryLogStore};
use super::types::{
    AppState, AppStatus, BuildInfo, HealthInfo, Summary, SUPPORTED_PROTOCOL_VERSION,
};
use super::updater::{UpdateChecker, Version};
use crate::identity::{KeyPair, PubKey};
use crate::routing::{
    derive_route_groups, Port, RouteDescriptor, RouteGroupInfo, RouteId, RoutingRule,
    RoutingTable, DEFAULT_ROUTE_KEEP_ALIVE,
};
use crate::transport::{
    EntryWithStatus, LogEntry, TransportDiscovery, TransportId, TransportInventory,
    TransportSummary,
};
use crate::{Result, VisorError};
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info};
use uuid::Uuid;

/// Transport types a simulated visor supports
pub const MOCK_TRANSPORT_TYPES: [&str; 2] = ["messaging", "native"];

pub const SOCKS_APP: &str = "skysocks";
pub const SOCKS_CLIENT_APP: &str = "skysocks-client";

/// Mutable state of a simulated visor
struct VisorState {
    apps: Vec<AppState>,
    routing: RoutingTable,
    transports: TransportInventory,
    socks_password: Option<String>,
    socks_client_pk: Option<PubKey>,
}

/// A simulated visor. Clones share the same state.
#[derive(Clone)]
pub struct MockVisor {
    pk: PubKey,
    started_at: Instant,
    build_info: BuildInfo,
    tp_types: Vec<String>,
    state: Arc<RwLock<VisorState>>,
    logs: Arc<dyn LogStore>,
    discovery: Option<Arc<dyn TransportDiscovery>>,
    updater: Option<Arc<dyn UpdateChecker>>,
}

impl MockVisor {
    /// A visor with the default apps and empty routing and transport state
    pub fn new(pk: PubKey) -> Self {
        Self::with_table(pk, RoutingTable::new())
    }

    /// Like `new`, over a caller-provided routing table
    pub fn with_table(pk: PubKey, routing: RoutingTable) -> Self {
        let apps = vec![
            AppState::new("foo.v1.0", false, 10),
            AppState::new("bar.v2.0", false, 20),
        ];
        Self {
            pk,
            started_at: Instant::now(),
            build_info: BuildInfo::get(),
            tp_types: MOCK_TRANSPORT_TYPES.iter().map(|t| t.to_string()).collect(),
            state: Arc::new(RwLock::new(VisorState {
                apps,
                routing,
                transports: TransportInventory::new(),
                socks_password: None,
                socks_client_pk: None,
            })),
            logs: Arc::new(MemoryLogStore::new()),
            discovery: None,
            updater: None,
        }
    }

    /// A visor populated with up to `max_tps` random transports and up to
    /// `max_rules` random route groups (a forward rule plus the consume rule
    /// pointing at it).
    pub fn random<R: Rng>(rng: &mut R, max_tps: usize, max_rules: usize) -> Result<Self> {
        let local_pk = KeyPair::generate_with(rng).public_key();
        info!("generating mock visor with local pk {}", local_pk);

        let mock = Self::new(local_pk);
        {
            let mut state = mock.state.write();

            let n_tps = rng.gen_range(0..=max_tps);
            for i in 0..n_tps {
                let remote = KeyPair::generate_with(rng).public_key();
                let tp_type = MOCK_TRANSPORT_TYPES[rng.gen_range(0..MOCK_TRANSPORT_TYPES.len())];
                let mut summary = TransportSummary::new(local_pk, remote, tp_type);
                summary.log = Some(LogEntry {
                    recv_bytes: rng.gen_range(0..1 << 20),
                    sent_bytes: rng.gen_range(0..1 << 20),
                });
                debug!("tp[{:2}]: {}", i, summary);
                state.transports.insert(summary);
            }

            let n_rules = rng.gen_range(0..=max_rules);
            for i in 0..n_rules {
                let remote = KeyPair::generate_with(rng).public_key();
                let local_port = Port(rng.gen());
                let remote_port = Port(rng.gen());

                let ids = state.routing.reserve(2)?;
                let (fwd_id, app_id) = (ids[0], ids[1]);

                let descriptor = RouteDescriptor {
                    src_pk: local_pk,
                    dst_pk: remote,
                    src_port: local_port,
                    dst_port: remote_port,
                };
                let fwd = RoutingRule::forward(
                    DEFAULT_ROUTE_KEEP_ALIVE,
                    fwd_id,
                    RouteId(rng.gen()),
                    Uuid::from_bytes(rng.gen()),
                    descriptor,
                );
                let consume = RoutingRule::consume(
                    DEFAULT_ROUTE_KEEP_ALIVE,
                    app_id,
                    local_pk,
                    remote,
                    local_port,
                    remote_port,
                    fwd_id,
                );
                debug!("rule[{:2}]: {} / {}", i, fwd, consume);
                state.routing.save(fwd);
                state.routing.save(consume);
            }

            info!(
                "mock visor has {} transports and {} routing rules",
                state.transports.len(),
                state.routing.count()
            );
        }
        Ok(mock)
    }

    pub fn with_apps(self, apps: Vec<AppState>) -> Self {
        self.state.write().apps = apps;
        self
    }

    pub fn with_log_store(mut self, logs: Arc<dyn LogStore>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_discovery(mut self, discovery: Arc<dyn TransportDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn with_update_checker(mut self, updater: Arc<dyn UpdateChecker>) -> Self {
        self.updater = Some(updater);
        self
    }

    pub fn pub_key(&self) -> PubKey {
        self.pk
    }

    pub fn socks_password_set(&self) -> bool {
        self.state.read().socks_password.is_some()
    }

    pub fn socks_client_pk(&self) -> Option<PubKey> {
        self.state.read().socks_client_pk
    }

    /// Reserve fresh route ids in the simulated routing table
    pub fn reserve_route_ids(&self, n: usize) -> Result<Vec<RouteId>> {
        self.write(|state| Ok(state.routing.reserve(n)?))
    }

    /// Account traffic on a transport
    pub fn record_traffic(&self, tid: TransportId, sent: u64, recv: u64) -> Result<()> {
        self.write(|state| Ok(state.transports.record(tid, sent, recv)?))
    }

    /// Refresh a rule's keep-alive
    pub fn touch_route(&self, key: RouteId) -> Result<()> {
        self.write(|state| Ok(state.routing.touch(key, Instant::now())?))
    }

    /// Delete rules idle past their keep-alive, returning their ids
    pub fn collect_expired_routes(&self, now: Instant) -> Vec<RouteId> {
        let expired = self.state.write().routing.collect_expired(now);
        if !expired.is_empty() {
            info!("expired {} routing rules", expired.len());
        }
        expired
    }

    fn read<T>(&self, f: impl FnOnce(&VisorState) -> Result<T>) -> Result<T> {
        let state = self.state.read();
        f(&state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut VisorState) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        f(&mut state)
    }

    fn app_mut<'a>(state: &'a mut VisorState, name: &str) -> Result<&'a mut AppState> {
        state
            .apps
            .iter_mut()
            .find(|app| app.name == name)
            .ok_or_else(|| VisorError::NotFound(format!("app of name '{}'", name)))
    }

    fn require_app(state: &VisorState, name: &str) -> Result<()> {
        if state.apps.iter().any(|app| app.name == name) {
            Ok(())
        } else {
            Err(VisorError::NotFound(format!("app of name '{}'", name)))
        }
    }
}

impl VisorApi for MockVisor {
    fn summary(&self) -> Result<Summary> {
        self.read(|state| {
            Ok(Summary {
                pub_key: self.pk,
                build_info: self.build_info.clone(),
                app_protocol_version: SUPPORTED_PROTOCOL_VERSION.to_string(),
                apps: state.apps.clone(),
                transports: state.transports.all(),
                routes_count: state.routing.count(),
            })
        })
    }

    fn health(&self) -> Result<HealthInfo> {
        Ok(HealthInfo::all_ok())
    }

    fn uptime(&self) -> Result<f64> {
        Ok(self.started_at.elapsed().as_secs_f64())
    }

    fn apps(&self) -> Result<Vec<AppState>> {
        self.read(|state| Ok(state.apps.clone()))
    }

    fn start_app(&self, app_name: &str) -> Result<()> {
        self.write(|state| {
            Self::app_mut(state, app_name)?.status = AppStatus::Running;
            info!("started app {}", app_name);
            Ok(())
        })
    }

    fn stop_app(&self, app_name: &str) -> Result<()> {
        self.write(|state| {
            Self::app_mut(state, app_name)?.status = AppStatus::Stopped;
            info!("stopped app {}", app_name);
            Ok(())
        })
    }

    fn set_auto_start(&self, app_name: &str, auto_start: bool) -> Result<()> {
        self.write(|state| {
            Self::app_mut(state, app_name)?.auto_start = auto_start;
            Ok(())
        })
    }

    fn set_socks_password(&self, password: &str) -> Result<()> {
        self.write(|state| {
            Self::require_app(state, SOCKS_APP)?;
            state.socks_password = Some(password.to_string());
            info!("socks password changed");
            Ok(())
        })
    }

    fn set_socks_client_pk(&self, pk: PubKey) -> Result<()> {
        self.write(|state| {
            Self::require_app(state, SOCKS_CLIENT_APP)?;
            state.socks_client_pk = Some(pk);
            info!("socks client pk set to {}", pk);
            Ok(())
        })
    }

    fn logs_since(&self, timestamp: SystemTime, app_name: &str) -> Result<Vec<String>> {
        self.read(|state| Self::require_app(state, app_name))?;
        self.logs.logs_since(timestamp)
    }

    fn transport_types(&self) -> Result<Vec<String>> {
        Ok(self.tp_types.clone())
    }

    fn transports(
        &self,
        types: &[String],
        pks: &[PubKey],
        logs: bool,
    ) -> Result<Vec<TransportSummary>> {
        self.read(|state| Ok(state.transports.list(types, pks, logs)))
    }

    fn transport(&self, tid: TransportId) -> Result<TransportSummary> {
        self.read(|state| Ok(state.transports.get(tid)?))
    }

    fn add_transport(
        &self,
        remote: PubKey,
        tp_type: &str,
        _public: bool,
        _timeout: Duration,
    ) -> Result<TransportSummary> {
        self.write(|state| Ok(state.transports.add(self.pk, remote, tp_type)))
    }

    fn remove_transport(&self, tid: TransportId) -> Result<()> {
        self.write(|state| {
            let removed = state.transports.remove(tid)?;
            info!("removed transport {}", removed.id);
            Ok(())
        })
    }

    fn discover_transports_by_pk(&self, pk: PubKey) -> Result<Vec<EntryWithStatus>> {
        match &self.discovery {
            Some(discovery) => discovery.entries_by_pk(&pk),
            None => Err(VisorError::NotImplemented("transport discovery".into())),
        }
    }

    fn discover_transport_by_id(&self, id: TransportId) -> Result<EntryWithStatus> {
        match &self.discovery {
            Some(discovery) => discovery.entry_by_id(id),
            None => Err(VisorError::NotImplemented("transport discovery".into())),
        }
    }

    fn routing_rules(&self) -> Result<Vec<RoutingRule>> {
        self.read(|state| Ok(state.routing.all()))
    }

    fn routing_rule(&self, key: RouteId) -> Result<RoutingRule> {
        self.read(|state| Ok(state.routing.lookup(key)?.clone()))
    }

    fn save_routing_rule(&self, rule: RoutingRule) -> Result<()> {
        self.write(|state| {
            debug!("saving routing rule {}", rule);
            state.routing.save(rule);
            Ok(())
        })
    }

    fn remove_routing_rule(&self, key: RouteId) -> Result<()> {
        self.write(|state| {
            state.routing.delete(&[key]);
            Ok(())
        })
    }

    fn route_groups(&self) -> Result<Vec<RouteGroupInfo>> {
        self.read(|state| Ok(derive_route_groups(&state.routing)?))
    }

    fn restart(&self) -> Result<()> {
        info!("restart requested");
        Ok(())
    }

    fn exec(&self, command: &str) -> Result<Vec<u8>> {
        debug!("exec requested: {}", command);
        Ok(b"mock".to_vec())
    }

    fn update(&self) -> Result<bool> {
        Ok(false)
    }

    fn update_available(&self) -> Result<Option<Version>> {
        match &self.updater {
            Some(updater) => Ok(updater.check_available()?.filter(|v| !v.is_empty())),
            None => Ok(None),
        }
    }
}
