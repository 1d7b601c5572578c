// Integration tests for the control surface backends
//
// The same scripted session runs against the in-memory visor directly and
// through the forwarding client, and both must agree. Error kinds must
// survive the trip through the wire envelope.

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use uuid::Uuid;
use visor_core::routing::{Port, RouteId, RoutingRule, DEFAULT_ROUTE_KEEP_ALIVE};
use visor_core::rpc::{ChannelError, RpcChannel, RpcResponse};
use visor_core::transport::{DiscoveryEntry, EntryWithStatus, MemoryDiscovery};
use visor_core::visor::{FixedUpdateChecker, MemoryLogStore, Version};
use visor_core::{MockVisor, PubKey, RpcClient, RpcGateway, VisorApi, VisorError};

fn make_pk(n: u8) -> PubKey {
    PubKey::from_bytes([n; 32])
}

fn loopback(visor: MockVisor) -> RpcClient<RpcGateway> {
    RpcClient::new(RpcGateway::new("visor", Arc::new(visor)), "visor")
}

/// Runs a session of mutations and returns what the backend reports after it
fn session(api: &dyn VisorApi, rule_id: RouteId) -> (usize, usize, Vec<RoutingRule>) {
    api.start_app("foo.v1.0").unwrap();
    api.set_auto_start("bar.v2.0", true).unwrap();

    let tp = api
        .add_transport(make_pk(2), "native", true, Duration::from_secs(5))
        .unwrap();
    api.add_transport(make_pk(3), "messaging", false, Duration::from_secs(5))
        .unwrap();
    api.remove_transport(tp.id).unwrap();

    api.save_routing_rule(RoutingRule::consume(
        DEFAULT_ROUTE_KEEP_ALIVE,
        rule_id,
        make_pk(1),
        make_pk(3),
        Port(1),
        Port(2),
        RouteId(42),
    ))
    .unwrap();

    let summary = api.summary().unwrap();
    (
        summary.transports.len(),
        summary.routes_count,
        api.routing_rules().unwrap(),
    )
}

#[test]
fn test_backends_agree() {
    let direct = MockVisor::new(make_pk(1));
    let rule_id = direct.reserve_route_ids(1).unwrap()[0];
    let direct_result = session(&direct, rule_id);

    let remote_visor = MockVisor::new(make_pk(1));
    let rule_id = remote_visor.reserve_route_ids(1).unwrap()[0];
    let client = loopback(remote_visor.clone());
    let remote_result = session(&client, rule_id);

    assert_eq!(direct_result, remote_result);
    assert_eq!(remote_result.0, 1);
    assert_eq!(remote_result.1, 1);

    // The forwarding client mutated the visor behind the gateway
    assert_eq!(remote_visor.apps().unwrap(), client.apps().unwrap());
}

#[test]
fn test_summary_roundtrips_through_envelope() {
    let visor = MockVisor::new(make_pk(1));
    visor
        .add_transport(make_pk(2), "native", false, Duration::ZERO)
        .unwrap();
    let client = loopback(visor.clone());

    assert_eq!(client.summary().unwrap(), visor.summary().unwrap());
}

#[test]
fn test_error_kinds_cross_the_wire() {
    let client = loopback(MockVisor::new(make_pk(1)));

    let not_found = client.transport(Uuid::from_bytes([1; 16])).unwrap_err();
    assert!(matches!(not_found, VisorError::NotFound(_)));
    assert!(!not_found.is_retryable());

    let not_impl = client.discover_transports_by_pk(make_pk(2)).unwrap_err();
    assert!(matches!(not_impl, VisorError::NotImplemented(_)));
    assert!(!not_impl.is_retryable());

    let missing_rule = client.routing_rule(RouteId(77)).unwrap_err();
    assert!(matches!(missing_rule, VisorError::NotFound(_)));
}

/// A channel whose peer is gone
struct DeadChannel;

impl RpcChannel for DeadChannel {
    fn call(&self, _method: &str, _params: Value) -> Result<RpcResponse, ChannelError> {
        Err(ChannelError::Io("connection refused".into()))
    }
}

#[test]
fn test_channel_failure_is_distinguishable() {
    let client = RpcClient::new(DeadChannel, "visor");
    let err = client.health().unwrap_err();
    assert!(matches!(err, VisorError::Channel(ChannelError::Io(_))));
    assert!(err.is_retryable());
}

#[test]
fn test_mismatched_prefix_is_unknown_method() {
    let gateway = RpcGateway::new("visor", Arc::new(MockVisor::new(make_pk(1))));
    let client = RpcClient::new(gateway, "node");
    assert!(matches!(client.uptime(), Err(VisorError::UnknownMethod(_))));
}

#[test]
fn test_collaborators_through_client() {
    let discovery = Arc::new(MemoryDiscovery::new());
    let entry = DiscoveryEntry::new(make_pk(1), make_pk(5), "native", true);
    let id = entry.id;
    discovery.register(EntryWithStatus {
        entry,
        is_up: true,
        registered: 10,
        statuses: [true, false],
    });

    let logs = Arc::new(MemoryLogStore::new());
    logs.store(UNIX_EPOCH + Duration::from_secs(100), "started");

    let version = Version {
        version: "2.0.0".into(),
        release_url: "https://example.org/2.0.0".into(),
    };
    let visor = MockVisor::new(make_pk(1))
        .with_discovery(discovery)
        .with_log_store(logs)
        .with_update_checker(Arc::new(FixedUpdateChecker::new(Some(version.clone()))));
    let client = loopback(visor);

    let found = client.discover_transports_by_pk(make_pk(5)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(client.discover_transport_by_id(id).unwrap().statuses, [true, false]);

    assert_eq!(
        client.logs_since(UNIX_EPOCH, "foo.v1.0").unwrap(),
        vec!["started"]
    );
    assert_eq!(client.update_available().unwrap(), Some(version));
    assert_eq!(client.exec("uname").unwrap(), b"mock".to_vec());
    assert!(!client.update().unwrap());
}

#[test]
fn test_filters_through_client() {
    let visor = MockVisor::new(make_pk(1));
    let a = visor
        .add_transport(make_pk(2), "native", false, Duration::ZERO)
        .unwrap();
    visor
        .add_transport(make_pk(3), "messaging", false, Duration::ZERO)
        .unwrap();
    visor.record_traffic(a.id, 5, 6).unwrap();
    let client = loopback(visor);

    let native = client.transports(&["native".to_string()], &[], true).unwrap();
    assert_eq!(native.len(), 1);
    assert_eq!(native[0].id, a.id);
    assert!(native[0].log.is_some());

    let by_pk = client.transports(&[], &[make_pk(3)], false).unwrap();
    assert_eq!(by_pk.len(), 1);
    assert!(by_pk[0].log.is_none());

    let none = client
        .transports(&["native".to_string()], &[make_pk(3)], false)
        .unwrap();
    assert!(none.is_empty());
}
