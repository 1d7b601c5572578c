// Integration tests for route group derivation
//
// Rules are saved through the control surface and groups derived from the
// same table, the way a route setup node would drive a visor.

use std::time::Duration;
use uuid::Uuid;
use visor_core::routing::{
    derive_route_groups, Port, RouteDescriptor, RouteId, RoutingRule, RoutingTable,
};
use visor_core::{MockVisor, PubKey, VisorApi, VisorError};

fn make_pk(n: u8) -> PubKey {
    PubKey::from_bytes([n; 32])
}

fn forward(id: RouteId, next: RouteId, keep_alive: Duration) -> RoutingRule {
    RoutingRule::forward(
        keep_alive,
        id,
        next,
        Uuid::from_bytes([4; 16]),
        RouteDescriptor {
            src_pk: make_pk(1),
            dst_pk: make_pk(2),
            src_port: Port(3),
            dst_port: Port(4),
        },
    )
}

fn consume(id: RouteId, next: RouteId) -> RoutingRule {
    RoutingRule::consume(
        Duration::from_secs(30),
        id,
        make_pk(1),
        make_pk(2),
        Port(3),
        Port(4),
        next,
    )
}

#[test]
fn test_one_hop_resolution_ignores_downstream_dangling_id() {
    let visor = MockVisor::new(make_pk(1));

    let ids = visor.reserve_route_ids(2).unwrap();
    let (r0, r1) = (ids[0], ids[1]);
    assert_ne!(r0, r1);

    let fwd = forward(r1, RouteId(999), Duration::from_secs(30));
    let cons = consume(r0, r1);
    visor.save_routing_rule(fwd.clone()).unwrap();
    visor.save_routing_rule(cons.clone()).unwrap();

    let groups = visor.route_groups().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(Some(&groups[0].consume_rule), cons.as_consume());
    assert_eq!(Some(&groups[0].fwd_rule), fwd.as_forward());

    println!("✓ Route group resolves one hop: {} -> {}", r0, r1);
}

#[test]
fn test_deleted_forward_surfaces_dangling_reference() {
    let mut table = RoutingTable::new();
    table.save(forward(RouteId(5), RouteId(6), Duration::from_secs(60)));
    table.save(consume(RouteId(9), RouteId(5)));

    let groups = derive_route_groups(&table).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].consume_rule.route_id, RouteId(9));
    assert_eq!(groups[0].fwd_rule.route_id, RouteId(5));

    table.delete(&[RouteId(5)]);
    let visor = MockVisor::with_table(make_pk(1), table);

    assert_eq!(
        visor.route_groups(),
        Err(VisorError::DanglingReference {
            rule: RouteId(9),
            next: RouteId(5)
        })
    );
}

#[test]
fn test_groups_follow_consume_order() {
    let visor = MockVisor::new(make_pk(1));
    let ids = visor.reserve_route_ids(6).unwrap();

    // Consume rules at ids[0], ids[2], ids[4] pointing at the next id
    for pair in ids.chunks(2) {
        visor
            .save_routing_rule(forward(pair[1], RouteId(0), Duration::from_secs(30)))
            .unwrap();
        visor.save_routing_rule(consume(pair[0], pair[1])).unwrap();
    }

    let groups = visor.route_groups().unwrap();
    let consume_ids: Vec<RouteId> = groups.iter().map(|g| g.consume_rule.route_id).collect();
    assert_eq!(consume_ids, vec![ids[0], ids[2], ids[4]]);
    assert_eq!(visor.summary().unwrap().routes_count, 6);
}

#[test]
fn test_forward_only_table_has_no_groups() {
    let visor = MockVisor::new(make_pk(1));
    let ids = visor.reserve_route_ids(1).unwrap();
    visor
        .save_routing_rule(forward(ids[0], RouteId(7), Duration::from_secs(30)))
        .unwrap();

    assert!(visor.route_groups().unwrap().is_empty());
}
