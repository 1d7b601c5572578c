//! Route groups: consume rules paired with the head of their outbound path.
//!
//! Groups are never stored. They are recomputed from the table on demand and
//! the derivation fails as a whole on the first consume rule whose next hop
//! does not resolve to a forward rule.

use super::rule::{ConsumeRule, ForwardRule, RoutingRule};
use super::table::{RoutingError, RoutingTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteGroupInfo {
    pub consume_rule: ConsumeRule,
    pub fwd_rule: ForwardRule,
}

/// Pair every consume rule in `table` with the forward rule it references.
pub fn derive_route_groups(table: &RoutingTable) -> Result<Vec<RouteGroupInfo>, RoutingError> {
    let mut groups = Vec::new();

    for rule in table.iter() {
        let RoutingRule::Consume(consume) = rule else {
            continue;
        };

        let dangling = RoutingError::DanglingReference {
            rule: consume.route_id,
            next: consume.next_route_id,
        };
        let fwd = match table.lookup(consume.next_route_id) {
            Ok(RoutingRule::Forward(fwd)) => fwd,
            // A consume rule pointing at another consume rule has no outbound hop
            Ok(RoutingRule::Consume(_)) | Err(_) => return Err(dangling),
        };

        groups.push(RouteGroupInfo {
            consume_rule: consume.clone(),
            fwd_rule: fwd.clone(),
        });
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PubKey;
    use crate::routing::rule::{Port, RouteDescriptor, RouteId};
    use std::time::Duration;
    use uuid::Uuid;

    fn forward(id: RouteId, next: RouteId) -> RoutingRule {
        RoutingRule::forward(
            Duration::from_secs(30),
            id,
            next,
            Uuid::new_v4(),
            RouteDescriptor::default(),
        )
    }

    fn consume(id: RouteId, next: RouteId) -> RoutingRule {
        RoutingRule::consume(
            Duration::from_secs(30),
            id,
            PubKey::from_bytes([1; 32]),
            PubKey::from_bytes([2; 32]),
            Port(8),
            Port(9),
            next,
        )
    }

    #[test]
    fn test_empty_table_has_no_groups() {
        let rt = RoutingTable::new();
        assert!(derive_route_groups(&rt).unwrap().is_empty());
    }

    #[test]
    fn test_pairs_consume_with_forward() {
        let mut rt = RoutingTable::new();
        let f = forward(RouteId(5), RouteId(6));
        let c = consume(RouteId(7), RouteId(5));
        rt.save(f.clone());
        rt.save(c.clone());

        let groups = derive_route_groups(&rt).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(&groups[0].consume_rule, c.as_consume().unwrap());
        assert_eq!(&groups[0].fwd_rule, f.as_forward().unwrap());
    }

    #[test]
    fn test_only_one_hop_is_resolved() {
        let mut rt = RoutingTable::new();
        let ids = rt.reserve(2).unwrap();
        rt.save(forward(ids[1], RouteId(999)));
        rt.save(consume(ids[0], ids[1]));

        let groups = derive_route_groups(&rt).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].consume_rule.route_id, ids[0]);
        assert_eq!(groups[0].fwd_rule.route_id, ids[1]);
    }

    #[test]
    fn test_deleted_forward_is_dangling() {
        let mut rt = RoutingTable::new();
        rt.save(forward(RouteId(5), RouteId(6)));
        rt.save(consume(RouteId(7), RouteId(5)));
        rt.delete(&[RouteId(5)]);

        let err = derive_route_groups(&rt).unwrap_err();
        assert_eq!(
            err,
            RoutingError::DanglingReference {
                rule: RouteId(7),
                next: RouteId(5)
            }
        );
    }

    #[test]
    fn test_consume_to_consume_is_dangling() {
        let mut rt = RoutingTable::new();
        rt.save(consume(RouteId(1), RouteId(2)));
        rt.save(consume(RouteId(2), RouteId(1)));

        assert!(matches!(
            derive_route_groups(&rt),
            Err(RoutingError::DanglingReference { .. })
        ));
    }

    #[test]
    fn test_derivation_does_not_mutate() {
        let mut rt = RoutingTable::new();
        rt.save(forward(RouteId(1), RouteId(2)));
        rt.save(consume(RouteId(3), RouteId(1)));
        let before = rt.all();

        derive_route_groups(&rt).unwrap();
        assert_eq!(rt.all(), before);
    }
}
