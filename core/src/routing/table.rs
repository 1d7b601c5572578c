//! Routing table: owns routing rules keyed by route id.
//!
//! Ids are handed out by [`RoutingTable::reserve`] from a cursor that only
//! moves forward, so an id is never allocated twice during the lifetime of a
//! table. Rules are kept in a `BTreeMap`, which gives `all()` a stable order
//! (ascending id) and `count()` in O(1).

use super::rule::{RouteId, RoutingRule};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use thiserror::Error;

/// Errors raised by the routing table and route group derivation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("Routing rule not found: {0}")]
    RuleNotFound(RouteId),

    #[error("Route id space exhausted: requested {requested}, {available} left")]
    Exhausted { requested: usize, available: u64 },

    #[error("Consume rule {rule} references missing forward rule {next}")]
    DanglingReference { rule: RouteId, next: RouteId },
}

pub struct RoutingTable {
    rules: BTreeMap<RouteId, RoutingRule>,
    /// Last time each rule was saved or touched
    activity: HashMap<RouteId, Instant>,
    /// Highest id allocated or saved so far
    last_id: u32,
    /// Ids are allocated strictly below this value
    id_ceiling: u32,
}

impl RoutingTable {
    /// Create an empty table using the full 32-bit id space
    pub fn new() -> Self {
        Self::with_id_ceiling(u32::MAX)
    }

    /// Create an empty table that allocates ids strictly below `id_ceiling`
    pub fn with_id_ceiling(id_ceiling: u32) -> Self {
        Self {
            rules: BTreeMap::new(),
            activity: HashMap::new(),
            last_id: 0,
            id_ceiling,
        }
    }

    /// Number of ids that can still be reserved
    pub fn available_ids(&self) -> u64 {
        u64::from(self.id_ceiling.saturating_sub(1).saturating_sub(self.last_id))
    }

    /// Reserve `n` fresh route ids. Nothing is allocated on failure.
    pub fn reserve(&mut self, n: usize) -> Result<Vec<RouteId>, RoutingError> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let available = self.available_ids();
        if n as u64 > available {
            return Err(RoutingError::Exhausted {
                requested: n,
                available,
            });
        }

        let first = self.last_id + 1;
        // n <= available < u32::MAX, so the cast and addition cannot overflow
        self.last_id += n as u32;
        Ok((first..=self.last_id).map(RouteId).collect())
    }

    /// Insert or replace the rule stored at its own route id
    pub fn save(&mut self, rule: RoutingRule) {
        self.save_at(rule, Instant::now());
    }

    /// Insert or replace a rule, recording `now` as its last activity
    pub fn save_at(&mut self, rule: RoutingRule, now: Instant) {
        let id = rule.route_id();
        // Keep the allocation cursor ahead of every stored id
        self.last_id = self.last_id.max(id.0);
        self.activity.insert(id, now);
        self.rules.insert(id, rule);
    }

    pub fn lookup(&self, id: RouteId) -> Result<&RoutingRule, RoutingError> {
        self.rules.get(&id).ok_or(RoutingError::RuleNotFound(id))
    }

    pub fn contains(&self, id: RouteId) -> bool {
        self.rules.contains_key(&id)
    }

    /// Remove rules by id. Unknown ids are ignored. Returns how many were removed.
    pub fn delete(&mut self, ids: &[RouteId]) -> usize {
        let mut removed = 0;
        for id in ids {
            self.activity.remove(id);
            if self.rules.remove(id).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Snapshot of every rule in ascending id order
    pub fn all(&self) -> Vec<RoutingRule> {
        self.rules.values().cloned().collect()
    }

    /// Iterate rules in ascending id order without copying
    pub fn iter(&self) -> impl Iterator<Item = &RoutingRule> {
        self.rules.values()
    }

    pub fn count(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Refresh a rule's activity so it does not expire
    pub fn touch(&mut self, id: RouteId, now: Instant) -> Result<(), RoutingError> {
        if !self.rules.contains_key(&id) {
            return Err(RoutingError::RuleNotFound(id));
        }
        self.activity.insert(id, now);
        Ok(())
    }

    /// Remove rules idle for longer than their keep-alive. Returns the removed ids.
    pub fn collect_expired(&mut self, now: Instant) -> Vec<RouteId> {
        let expired: Vec<RouteId> = self
            .rules
            .values()
            .filter(|rule| {
                self.activity
                    .get(&rule.route_id())
                    .map(|last| now.saturating_duration_since(*last) > rule.keep_alive())
                    .unwrap_or(true)
            })
            .map(|rule| rule.route_id())
            .collect();

        self.delete(&expired);
        expired
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}
