//! Transport inventory: the set of transports known to a visor.
//!
//! Summaries are kept in insertion order; every listing preserves it.

use super::summary::{make_transport_id, TransportId, TransportSummary};
use crate::identity::PubKey;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Transport not found: {0}")]
    NotFound(TransportId),
}

#[derive(Debug, Clone, Default)]
pub struct TransportInventory {
    transports: Vec<TransportSummary>,
}

impl TransportInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transport. Adding an existing (local, remote, type) triple
    /// returns the stored summary without inserting a duplicate.
    pub fn add(&mut self, local: PubKey, remote: PubKey, tp_type: &str) -> TransportSummary {
        let id = make_transport_id(&local, &remote, tp_type);
        if let Some(existing) = self.find(id) {
            debug!("Transport {} already known", id);
            return existing.clone();
        }

        let summary = TransportSummary::new(local, remote, tp_type);
        self.transports.push(summary.clone());
        summary
    }

    /// Insert a fully built summary (used when seeding simulations)
    pub fn insert(&mut self, summary: TransportSummary) {
        match self.transports.iter_mut().find(|tp| tp.id == summary.id) {
            Some(existing) => *existing = summary,
            None => self.transports.push(summary),
        }
    }

    pub fn remove(&mut self, id: TransportId) -> Result<TransportSummary, InventoryError> {
        let index = self
            .transports
            .iter()
            .position(|tp| tp.id == id)
            .ok_or(InventoryError::NotFound(id))?;
        Ok(self.transports.remove(index))
    }

    pub fn get(&self, id: TransportId) -> Result<TransportSummary, InventoryError> {
        self.find(id).cloned().ok_or(InventoryError::NotFound(id))
    }

    /// Filter transports by type and edge key.
    ///
    /// An empty filter matches everything. Within a filter any entry may
    /// match; a summary must pass both filters. With `include_logs` unset the
    /// returned copies carry no log.
    pub fn list(
        &self,
        types: &[String],
        pks: &[PubKey],
        include_logs: bool,
    ) -> Vec<TransportSummary> {
        self.transports
            .iter()
            .filter(|tp| types.is_empty() || types.iter().any(|t| *t == tp.tp_type))
            .filter(|tp| pks.is_empty() || pks.iter().any(|pk| tp.has_edge(pk)))
            .map(|tp| if include_logs { tp.clone() } else { tp.without_log() })
            .collect()
    }

    /// Add traffic to a transport's byte counters
    pub fn record(&mut self, id: TransportId, sent: u64, recv: u64) -> Result<(), InventoryError> {
        let tp = self
            .transports
            .iter_mut()
            .find(|tp| tp.id == id)
            .ok_or(InventoryError::NotFound(id))?;
        let log = tp.log.get_or_insert_with(Default::default);
        log.add_sent(sent);
        log.add_recv(recv);
        Ok(())
    }

    /// Distinct transport types present, in first-seen order
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for tp in &self.transports {
            if !types.contains(&tp.tp_type) {
                types.push(tp.tp_type.clone());
            }
        }
        types
    }

    pub fn len(&self) -> usize {
        self.transports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }

    /// Snapshot of all summaries, logs included
    pub fn all(&self) -> Vec<TransportSummary> {
        self.transports.clone()
    }

    fn find(&self, id: TransportId) -> Option<&TransportSummary> {
        self.transports.iter().find(|tp| tp.id == id)
    }
}
