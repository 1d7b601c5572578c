//! Transport discovery: the directory a visor registers its transports with.
//!
//! The directory itself lives outside this crate. `TransportDiscovery` is the
//! seam the control surface calls through; `MemoryDiscovery` is an in-memory
//! directory for simulations and tests.

use super::summary::{make_transport_id, TransportId};
use crate::identity::PubKey;
use crate::{Result, VisorError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A transport as registered in the discovery directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryEntry {
    pub id: TransportId,
    /// Edge keys, ordered bytewise
    pub edges: [PubKey; 2],
    #[serde(rename = "type")]
    pub tp_type: String,
    pub public: bool,
}

impl DiscoveryEntry {
    pub fn new(a: PubKey, b: PubKey, tp_type: impl Into<String>, public: bool) -> Self {
        let tp_type = tp_type.into();
        let edges = if a <= b { [a, b] } else { [b, a] };
        Self {
            id: make_transport_id(&a, &b, &tp_type),
            edges,
            tp_type,
            public,
        }
    }

    pub fn has_edge(&self, pk: &PubKey) -> bool {
        self.edges.contains(pk)
    }
}

/// Directory entry plus the liveness reported by each edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryWithStatus {
    pub entry: DiscoveryEntry,
    pub is_up: bool,
    /// Registration time, unix seconds
    pub registered: i64,
    /// Status reported by `edges[0]` and `edges[1]`
    pub statuses: [bool; 2],
}

pub trait TransportDiscovery: Send + Sync {
    /// All entries that have `pk` as an edge
    fn entries_by_pk(&self, pk: &PubKey) -> Result<Vec<EntryWithStatus>>;

    /// The entry registered under `id`
    fn entry_by_id(&self, id: TransportId) -> Result<EntryWithStatus>;
}

#[derive(Default)]
pub struct MemoryDiscovery {
    entries: RwLock<HashMap<TransportId, EntryWithStatus>>,
}

impl MemoryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, entry: EntryWithStatus) {
        self.entries.write().insert(entry.entry.id, entry);
    }
}

impl TransportDiscovery for MemoryDiscovery {
    fn entries_by_pk(&self, pk: &PubKey) -> Result<Vec<EntryWithStatus>> {
        let mut found: Vec<EntryWithStatus> = self
            .entries
            .read()
            .values()
            .filter(|e| e.entry.has_edge(pk))
            .cloned()
            .collect();
        found.sort_by_key(|e| e.registered);
        Ok(found)
    }

    fn entry_by_id(&self, id: TransportId) -> Result<EntryWithStatus> {
        self.entries
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| VisorError::NotFound(format!("discovery entry of id '{}'", id)))
    }
}
