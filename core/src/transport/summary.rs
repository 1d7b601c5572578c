//! Transport summaries and deterministic transport ids

use crate::identity::PubKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// 16-byte transport identifier
pub type TransportId = Uuid;

/// Derive the id of the transport of type `tp_type` between two nodes.
///
/// The keys are ordered before hashing, so `make_transport_id(a, b, t)` and
/// `make_transport_id(b, a, t)` are equal.
pub fn make_transport_id(a: &PubKey, b: &PubKey, tp_type: &str) -> TransportId {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

    let mut hasher = Sha256::new();
    hasher.update(lo.as_bytes());
    hasher.update(hi.as_bytes());
    hasher.update(tp_type.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

/// Byte counters of a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogEntry {
    pub recv_bytes: u64,
    pub sent_bytes: u64,
}

impl LogEntry {
    pub fn add_recv(&mut self, n: u64) {
        self.recv_bytes = self.recv_bytes.saturating_add(n);
    }

    pub fn add_sent(&mut self, n: u64) {
        self.sent_bytes = self.sent_bytes.saturating_add(n);
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recv: {}B, sent: {}B", self.recv_bytes, self.sent_bytes)
    }
}

/// A link between the local node and a remote one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSummary {
    pub id: TransportId,
    pub local: PubKey,
    pub remote: PubKey,
    #[serde(rename = "type")]
    pub tp_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogEntry>,
}

impl TransportSummary {
    /// Summary with a derived id and an empty log
    pub fn new(local: PubKey, remote: PubKey, tp_type: impl Into<String>) -> Self {
        let tp_type = tp_type.into();
        Self {
            id: make_transport_id(&local, &remote, &tp_type),
            local,
            remote,
            tp_type,
            log: Some(LogEntry::default()),
        }
    }

    /// Whether `pk` is one of the two edges of this transport
    pub fn has_edge(&self, pk: &PubKey) -> bool {
        self.local == *pk || self.remote == *pk
    }

    /// Copy of this summary with the log stripped
    pub fn without_log(&self) -> Self {
        Self {
            log: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for TransportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransportSummary {{ id: {}, type: {}, local: {}, remote: {} }}",
            self.id, self.tp_type, self.local, self.remote
        )
    }
}
