// Transports: summaries, the inventory and the discovery seam

pub mod discovery;
pub mod inventory;
pub mod summary;

pub use discovery::{DiscoveryEntry, EntryWithStatus, MemoryDiscovery, TransportDiscovery};
pub use inventory::{InventoryError, TransportInventory};
pub use summary::{make_transport_id, LogEntry, TransportId, TransportSummary};
