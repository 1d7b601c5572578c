//! The visor control surface and its backends
//!
//! - `api`: the `VisorApi` trait every backend implements
//! - `rpc_client`: forwards each call to a remote visor
//! - `mock`: simulates a visor in memory
//! - `logstore`, `updater`: collaborator seams used by the simulation

pub mod api;
pub mod logstore;
pub mod mock;
pub mod rpc_client;
pub mod types;
pub mod updater;

pub use api::VisorApi;
pub use logstore::{LogStore, MemoryLogStore};
pub use mock::{MockVisor, MOCK_TRANSPORT_TYPES};
pub use rpc_client::RpcClient;
pub use types::{
    AppState, AppStatus, BuildInfo, HealthInfo, Summary, SUPPORTED_PROTOCOL_VERSION,
};
pub use updater::{FixedUpdateChecker, UpdateChecker, Version};
