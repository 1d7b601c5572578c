//! Request/reply plumbing between a control surface client and a visor.
//!
//! - `wire`: the request and reply envelopes
//! - `http`: blocking HTTP channel to a remote visor
//! - `gateway`: dispatches named calls onto a `VisorApi`
//! - `httputil`: helpers shared by HTTP front ends

pub mod gateway;
pub mod http;
pub mod httputil;
pub mod wire;

pub use gateway::RpcGateway;
pub use http::HttpChannel;
pub use wire::{RpcRequest, RpcResponse};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Path a visor serves its control surface on
pub const RPC_PATH: &str = "/rpc";

/// Prefix qualifying every method name unless configured otherwise
pub const DEFAULT_RPC_PREFIX: &str = "visor";

/// Failures of the exchange itself, as opposed to errors the remote reported
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelError {
    #[error("I/O failure: {0}")]
    Io(String),

    #[error("Codec failure: {0}")]
    Codec(String),

    #[error("Unexpected HTTP status {0}: {1}")]
    Status(u16, String),
}

/// A channel carrying one named call and bringing back its reply envelope
#[cfg_attr(test, mockall::automock)]
pub trait RpcChannel: Send + Sync {
    fn call(&self, method: &str, params: Value) -> Result<RpcResponse, ChannelError>;
}

impl<T: RpcChannel + ?Sized> RpcChannel for Arc<T> {
    fn call(&self, method: &str, params: Value) -> Result<RpcResponse, ChannelError> {
        (**self).call(method, params)
    }
}

/// Fully qualified method name
pub fn qualify(prefix: &str, method: &str) -> String {
    format!("{}.{}", prefix, method)
}
