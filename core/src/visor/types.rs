//! Data carried across the control surface

use crate::identity::PubKey;
use crate::routing::Port;
use crate::transport::TransportSummary;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime};

/// App protocol version this control surface speaks
pub const SUPPORTED_PROTOCOL_VERSION: &str = "0.1.0";

/// HTTP status reported for a healthy external service
pub const STATUS_OK: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AppStatus {
    #[default]
    Stopped,
    Running,
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppStatus::Stopped => f.pad("stopped"),
            AppStatus::Running => f.pad("running"),
        }
    }
}

/// An app registered with a visor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub name: String,
    pub auto_start: bool,
    pub port: Port,
    #[serde(default)]
    pub status: AppStatus,
}

impl AppState {
    pub fn new(name: impl Into<String>, auto_start: bool, port: u16) -> Self {
        Self {
            name: name.into(),
            auto_start,
            port: Port(port),
            status: AppStatus::Stopped,
        }
    }
}

/// Status codes of the services a visor depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthInfo {
    pub transport_discovery: u16,
    pub route_finder: u16,
    pub setup_node: u16,
}

impl HealthInfo {
    pub fn all_ok() -> Self {
        Self {
            transport_discovery: STATUS_OK,
            route_finder: STATUS_OK,
            setup_node: STATUS_OK,
        }
    }

    pub fn is_healthy(&self) -> bool {
        [self.transport_discovery, self.route_finder, self.setup_node]
            .iter()
            .all(|code| *code == STATUS_OK)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
    pub date: String,
}

impl BuildInfo {
    /// Build metadata of this binary. Commit and date come from the
    /// `VISOR_BUILD_COMMIT` / `VISOR_BUILD_DATE` variables at compile time.
    pub fn get() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("VISOR_BUILD_COMMIT").unwrap_or("unknown").to_string(),
            date: option_env!("VISOR_BUILD_DATE").unwrap_or("unknown").to_string(),
        }
    }
}

/// Point-in-time view of a visor. Always handed out as an owned copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub pub_key: PubKey,
    pub build_info: BuildInfo,
    pub app_protocol_version: String,
    pub apps: Vec<AppState>,
    pub transports: Vec<TransportSummary>,
    pub routes_count: usize,
}

// Request payloads of the operations that take more than one argument.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAutoStartIn {
    pub app_name: String,
    pub auto_start: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLogsRequest {
    pub time_stamp: SystemTime,
    pub app_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransportsIn {
    #[serde(default)]
    pub filter_types: Vec<String>,
    #[serde(default)]
    pub filter_pub_keys: Vec<PubKey>,
    #[serde(default)]
    pub show_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTransportIn {
    pub remote_pk: PubKey,
    pub tp_type: String,
    pub public: bool,
    pub timeout: Duration,
}
