//! Server side of the control surface.
//!
//! Strips the configured prefix from a qualified method name, decodes the
//! params, calls the matching `VisorApi` operation and wraps the outcome in
//! a reply envelope. Errors keep their kind across the wire.

use super::wire::RpcResponse;
use super::{ChannelError, RpcChannel};
use crate::identity::PubKey;
use crate::routing::{RouteId, RoutingRule};
use crate::transport::TransportId;
use crate::visor::types::{AddTransportIn, AppLogsRequest, SetAutoStartIn, TransportsIn};
use crate::visor::VisorApi;
use crate::{Result, VisorError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RpcGateway {
    prefix: String,
    api: Arc<dyn VisorApi>,
}

impl RpcGateway {
    pub fn new(prefix: impl Into<String>, api: Arc<dyn VisorApi>) -> Self {
        Self {
            prefix: prefix.into(),
            api,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Handle one call. Never fails: errors travel inside the reply.
    pub fn handle(&self, method: &str, params: Value) -> RpcResponse {
        debug!("rpc call {}", method);
        match self.dispatch(method, params) {
            Ok(result) => RpcResponse::ok(result),
            Err(err) => {
                warn!("rpc call {} failed: {}", method, err);
                RpcResponse::err(err)
            }
        }
    }

    fn dispatch(&self, method: &str, params: Value) -> Result<Value> {
        let op = method
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .ok_or_else(|| VisorError::UnknownMethod(method.to_string()))?;
        let api = self.api.as_ref();

        match op {
            "Summary" => reply(api.summary()?),
            "Health" => reply(api.health()?),
            "Uptime" => reply(api.uptime()?),

            "Apps" => reply(api.apps()?),
            "StartApp" => {
                let name: String = decode(params)?;
                reply(api.start_app(&name)?)
            }
            "StopApp" => {
                let name: String = decode(params)?;
                reply(api.stop_app(&name)?)
            }
            "SetAutoStart" => {
                let req: SetAutoStartIn = decode(params)?;
                reply(api.set_auto_start(&req.app_name, req.auto_start)?)
            }
            "SetSocksPassword" => {
                let password: String = decode(params)?;
                reply(api.set_socks_password(&password)?)
            }
            "SetSocksClientPK" => {
                let pk: PubKey = decode(params)?;
                reply(api.set_socks_client_pk(pk)?)
            }
            "LogsSince" => {
                let req: AppLogsRequest = decode(params)?;
                reply(api.logs_since(req.time_stamp, &req.app_name)?)
            }

            "TransportTypes" => reply(api.transport_types()?),
            "Transports" => {
                let req: TransportsIn = decode(params)?;
                reply(api.transports(&req.filter_types, &req.filter_pub_keys, req.show_logs)?)
            }
            "Transport" => {
                let tid: TransportId = decode(params)?;
                reply(api.transport(tid)?)
            }
            "AddTransport" => {
                let req: AddTransportIn = decode(params)?;
                reply(api.add_transport(req.remote_pk, &req.tp_type, req.public, req.timeout)?)
            }
            "RemoveTransport" => {
                let tid: TransportId = decode(params)?;
                reply(api.remove_transport(tid)?)
            }
            "DiscoverTransportsByPK" => {
                let pk: PubKey = decode(params)?;
                reply(api.discover_transports_by_pk(pk)?)
            }
            "DiscoverTransportByID" => {
                let id: TransportId = decode(params)?;
                reply(api.discover_transport_by_id(id)?)
            }

            "RoutingRules" => reply(api.routing_rules()?),
            "RoutingRule" => {
                let key: RouteId = decode(params)?;
                reply(api.routing_rule(key)?)
            }
            "SaveRoutingRule" => {
                let rule: RoutingRule = decode(params)?;
                reply(api.save_routing_rule(rule)?)
            }
            "RemoveRoutingRule" => {
                let key: RouteId = decode(params)?;
                reply(api.remove_routing_rule(key)?)
            }
            "RouteGroups" => reply(api.route_groups()?),

            "Restart" => reply(api.restart()?),
            "Exec" => {
                let command: String = decode(params)?;
                reply(api.exec(&command)?)
            }
            "Update" => reply(api.update()?),
            "UpdateAvailable" => reply(api.update_available()?),

            _ => Err(VisorError::UnknownMethod(method.to_string())),
        }
    }
}

/// In-process channel: calls go straight to the gateway
impl RpcChannel for RpcGateway {
    fn call(&self, method: &str, params: Value) -> std::result::Result<RpcResponse, ChannelError> {
        Ok(self.handle(method, params))
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| VisorError::InvalidParams(e.to_string()))
}

fn reply<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| VisorError::Internal(e.to_string()))
}
