//! Control surface backend that forwards every call to a remote visor.
//!
//! Each operation becomes exactly one `prefix.Method` exchange on the
//! channel. Errors reported by the remote are handed back with their kind
//! intact; failures of the exchange itself surface as `VisorError::Channel`.

use super::api::VisorApi;
use super::types::{
    AddTransportIn, AppLogsRequest, AppState, HealthInfo, SetAutoStartIn, Summary, TransportsIn,
};
use super::updater::Version;
use crate::identity::PubKey;
use crate::routing::{RouteGroupInfo, RouteId, RoutingRule};
use crate::rpc::{qualify, ChannelError, RpcChannel};
use crate::transport::{EntryWithStatus, TransportId, TransportSummary};
use crate::{Result, VisorError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, SystemTime};

pub struct RpcClient<C> {
    channel: C,
    prefix: String,
}

impl<C: RpcChannel> RpcClient<C> {
    pub fn new(channel: C, prefix: impl Into<String>) -> Self {
        Self {
            channel,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn call<A, R>(&self, method: &str, args: &A) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let params =
            serde_json::to_value(args).map_err(|e| ChannelError::Codec(e.to_string()))?;
        let result = self
            .channel
            .call(&qualify(&self.prefix, method), params)?
            .into_result()?;
        serde_json::from_value(result)
            .map_err(|e| VisorError::Channel(ChannelError::Codec(e.to_string())))
    }
}

impl<C: RpcChannel> VisorApi for RpcClient<C> {
    fn summary(&self) -> Result<Summary> {
        self.call("Summary", &())
    }

    fn health(&self) -> Result<HealthInfo> {
        self.call("Health", &())
    }

    fn uptime(&self) -> Result<f64> {
        self.call("Uptime", &())
    }

    fn apps(&self) -> Result<Vec<AppState>> {
        self.call("Apps", &())
    }

    fn start_app(&self, app_name: &str) -> Result<()> {
        self.call("StartApp", app_name)
    }

    fn stop_app(&self, app_name: &str) -> Result<()> {
        self.call("StopApp", app_name)
    }

    fn set_auto_start(&self, app_name: &str, auto_start: bool) -> Result<()> {
        let req = SetAutoStartIn {
            app_name: app_name.to_string(),
            auto_start,
        };
        self.call("SetAutoStart", &req)
    }

    fn set_socks_password(&self, password: &str) -> Result<()> {
        self.call("SetSocksPassword", password)
    }

    fn set_socks_client_pk(&self, pk: PubKey) -> Result<()> {
        self.call("SetSocksClientPK", &pk)
    }

    fn logs_since(&self, timestamp: SystemTime, app_name: &str) -> Result<Vec<String>> {
        let req = AppLogsRequest {
            time_stamp: timestamp,
            app_name: app_name.to_string(),
        };
        self.call("LogsSince", &req)
    }

    fn transport_types(&self) -> Result<Vec<String>> {
        self.call("TransportTypes", &())
    }

    fn transports(
        &self,
        types: &[String],
        pks: &[PubKey],
        logs: bool,
    ) -> Result<Vec<TransportSummary>> {
        let req = TransportsIn {
            filter_types: types.to_vec(),
            filter_pub_keys: pks.to_vec(),
            show_logs: logs,
        };
        self.call("Transports", &req)
    }

    fn transport(&self, tid: TransportId) -> Result<TransportSummary> {
        self.call("Transport", &tid)
    }

    fn add_transport(
        &self,
        remote: PubKey,
        tp_type: &str,
        public: bool,
        timeout: Duration,
    ) -> Result<TransportSummary> {
        let req = AddTransportIn {
            remote_pk: remote,
            tp_type: tp_type.to_string(),
            public,
            timeout,
        };
        self.call("AddTransport", &req)
    }

    fn remove_transport(&self, tid: TransportId) -> Result<()> {
        self.call("RemoveTransport", &tid)
    }

    fn discover_transports_by_pk(&self, pk: PubKey) -> Result<Vec<EntryWithStatus>> {
        self.call("DiscoverTransportsByPK", &pk)
    }

    fn discover_transport_by_id(&self, id: TransportId) -> Result<EntryWithStatus> {
        self.call("DiscoverTransportByID", &id)
    }

    fn routing_rules(&self) -> Result<Vec<RoutingRule>> {
        self.call("RoutingRules", &())
    }

    fn routing_rule(&self, key: RouteId) -> Result<RoutingRule> {
        self.call("RoutingRule", &key)
    }

    fn save_routing_rule(&self, rule: RoutingRule) -> Result<()> {
        self.call("SaveRoutingRule", &rule)
    }

    fn remove_routing_rule(&self, key: RouteId) -> Result<()> {
        self.call("RemoveRoutingRule", &key)
    }

    fn route_groups(&self) -> Result<Vec<RouteGroupInfo>> {
        self.call("RouteGroups", &())
    }

    fn restart(&self) -> Result<()> {
        self.call("Restart", &())
    }

    fn exec(&self, command: &str) -> Result<Vec<u8>> {
        self.call("Exec", command)
    }

    fn update(&self) -> Result<bool> {
        self.call("Update", &())
    }

    fn update_available(&self) -> Result<Option<Version>> {
        let available: Option<Version> = self.call("UpdateAvailable", &())?;
        Ok(available.filter(|v| !v.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{MockRpcChannel, RpcResponse};
    use mockall::predicate::{always, eq};
    use serde_json::{json, Value};

    #[test]
    fn test_qualifies_method_with_prefix() {
        let mut channel = MockRpcChannel::new();
        channel
            .expect_call()
            .with(eq("node7.Uptime"), eq(Value::Null))
            .times(1)
            .returning(|_, _| Ok(RpcResponse::ok(json!(12.5))));

        let client = RpcClient::new(channel, "node7");
        assert_eq!(client.uptime().unwrap(), 12.5);
    }

    #[test]
    fn test_passes_arguments_through() {
        let mut channel = MockRpcChannel::new();
        channel
            .expect_call()
            .withf(|method, params| {
                method == "visor.SetAutoStart"
                    && params == &json!({ "app_name": "foo", "auto_start": true })
            })
            .times(1)
            .returning(|_, _| Ok(RpcResponse::ok(Value::Null)));

        let client = RpcClient::new(channel, "visor");
        client.set_auto_start("foo", true).unwrap();
    }

    #[test]
    fn test_remote_error_kind_is_preserved() {
        let mut channel = MockRpcChannel::new();
        channel.expect_call().with(always(), always()).returning(|_, _| {
            Ok(RpcResponse::err(VisorError::NotFound(
                "transport of id 'x'".into(),
            )))
        });

        let client = RpcClient::new(channel, "visor");
        let err = client.transport(TransportId::nil()).unwrap_err();
        assert_eq!(err, VisorError::NotFound("transport of id 'x'".into()));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_channel_failure_is_retryable() {
        let mut channel = MockRpcChannel::new();
        channel
            .expect_call()
            .returning(|_, _| Err(ChannelError::Io("connection reset".into())));

        let client = RpcClient::new(channel, "visor");
        let err = client.summary().unwrap_err();
        assert_eq!(
            err,
            VisorError::Channel(ChannelError::Io("connection reset".into()))
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_undecodable_result_is_codec_error() {
        let mut channel = MockRpcChannel::new();
        channel
            .expect_call()
            .returning(|_, _| Ok(RpcResponse::ok(json!("not a list"))));

        let client = RpcClient::new(channel, "visor");
        let err = client.apps().unwrap_err();
        assert!(matches!(err, VisorError::Channel(ChannelError::Codec(_))));
    }

    #[test]
    fn test_empty_version_means_no_update() {
        let mut channel = MockRpcChannel::new();
        channel.expect_call().returning(|_, _| {
            Ok(RpcResponse::ok(json!({ "version": "", "release_url": "" })))
        });

        let client = RpcClient::new(channel, "visor");
        assert_eq!(client.update_available().unwrap(), None);
    }
}
