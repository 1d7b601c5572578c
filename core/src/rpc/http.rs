// Blocking HTTP channel to a remote visor

use super::wire::{RpcRequest, RpcResponse};
use super::{ChannelError, RpcChannel, RPC_PATH};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// Default time allowed for one call, connect included
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts each call as JSON to `http://<addr>/rpc`
pub struct HttpChannel {
    agent: ureq::Agent,
    url: String,
}

impl HttpChannel {
    pub fn new(addr: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            url: format!("http://{}{}", addr, RPC_PATH),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RpcChannel for HttpChannel {
    fn call(&self, method: &str, params: Value) -> Result<RpcResponse, ChannelError> {
        let body = serde_json::to_string(&RpcRequest::new(method, params))
            .map_err(|e| ChannelError::Codec(e.to_string()))?;

        debug!("POST {} {}", self.url, method);
        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(&body)
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    ChannelError::Status(code, resp.into_string().unwrap_or_default())
                }
                ureq::Error::Transport(t) => ChannelError::Io(t.to_string()),
            })?;

        let text = response
            .into_string()
            .map_err(|e| ChannelError::Io(e.to_string()))?;
        trace!("{} replied {} bytes", method, text.len());

        serde_json::from_str(&text).map_err(|e| ChannelError::Codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        let channel = HttpChannel::new("127.0.0.1:3435", DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(channel.url(), "http://127.0.0.1:3435/rpc");
    }

    #[test]
    fn test_unreachable_node_is_io_error() {
        // Grab a free port, then release it so nothing listens there
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let channel = HttpChannel::new(&addr.to_string(), Duration::from_millis(500));
        let err = channel.call("visor.Health", Value::Null).unwrap_err();
        assert!(matches!(err, ChannelError::Io(_)));
    }
}
