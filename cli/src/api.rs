// HTTP front end of a visor's control surface
//
// `visor-cli serve` exposes the RPC gateway at POST /rpc. Every call gets a
// 200 reply carrying the result or the error; other paths get 404.
// `?pretty=on` indents the reply.

use anyhow::{Context, Result};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use visor_core::rpc::httputil::{bool_from_query, query_param};
use visor_core::rpc::{RpcGateway, RpcRequest, RPC_PATH};

/// Bind the RPC server. Returns the bound address and the future running it.
pub fn bind(
    addr: SocketAddr,
    gateway: Arc<RpcGateway>,
) -> Result<(SocketAddr, impl Future<Output = Result<()>>)> {
    let make_svc = make_service_fn(move |_conn| {
        let gateway = gateway.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle_request(req, gateway.clone())))
        }
    });

    let server = Server::try_bind(&addr)
        .with_context(|| format!("Failed to bind {}", addr))?
        .serve(make_svc);
    let local = server.local_addr();

    Ok((local, async move { server.await.context("RPC server error") }))
}

pub async fn serve(addr: SocketAddr, gateway: Arc<RpcGateway>) -> Result<()> {
    let (local, server) = bind(addr, gateway)?;
    tracing::info!("Visor RPC listening on http://{}{}", local, RPC_PATH);
    server.await
}

async fn handle_request(
    req: Request<Body>,
    gateway: Arc<RpcGateway>,
) -> Result<Response<Body>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::POST, RPC_PATH) => handle_rpc(req, gateway).await,
        _ => Ok(text_response(StatusCode::NOT_FOUND, "Not found".to_string())),
    };

    Ok(response.unwrap_or_else(|e| {
        text_response(StatusCode::BAD_REQUEST, format!("Error: {:#}", e))
    }))
}

async fn handle_rpc(req: Request<Body>, gateway: Arc<RpcGateway>) -> Result<Response<Body>> {
    let pretty = bool_from_query(query_param(req.uri().query(), "pretty"), false)?;

    let body_bytes = hyper::body::to_bytes(req.into_body()).await?;
    let request: RpcRequest =
        serde_json::from_slice(&body_bytes).context("Malformed RPC request")?;

    // Operations may block on collaborators
    let reply =
        tokio::task::spawn_blocking(move || gateway.handle(&request.method, request.params))
            .await
            .context("RPC handler panicked")?;

    let json = if pretty {
        serde_json::to_string_pretty(&reply)?
    } else {
        serde_json::to_string(&reply)?
    };

    let mut response = Response::new(Body::from(json));
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

fn text_response(status: StatusCode, text: String) -> Response<Body> {
    let mut response = Response::new(Body::from(text));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use visor_core::rpc::HttpChannel;
    use visor_core::visor::{MockVisor, RpcClient, VisorApi};
    use visor_core::{PubKey, VisorError};

    fn gateway() -> Arc<RpcGateway> {
        let visor = MockVisor::new(PubKey::from_bytes([3; 32]));
        Arc::new(RpcGateway::new("visor", Arc::new(visor)))
    }

    #[tokio::test]
    async fn test_rpc_over_http() {
        let (addr, server) = bind(([127, 0, 0, 1], 0).into(), gateway()).unwrap();
        tokio::spawn(server);

        let (apps, start_err) = tokio::task::spawn_blocking(move || {
            let channel = HttpChannel::new(&addr.to_string(), Duration::from_secs(5));
            let client = RpcClient::new(channel, "visor");
            (client.apps(), client.start_app("nope"))
        })
        .await
        .unwrap();

        assert_eq!(apps.unwrap().len(), 2);
        assert!(matches!(start_err, Err(VisorError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/nope")
            .body(Body::empty())
            .unwrap();
        let resp = handle_request(req, gateway()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pretty_reply() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/rpc?pretty=on")
            .body(Body::from(r#"{"method":"visor.Health"}"#))
            .unwrap();
        let resp = handle_request(req, gateway()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("route_finder"));
    }

    #[tokio::test]
    async fn test_bad_pretty_value_is_rejected() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/rpc?pretty=maybe")
            .body(Body::from(r#"{"method":"visor.Health"}"#))
            .unwrap();
        let resp = handle_request(req, gateway()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
