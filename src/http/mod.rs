//! The HTTP server, handler and routes.
//!
//! Binds the listener, spawns one task per connection and turns handler
//! panics into 500 responses. Routing lives in `handlers.rs`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{body::Incoming, service::service_fn};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use std::{
    convert::Infallible,
    future::Future,
    net::{IpAddr, SocketAddr},
    panic::AssertUnwindSafe,
    sync::Arc,
};
use tokio::net::TcpListener;

use crate::{api, config::Config, prelude::*, store::Store};
use self::{
    handlers::handle,
    response::internal_server_error,
};


mod handlers;
mod log;
mod response;


/// HTTP server configuration.
#[derive(Debug, Clone, confique::Config)]
pub(crate) struct HttpConfig {
    /// The TCP port the HTTP server should listen on.
    #[config(default = 3080)]
    pub(crate) port: u16,

    /// The bind address to listen on.
    #[config(default = "127.0.0.1")]
    pub(crate) address: IpAddr,

    /// Maximum size of a request body in bytes. Larger requests are answered
    /// with "413 Payload Too Large".
    #[config(default = 1048576)]
    pub(crate) max_body_size: u64,
}


// Our responses always have a fully buffered body.
type Response<T = Full<Bytes>> = hyper::Response<T>;
type Request<T = Incoming> = hyper::Request<T>;


/// Context that the request handler has access to.
struct Context {
    api_root: Arc<api::RootNode>,
    store: Arc<dyn Store>,
    config: Config,
}


/// Starts the HTTP server and runs it until Ctrl+C is received.
pub(crate) async fn serve(
    config: Config,
    api_root: api::RootNode,
    store: Arc<dyn Store>,
) -> Result<()> {
    let addr = SocketAddr::new(config.http.address, config.http.port);
    let ctx = Arc::new(Context { api_root: Arc::new(api_root), store, config });

    let listener = TcpListener::bind(addr).await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(v) => v,
                Err(e) => {
                    warn!("Failed to accept TCP connection: {e}");
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!("Received Ctrl+C: stopping HTTP server");
                break;
            }
        };

        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                handle_internal_errors(handle(req, Arc::clone(&ctx)))
            });

            let result = auto::Builder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), service)
                .await;
            if let Err(e) = result {
                debug!("Error while serving connection from {peer}: {e}");
            }
        });
    }

    Ok(())
}

/// Polls `future` to completion, turning a panic into a logged 500 response
/// so the connection still gets an answer.
async fn handle_internal_errors(
    future: impl Future<Output = Response>,
) -> Result<Response, Infallible> {
    // Handlers share no mutable state that a panic could leave inconsistent.
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(response) => Ok(response),
        Err(payload) => {
            // `panic!` payloads are `&str` or `String` unless a custom value
            // was passed to `panic_any`.
            let message = payload.downcast_ref::<&str>().copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("<non-string payload>");
            error!("HTTP handler panicked: {message}");

            Ok(internal_server_error())
        }
    }
}
