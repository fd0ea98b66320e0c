use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::{body::Body, Method, StatusCode};
use std::{error::Error, sync::Arc, time::Instant};

use crate::{
    api::{self, request::{GraphQLRequest, Outcome}},
    prelude::*,
};
use super::{Context, Request, Response, log, response};


type BoxError = Box<dyn Error + Send + Sync>;

/// This is the main HTTP entry point, called for each incoming request.
pub(super) async fn handle<B>(req: Request<B>, ctx: Arc<Context>) -> Response
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    log::req::log(&req);
    if ctx.config.log.log_http_headers {
        log::headers::log(&req);
    }

    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_owned();

    match path.as_str() {
        // The GraphQL endpoint. This is the only route we have.
        "" if method == Method::POST => handle_api(req, ctx).await,
        "" => {
            debug!("Responding with 405 to {method:?} '/'");
            response::method_not_allowed()
        }
        _ => {
            debug!("Responding with 404 to {method:?} '{path}'");
            response::not_found()
        }
    }
}

/// Handles a request to `/`.
async fn handle_api<B>(req: Request<B>, ctx: Arc<Context>) -> Response
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let before = Instant::now();

    let limit = ctx.config.http.max_body_size.try_into().unwrap_or(usize::MAX);
    let body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            debug!("Request body exceeds limit of {limit} bytes");
            return response::payload_too_large();
        }
        Err(e) => {
            warn!("Failed to read request body: {e}");
            return response::bad_request("failed to read request body".into());
        }
    };

    let request = match serde_json::from_slice::<GraphQLRequest>(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Invalid API request body: {e}");
            return response::bad_request(format!("invalid request body: {e}"));
        }
    };

    let api_context = Arc::new(api::Context { store: Arc::clone(&ctx.store) });
    let api_root = Arc::clone(&ctx.api_root);
    let max_depth = ctx.config.api.max_query_depth;
    let out = match api::request::execute(request, api_root, api_context, max_depth).await {
        Outcome::Envelope(body) => response::json(StatusCode::OK, &body),
        Outcome::SyntaxError(body) => response::json(StatusCode::BAD_REQUEST, &body),
    };

    debug!("Finished API query in {:.2?}", before.elapsed());
    out
}
