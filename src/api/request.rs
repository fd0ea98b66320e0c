//! Turns a GraphQL request body into the JSON response envelope.

use std::sync::Arc;

use juniper::{GraphQLError, Variables};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::prelude::*;
use super::{Context, RootNode, depth};


/// The JSON body of a request to the API endpoint. Unknown keys are rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GraphQLRequest {
    pub(crate) query: String,

    #[serde(default)]
    pub(crate) variables: Option<Variables>,
}

/// Result of processing one request.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// The query is not syntactically valid GraphQL. The body has the shape
    /// `{ "errors": [...] }`.
    SyntaxError(JsonValue),

    /// A regular response envelope `{ "data": ..., "errors": [...] }`. This
    /// includes requests that failed validation, in which case `data` is the
    /// empty string.
    Envelope(JsonValue),
}

/// Parses, validates and executes the request.
///
/// Validation happens in two steps: first the depth limit is checked on the
/// parsed document. Only if that passes, juniper validates the query against
/// the schema as part of execution. Errors of either step are reported in an
/// envelope with `"data": ""` and nothing is executed.
///
/// Everything is taken by value so that the returned future owns its data and
/// can be driven by the connection task.
pub(crate) async fn execute(
    request: GraphQLRequest,
    root: Arc<RootNode>,
    context: Arc<Context>,
    max_depth: usize,
) -> Outcome {
    if let Err(outcome) = check_document(&request.query, max_depth) {
        return outcome;
    }

    let variables = request.variables.unwrap_or_default();
    match juniper::execute(&request.query, None, &*root, &variables, &*context).await {
        Ok((data, errors)) if errors.is_empty() => Outcome::Envelope(json!({ "data": data })),
        Ok((data, errors)) => Outcome::Envelope(json!({
            "data": data,
            "errors": errors,
        })),

        // Our parser and juniper's might not agree on every corner of the
        // syntax. Either way, it's a syntax error.
        Err(e @ GraphQLError::ParseError(_)) => Outcome::SyntaxError(json!({ "errors": e })),

        Err(e @ GraphQLError::ValidationError(_)) => Outcome::Envelope(json!({
            "data": "",
            "errors": e,
        })),
        Err(e) => Outcome::Envelope(json!({ "errors": e })),
    }
}

/// Parses the query and applies the depth limit. The parsed document does not
/// outlive this function.
fn check_document(query: &str, max_depth: usize) -> Result<(), Outcome> {
    let document = match graphql_parser::query::parse_query::<&str>(query) {
        Ok(document) => document,
        Err(e) => {
            debug!("Failed to parse GraphQL query: {e}");
            return Err(Outcome::SyntaxError(json!({
                "errors": [{ "message": e.to_string() }],
            })));
        }
    };

    let depth_errors = depth::check(&document, max_depth);
    if !depth_errors.is_empty() {
        debug!("Query exceeds maximum depth of {max_depth}");
        return Err(Outcome::Envelope(json!({
            "data": "",
            "errors": depth_errors,
        })));
    }

    Ok(())
}
