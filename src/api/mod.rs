//! Definition of the GraphQL API.

use juniper::EmptySubscription;

use self::{
    mutation::Mutation,
    query::Query,
};

pub(crate) mod err;
pub(crate) mod model;
pub(crate) mod request;

mod context;
mod depth;
mod id;
mod mutation;
mod query;


pub(crate) use self::{
    id::Id,
    context::Context,
};


/// API configuration.
#[derive(Debug, Clone, confique::Config)]
pub(crate) struct ApiConfig {
    /// Maximum nesting depth of selection sets in a query. Top level fields
    /// are at depth 0. Queries nested deeper than this are rejected without
    /// being executed.
    #[config(default = 5)]
    pub(crate) max_query_depth: usize,
}


/// Creates and returns the API root node.
pub(crate) fn root_node() -> RootNode {
    RootNode::new(Query, Mutation, EmptySubscription::new())
}

/// Type of our API root node.
pub(crate) type RootNode = juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;
