//! This module and its children define the GraphQL types of our API and the
//! logic behind the root fields.

use std::fmt;

use crate::{prelude::*, store::StoreResult};

pub(crate) mod member_type;
pub(crate) mod post;
pub(crate) mod profile;
pub(crate) mod subscription;
pub(crate) mod user;


/// Turns the result of a delete operation into the boolean the API returns.
/// Errors of any kind are logged and reported as `false`.
fn deletion_outcome(entity: &str, id: impl fmt::Display, result: StoreResult<()>) -> bool {
    match result {
        Ok(()) => {
            debug!("Deleted {entity} {id}");
            true
        }
        Err(e) => {
            warn!("Failed to delete {entity} {id}: {e}");
            false
        }
    }
}
