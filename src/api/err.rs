//! API error handling.
//!
//! We define our own error to use for all resolvers. It has `From` impls to be
//! created from other common errors that occur (e.g. store errors). This
//! module also offers a couple macros to easily create an error.
//!
//! The error contains information that helps clients show a good error
//! message. We have a very coarse "error kind", but also an optional "key"
//! that identifies the exact problem.

use juniper::{FieldError, IntoFieldError, ScalarValue, graphql_value};

use crate::{
    prelude::*,
    store::{constraint, StoreError},
};


pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) msg: String,
    pub(crate) kind: ApiErrorKind,
    pub(crate) key: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    /// The arguments passed to an endpoint are invalid somehow, e.g. they
    /// reference a record that does not exist.
    InvalidInput,

    /// The record the operation was supposed to act on does not exist.
    NotFound,

    /// The operation would violate a uniqueness rule.
    Conflict,

    /// Some server error out of control of the API user.
    InternalServerError,
}

impl ApiErrorKind {
    fn kind_str(&self) -> &str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    fn message_prefix(&self) -> &str {
        match self {
            Self::InvalidInput => "Invalid input",
            Self::NotFound => "Not found",
            Self::Conflict => "Conflict",
            Self::InternalServerError => "Internal server error",
        }
    }
}

impl<S: ScalarValue> IntoFieldError<S> for ApiError {
    fn into_field_error(self) -> juniper::FieldError<S> {
        let msg = format!("{}: {}", self.kind.message_prefix(), self.msg);
        let ext = if let Some(key) = self.key {
            graphql_value!({
                "kind": (self.kind.kind_str()),
                "key": key,
            })
        } else {
            graphql_value!({
                "kind": (self.kind.kind_str()),
            })
        };

        FieldError::new(msg, ext)
    }
}


// ===== Helper macros to easily create errors ==================================================

/// Creates an `ApiError` with a `format!` like syntax.
macro_rules! api_err {
    ($kind:ident, key = $key:literal, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::api::err::ApiError {
            msg: format!($fmt $(, $arg)*),
            kind: $crate::api::err::ApiErrorKind::$kind,
            key: Some($key),
        }
    };
    ($kind:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::api::err::ApiError {
            msg: format!($fmt $(, $arg)*),
            kind: $crate::api::err::ApiErrorKind::$kind,
            key: None,
        }
    };
}

macro_rules! invalid_input {
    ($($t:tt)+) => { $crate::api::err::api_err!(InvalidInput, $($t)*) };
}

macro_rules! not_found {
    ($($t:tt)+) => { $crate::api::err::api_err!(NotFound, $($t)*) };
}

macro_rules! conflict {
    ($($t:tt)+) => { $crate::api::err::api_err!(Conflict, $($t)*) };
}

macro_rules! internal_server_error {
    ($($t:tt)+) => { $crate::api::err::api_err!(InternalServerError, $($t)*) };
}

pub(crate) use api_err;


impl From<StoreError> for ApiError {
    fn from(src: StoreError) -> Self {
        match src {
            StoreError::NotFound { entity, key } => {
                not_found!(key = "record.not-found", "{entity} '{key}' does not exist")
            }

            StoreError::UniqueViolation(c) => match &*c {
                constraint::PROFILE_USER_UNIQUE => conflict!(
                    key = "profile.user-has-profile",
                    "the user already has a profile",
                ),
                constraint::SUBSCRIPTION_PKEY => conflict!(
                    key = "subscription.exists",
                    "the user is already subscribed to this author",
                ),
                _ => conflict!("unique constraint '{c}' violated"),
            },

            StoreError::ForeignKeyViolation(c) => match &*c {
                constraint::PROFILE_USER_FK => invalid_input!(
                    key = "profile.unknown-user",
                    "the referenced user does not exist",
                ),
                constraint::PROFILE_MEMBER_TYPE_FK => invalid_input!(
                    key = "profile.unknown-member-type",
                    "the referenced member type does not exist",
                ),
                constraint::POST_AUTHOR_FK => invalid_input!(
                    key = "post.unknown-author",
                    "the referenced author does not exist",
                ),
                constraint::SUBSCRIPTION_SUBSCRIBER_FK => invalid_input!(
                    key = "subscription.unknown-user",
                    "the subscribing user does not exist",
                ),
                constraint::SUBSCRIPTION_AUTHOR_FK => invalid_input!(
                    key = "subscription.unknown-author",
                    "the author to subscribe to does not exist",
                ),
                _ => invalid_input!("foreign key constraint '{c}' violated"),
            },

            // Logging the error here is not ideal but probably totally fine
            // for us. At this point, it's very very likely that the error is
            // sent back to the user. And this is the last time we can get
            // detailed information about it.
            StoreError::Pool(e) => {
                error!("Failed to get DB connection: {e}");
                internal_server_error!("database unavailable")
            }
            StoreError::Db(e) => {
                error!("DB Error when executing query: {e}");
                debug!("Detailed error: {e:#?}");
                internal_server_error!("DB error")
            }
        }
    }
}
