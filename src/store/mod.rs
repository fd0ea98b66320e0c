//! The backing store that all resolvers read from and write to.
//!
//! The API only talks to the `Store` trait. In production, that's
//! `db::PgStore`. Tests use `MemoryStore`, which follows the same constraint
//! rules as the SQL schema (unique keys, foreign keys, cascading deletes).

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{
    MemberType, MemberTypeId, NewPost, NewProfile, NewUser, Post, PostChange, Profile,
    ProfileChange, Subscription, User, UserChange,
};

#[cfg(test)]
pub(crate) mod memory;


pub(crate) type StoreResult<T> = Result<T, StoreError>;

/// Names of the constraints that can be violated by API input. These have to
/// match the names in the SQL migrations.
pub(crate) mod constraint {
    pub(crate) const PROFILE_USER_UNIQUE: &str = "profiles_user_id_key";
    pub(crate) const PROFILE_USER_FK: &str = "profiles_user_id_fkey";
    pub(crate) const PROFILE_MEMBER_TYPE_FK: &str = "profiles_member_type_id_fkey";
    pub(crate) const POST_AUTHOR_FK: &str = "posts_author_id_fkey";
    pub(crate) const SUBSCRIPTION_PKEY: &str = "subscribers_on_authors_pkey";
    pub(crate) const SUBSCRIPTION_SUBSCRIBER_FK: &str = "subscribers_on_authors_subscriber_id_fkey";
    pub(crate) const SUBSCRIPTION_AUTHOR_FK: &str = "subscribers_on_authors_author_id_fkey";
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    /// The record to update or delete does not exist.
    #[error("{entity} '{key}' does not exist")]
    NotFound {
        entity: &'static str,
        key: String,
    },

    /// A unique constraint (named by the string) would be violated.
    #[error("unique constraint '{0}' violated")]
    UniqueViolation(String),

    /// A referenced record does not exist. The string is the name of the
    /// foreign key constraint.
    #[error("foreign key constraint '{0}' violated")]
    ForeignKeyViolation(String),

    #[error("failed to obtain DB connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("DB error: {0}")]
    Db(#[source] tokio_postgres::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound { entity, key: key.to_string() }
    }
}

/// All operations the API needs. Every call is one independent round trip;
/// there is no batching and no transaction spanning multiple calls.
#[async_trait]
pub(crate) trait Store: Send + Sync {
    // ----- Users ------------------------------------------------------------
    async fn user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn users(&self) -> StoreResult<Vec<User>>;
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn update_user(&self, id: Uuid, change: UserChange) -> StoreResult<User>;

    /// Also deletes the user's profile, posts and subscription edges.
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    // ----- Profiles ---------------------------------------------------------
    async fn profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;
    async fn profiles(&self) -> StoreResult<Vec<Profile>>;
    async fn profile_of_user(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;
    async fn profiles_with_member_type(&self, id: MemberTypeId) -> StoreResult<Vec<Profile>>;
    async fn create_profile(&self, new: NewProfile) -> StoreResult<Profile>;
    async fn update_profile(&self, id: Uuid, change: ProfileChange) -> StoreResult<Profile>;
    async fn delete_profile(&self, id: Uuid) -> StoreResult<()>;

    // ----- Posts ------------------------------------------------------------
    async fn post(&self, id: Uuid) -> StoreResult<Option<Post>>;
    async fn posts(&self) -> StoreResult<Vec<Post>>;
    async fn posts_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Post>>;
    async fn create_post(&self, new: NewPost) -> StoreResult<Post>;
    async fn update_post(&self, id: Uuid, change: PostChange) -> StoreResult<Post>;
    async fn delete_post(&self, id: Uuid) -> StoreResult<()>;

    // ----- Member types -----------------------------------------------------
    async fn member_type(&self, id: MemberTypeId) -> StoreResult<Option<MemberType>>;
    async fn member_types(&self) -> StoreResult<Vec<MemberType>>;

    // ----- Subscription edges -----------------------------------------------
    /// Users that `subscriber_id` is subscribed to.
    async fn authors_of(&self, subscriber_id: Uuid) -> StoreResult<Vec<User>>;

    /// Users that are subscribed to `author_id`.
    async fn subscribers_of(&self, author_id: Uuid) -> StoreResult<Vec<User>>;

    async fn subscribe(&self, edge: Subscription) -> StoreResult<Subscription>;
    async fn unsubscribe(&self, edge: Subscription) -> StoreResult<()>;
}
