use juniper::graphql_object;

use crate::model::{MemberType, MemberTypeId, Post, Profile, User};
use super::{Context, Id, err::ApiResult};


/// The root query object.
pub(crate) struct Query;

#[graphql_object(Context = Context)]
impl Query {
    /// Returns the member type with the given ID.
    async fn member_type(id: MemberTypeId, context: &Context) -> ApiResult<Option<MemberType>> {
        MemberType::load_by_id(id, context).await
    }

    /// Returns all member types.
    async fn member_types(context: &Context) -> ApiResult<Vec<MemberType>> {
        MemberType::load_all(context).await
    }

    /// Returns the post with the given ID or `null` if it does not exist.
    async fn post(id: Id, context: &Context) -> ApiResult<Option<Post>> {
        Post::load_by_id(id, context).await
    }

    /// Returns all posts.
    async fn posts(context: &Context) -> ApiResult<Vec<Post>> {
        Post::load_all(context).await
    }

    /// Returns the user with the given ID or `null` if it does not exist.
    async fn user(id: Id, context: &Context) -> ApiResult<Option<User>> {
        User::load_by_id(id, context).await
    }

    /// Returns all users.
    async fn users(context: &Context) -> ApiResult<Vec<User>> {
        User::load_all(context).await
    }

    /// Returns the profile with the given ID or `null` if it does not exist.
    async fn profile(id: Id, context: &Context) -> ApiResult<Option<Profile>> {
        Profile::load_by_id(id, context).await
    }

    /// Returns all profiles.
    async fn profiles(context: &Context) -> ApiResult<Vec<Profile>> {
        Profile::load_all(context).await
    }
}
