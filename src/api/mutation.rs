use juniper::graphql_object;

use crate::model::{Post, Profile, Subscription, User};
use super::{
    Context,
    Id,
    err::ApiResult,
    model::{
        post::{ChangePostInput, CreatePostInput},
        profile::{ChangeProfileInput, CreateProfileInput},
        user::{ChangeUserInput, CreateUserInput},
    },
};


/// The root mutation object.
pub(crate) struct Mutation;

#[graphql_object(Context = Context)]
impl Mutation {
    /// Creates a new user.
    async fn create_user(dto: CreateUserInput, context: &Context) -> ApiResult<User> {
        User::create(dto, context).await
    }

    /// Updates the given fields of a user.
    async fn change_user(id: Id, dto: ChangeUserInput, context: &Context) -> ApiResult<User> {
        User::change(id, dto, context).await
    }

    /// Deletes a user together with their profile, posts and subscriptions.
    /// Returns `false` if that failed for any reason, including the user not
    /// existing.
    async fn delete_user(id: Id, context: &Context) -> bool {
        User::delete(id, context).await
    }

    /// Creates a new post.
    async fn create_post(dto: CreatePostInput, context: &Context) -> ApiResult<Post> {
        Post::create(dto, context).await
    }

    /// Updates the given fields of a post.
    async fn change_post(id: Id, dto: ChangePostInput, context: &Context) -> ApiResult<Post> {
        Post::change(id, dto, context).await
    }

    /// Deletes a post. Returns `false` if that failed for any reason.
    async fn delete_post(id: Id, context: &Context) -> bool {
        Post::delete(id, context).await
    }

    /// Creates a profile for a user. Each user can have at most one profile.
    async fn create_profile(dto: CreateProfileInput, context: &Context) -> ApiResult<Profile> {
        Profile::create(dto, context).await
    }

    /// Updates the given fields of a profile.
    async fn change_profile(
        id: Id,
        dto: ChangeProfileInput,
        context: &Context,
    ) -> ApiResult<Profile> {
        Profile::change(id, dto, context).await
    }

    /// Deletes a profile. Returns `false` if that failed for any reason.
    async fn delete_profile(id: Id, context: &Context) -> bool {
        Profile::delete(id, context).await
    }

    /// Subscribes the user `userId` to the author `authorId`.
    async fn subscribe_to(
        user_id: Id,
        author_id: Id,
        context: &Context,
    ) -> ApiResult<Subscription> {
        Subscription::create(user_id, author_id, context).await
    }

    /// Removes the subscription of user `userId` to author `authorId`.
    /// Errors if no such subscription exists.
    async fn unsubscribe_from(user_id: Id, author_id: Id, context: &Context) -> ApiResult<bool> {
        Subscription::remove(user_id, author_id, context).await
    }
}
