use juniper::{graphql_object, GraphQLInputObject};

use crate::{
    api::{Context, err::ApiResult, Id},
    model::{NewUser, Post, Profile, User, UserChange},
};


#[graphql_object(Context = Context)]
impl User {
    fn id(&self) -> Id {
        Id(self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn balance(&self) -> f64 {
        self.balance
    }

    /// The profile of this user, if one was created.
    async fn profile(&self, context: &Context) -> ApiResult<Option<Profile>> {
        Ok(context.store.profile_of_user(self.id).await?)
    }

    /// All posts written by this user.
    async fn posts(&self, context: &Context) -> ApiResult<Vec<Post>> {
        Ok(context.store.posts_by_author(self.id).await?)
    }

    /// Users this user is subscribed to.
    async fn user_subscribed_to(&self, context: &Context) -> ApiResult<Vec<User>> {
        Ok(context.store.authors_of(self.id).await?)
    }

    /// Users that are subscribed to this user.
    async fn subscribed_to_user(&self, context: &Context) -> ApiResult<Vec<User>> {
        Ok(context.store.subscribers_of(self.id).await?)
    }
}

impl User {
    pub(crate) async fn load_by_id(id: Id, context: &Context) -> ApiResult<Option<Self>> {
        Ok(context.store.user(id.0).await?)
    }

    pub(crate) async fn load_all(context: &Context) -> ApiResult<Vec<Self>> {
        Ok(context.store.users().await?)
    }

    pub(crate) async fn create(dto: CreateUserInput, context: &Context) -> ApiResult<Self> {
        Ok(context.store.create_user(dto.into()).await?)
    }

    pub(crate) async fn change(id: Id, dto: ChangeUserInput, context: &Context) -> ApiResult<Self> {
        Ok(context.store.update_user(id.0, dto.into()).await?)
    }

    /// Also removes the user's profile, posts and subscriptions.
    pub(crate) async fn delete(id: Id, context: &Context) -> bool {
        super::deletion_outcome("user", id, context.store.delete_user(id.0).await)
    }
}


#[derive(GraphQLInputObject)]
pub(crate) struct CreateUserInput {
    name: String,
    balance: f64,
}

impl From<CreateUserInput> for NewUser {
    fn from(src: CreateUserInput) -> Self {
        Self {
            name: src.name,
            balance: src.balance,
        }
    }
}

/// Fields that are not given are left unchanged.
#[derive(GraphQLInputObject)]
pub(crate) struct ChangeUserInput {
    name: Option<String>,
    balance: Option<f64>,
}

impl From<ChangeUserInput> for UserChange {
    fn from(src: ChangeUserInput) -> Self {
        Self {
            name: src.name,
            balance: src.balance,
        }
    }
}
