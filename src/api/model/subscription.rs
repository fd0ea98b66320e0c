use juniper::graphql_object;

use crate::{
    api::{Context, err::ApiResult, Id},
    model::{Subscription, User},
};


/// A "subscriber follows author" edge between two users.
#[graphql_object(name = "SubscribersOnAuthors", Context = Context)]
impl Subscription {
    fn subscriber_id(&self) -> Id {
        Id(self.subscriber_id)
    }

    fn author_id(&self) -> Id {
        Id(self.author_id)
    }

    async fn subscriber(&self, context: &Context) -> ApiResult<Option<User>> {
        Ok(context.store.user(self.subscriber_id).await?)
    }

    async fn author(&self, context: &Context) -> ApiResult<Option<User>> {
        Ok(context.store.user(self.author_id).await?)
    }
}

impl Subscription {
    fn edge(user_id: Id, author_id: Id) -> Self {
        Self {
            subscriber_id: user_id.0,
            author_id: author_id.0,
        }
    }

    /// Fails if the edge already exists or one of the users does not exist.
    pub(crate) async fn create(user_id: Id, author_id: Id, context: &Context) -> ApiResult<Self> {
        Ok(context.store.subscribe(Self::edge(user_id, author_id)).await?)
    }

    /// Unlike the `delete*` mutations, this reports a missing edge as an error.
    pub(crate) async fn remove(user_id: Id, author_id: Id, context: &Context) -> ApiResult<bool> {
        context.store.unsubscribe(Self::edge(user_id, author_id)).await?;
        Ok(true)
    }
}
