use juniper::{graphql_object, GraphQLInputObject};

use crate::{
    api::{Context, err::ApiResult, Id},
    model::{NewPost, Post, PostChange, User},
};


#[graphql_object(Context = Context)]
impl Post {
    fn id(&self) -> Id {
        Id(self.id)
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn author_id(&self) -> Id {
        Id(self.author_id)
    }

    async fn author(&self, context: &Context) -> ApiResult<Option<User>> {
        Ok(context.store.user(self.author_id).await?)
    }
}

impl Post {
    pub(crate) async fn load_by_id(id: Id, context: &Context) -> ApiResult<Option<Self>> {
        Ok(context.store.post(id.0).await?)
    }

    pub(crate) async fn load_all(context: &Context) -> ApiResult<Vec<Self>> {
        Ok(context.store.posts().await?)
    }

    pub(crate) async fn create(dto: CreatePostInput, context: &Context) -> ApiResult<Self> {
        Ok(context.store.create_post(dto.into()).await?)
    }

    pub(crate) async fn change(id: Id, dto: ChangePostInput, context: &Context) -> ApiResult<Self> {
        Ok(context.store.update_post(id.0, dto.into()).await?)
    }

    pub(crate) async fn delete(id: Id, context: &Context) -> bool {
        super::deletion_outcome("post", id, context.store.delete_post(id.0).await)
    }
}


#[derive(GraphQLInputObject)]
pub(crate) struct CreatePostInput {
    author_id: Id,
    title: String,
    content: String,
}

impl From<CreatePostInput> for NewPost {
    fn from(src: CreatePostInput) -> Self {
        Self {
            author_id: src.author_id.0,
            title: src.title,
            content: src.content,
        }
    }
}

/// Fields that are not given are left unchanged.
#[derive(GraphQLInputObject)]
pub(crate) struct ChangePostInput {
    title: Option<String>,
    content: Option<String>,
}

impl From<ChangePostInput> for PostChange {
    fn from(src: ChangePostInput) -> Self {
        Self {
            title: src.title,
            content: src.content,
        }
    }
}
