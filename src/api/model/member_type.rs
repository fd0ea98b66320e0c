use juniper::graphql_object;

use crate::{
    api::{Context, err::ApiResult},
    model::{MemberType, MemberTypeId, Profile},
};


/// A membership tier. There is a fixed set of them, see `MemberTypeId`.
#[graphql_object(Context = Context)]
impl MemberType {
    fn id(&self) -> MemberTypeId {
        self.id
    }

    /// Discount in percent.
    fn discount(&self) -> f64 {
        self.discount
    }

    fn posts_limit_per_month(&self) -> i32 {
        self.posts_limit_per_month
    }

    /// All profiles with this member type.
    async fn profiles(&self, context: &Context) -> ApiResult<Vec<Profile>> {
        Ok(context.store.profiles_with_member_type(self.id).await?)
    }
}

impl MemberType {
    pub(crate) async fn load_by_id(id: MemberTypeId, context: &Context) -> ApiResult<Option<Self>> {
        Ok(context.store.member_type(id).await?)
    }

    pub(crate) async fn load_all(context: &Context) -> ApiResult<Vec<Self>> {
        Ok(context.store.member_types().await?)
    }
}
