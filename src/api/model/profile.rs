use juniper::{graphql_object, GraphQLInputObject};

use crate::{
    api::{Context, err::ApiResult, Id},
    model::{MemberType, MemberTypeId, NewProfile, Profile, ProfileChange, User},
};


#[graphql_object(Context = Context)]
impl Profile {
    fn id(&self) -> Id {
        Id(self.id)
    }

    fn is_male(&self) -> bool {
        self.is_male
    }

    fn year_of_birth(&self) -> i32 {
        self.year_of_birth
    }

    fn user_id(&self) -> Id {
        Id(self.user_id)
    }

    async fn user(&self, context: &Context) -> ApiResult<Option<User>> {
        Ok(context.store.user(self.user_id).await?)
    }

    fn member_type_id(&self) -> MemberTypeId {
        self.member_type_id
    }

    async fn member_type(&self, context: &Context) -> ApiResult<Option<MemberType>> {
        Ok(context.store.member_type(self.member_type_id).await?)
    }
}

impl Profile {
    pub(crate) async fn load_by_id(id: Id, context: &Context) -> ApiResult<Option<Self>> {
        Ok(context.store.profile(id.0).await?)
    }

    pub(crate) async fn load_all(context: &Context) -> ApiResult<Vec<Self>> {
        Ok(context.store.profiles().await?)
    }

    /// Fails if the user does not exist or already has a profile.
    pub(crate) async fn create(dto: CreateProfileInput, context: &Context) -> ApiResult<Self> {
        Ok(context.store.create_profile(dto.into()).await?)
    }

    pub(crate) async fn change(
        id: Id,
        dto: ChangeProfileInput,
        context: &Context,
    ) -> ApiResult<Self> {
        Ok(context.store.update_profile(id.0, dto.into()).await?)
    }

    pub(crate) async fn delete(id: Id, context: &Context) -> bool {
        super::deletion_outcome("profile", id, context.store.delete_profile(id.0).await)
    }
}


#[derive(GraphQLInputObject)]
pub(crate) struct CreateProfileInput {
    is_male: bool,
    year_of_birth: i32,
    member_type_id: MemberTypeId,
    user_id: Id,
}

impl From<CreateProfileInput> for NewProfile {
    fn from(src: CreateProfileInput) -> Self {
        Self {
            is_male: src.is_male,
            year_of_birth: src.year_of_birth,
            member_type_id: src.member_type_id,
            user_id: src.user_id.0,
        }
    }
}

/// Fields that are not given are left unchanged. The owning user of a
/// profile cannot be changed.
#[derive(GraphQLInputObject)]
pub(crate) struct ChangeProfileInput {
    is_male: Option<bool>,
    year_of_birth: Option<i32>,
    member_type_id: Option<MemberTypeId>,
}

impl From<ChangeProfileInput> for ProfileChange {
    fn from(src: ChangeProfileInput) -> Self {
        Self {
            is_male: src.is_male,
            year_of_birth: src.year_of_birth,
            member_type_id: src.member_type_id,
        }
    }
}
