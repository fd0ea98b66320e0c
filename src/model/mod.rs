//! Items that define the domain data model.
//!
//! These types are what the store loads and stores. They don't know anything
//! about GraphQL or SQL: the GraphQL output types are implemented for them in
//! `api::model`, the row mapping lives in `db::store`.

use uuid::Uuid;

mod member_type;

pub(crate) use self::member_type::MemberTypeId;


#[derive(Debug, Clone, PartialEq)]
pub(crate) struct User {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Profile {
    pub(crate) id: Uuid,
    pub(crate) is_male: bool,
    pub(crate) year_of_birth: i32,
    pub(crate) user_id: Uuid,
    pub(crate) member_type_id: MemberTypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Post {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MemberType {
    pub(crate) id: MemberTypeId,
    pub(crate) discount: f64,
    pub(crate) posts_limit_per_month: i32,
}

/// The edge "`subscriber_id` subscribes to the posts of `author_id`". The pair
/// is the primary key of the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Subscription {
    pub(crate) subscriber_id: Uuid,
    pub(crate) author_id: Uuid,
}


// ===== Data for creating and changing entities ==============================================
//
// For all `*Change` types: `None` means "leave the stored value as it is".

#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub(crate) name: String,
    pub(crate) balance: f64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct UserChange {
    pub(crate) name: Option<String>,
    pub(crate) balance: Option<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) author_id: Uuid,
    pub(crate) title: String,
    pub(crate) content: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PostChange {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewProfile {
    pub(crate) is_male: bool,
    pub(crate) year_of_birth: i32,
    pub(crate) member_type_id: MemberTypeId,
    pub(crate) user_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ProfileChange {
    pub(crate) is_male: Option<bool>,
    pub(crate) year_of_birth: Option<i32>,
    pub(crate) member_type_id: Option<MemberTypeId>,
}
