use std::fmt;

use juniper::GraphQLEnum;
use postgres_types::{FromSql, ToSql};


/// The fixed set of member types. Represents the `member_type_id` type defined
/// in `01-member-types.sql`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromSql, ToSql, GraphQLEnum)]
#[postgres(name = "member_type_id")]
pub(crate) enum MemberTypeId {
    #[postgres(name = "basic")]
    #[graphql(name = "basic")]
    Basic,

    #[postgres(name = "business")]
    #[graphql(name = "business")]
    Business,
}

impl MemberTypeId {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for MemberTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
