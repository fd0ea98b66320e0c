use async_trait::async_trait;
use deadpool_postgres::Pool;
use postgres_types::ToSql;
use tokio_postgres::{error::SqlState, Row};
use uuid::Uuid;

use crate::{
    model::{
        MemberType, MemberTypeId, NewPost, NewProfile, NewUser, Post, PostChange, Profile,
        ProfileChange, Subscription, User, UserChange,
    },
    store::{Store, StoreError, StoreResult},
};
use super::{get_conn, util::{collect_rows_mapped, dbargs}, DbConnection};


type Args<'a> = &'a [&'a (dyn ToSql + Sync)];

/// `Store` implementation backed by the PostgreSQL connection pool. Every
/// method checks out its own connection.
pub(crate) struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub(crate) fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> StoreResult<DbConnection> {
        Ok(get_conn(&self.pool).await?)
    }

    async fn query_opt<T: Table>(&self, sql: &str, args: Args<'_>) -> StoreResult<Option<T>> {
        let conn = self.conn().await?;
        let statement = conn.prepare_cached(sql).await?;
        let row = conn.query_opt(&statement, args).await?;
        Ok(row.map(|row| T::from_row(&row)))
    }

    async fn query_all<T: Table>(&self, sql: &str, args: Args<'_>) -> StoreResult<Vec<T>> {
        let conn = self.conn().await?;
        let statement = conn.prepare_cached(sql).await?;
        let rows = conn.query_raw(&statement, args.iter().copied()).await?;
        collect_rows_mapped(rows, |row| T::from_row(&row)).await.map_err(Into::into)
    }

    /// Runs a statement that is expected to return exactly one row, like an
    /// `insert ... returning`.
    async fn query_one<T: Table>(&self, sql: &str, args: Args<'_>) -> StoreResult<T> {
        let conn = self.conn().await?;
        let statement = conn.prepare_cached(sql).await?;
        let row = conn.query_one(&statement, args).await?;
        Ok(T::from_row(&row))
    }

    /// Returns the number of affected rows.
    async fn execute(&self, sql: &str, args: Args<'_>) -> StoreResult<u64> {
        let conn = self.conn().await?;
        let statement = conn.prepare_cached(sql).await?;
        Ok(conn.execute(&statement, args).await?)
    }

    async fn delete_by_id(&self, table: &str, entity: &'static str, id: Uuid) -> StoreResult<()> {
        let sql = format!("delete from {table} where id = $1");
        match self.execute(&sql, &[&id]).await? {
            0 => Err(StoreError::not_found(entity, id)),
            _ => Ok(()),
        }
    }
}

/// Maps a row of one of our tables to its model type. The columns are always
/// selected in the order of `COL_NAMES`.
trait Table: Sized {
    const COL_NAMES: &'static str;
    fn from_row(row: &Row) -> Self;
}

impl Table for User {
    const COL_NAMES: &'static str = "id, name, balance";

    fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            name: row.get(1),
            balance: row.get(2),
        }
    }
}

impl Table for Profile {
    const COL_NAMES: &'static str = "id, is_male, year_of_birth, user_id, member_type_id";

    fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            is_male: row.get(1),
            year_of_birth: row.get(2),
            user_id: row.get(3),
            member_type_id: row.get(4),
        }
    }
}

impl Table for Post {
    const COL_NAMES: &'static str = "id, title, content, author_id";

    fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            title: row.get(1),
            content: row.get(2),
            author_id: row.get(3),
        }
    }
}

impl Table for MemberType {
    const COL_NAMES: &'static str = "id, discount, posts_limit_per_month";

    fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            discount: row.get(1),
            posts_limit_per_month: row.get(2),
        }
    }
}

impl Table for Subscription {
    const COL_NAMES: &'static str = "subscriber_id, author_id";

    fn from_row(row: &Row) -> Self {
        Self {
            subscriber_id: row.get(0),
            author_id: row.get(1),
        }
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        let code = e.code().cloned();
        let constraint = e.as_db_error()
            .and_then(|db_err| db_err.constraint())
            .map(ToOwned::to_owned);

        match (code, constraint) {
            (Some(SqlState::UNIQUE_VIOLATION), Some(c)) => Self::UniqueViolation(c),
            (Some(SqlState::FOREIGN_KEY_VIOLATION), Some(c)) => Self::ForeignKeyViolation(c),
            _ => Self::Db(e),
        }
    }
}


#[async_trait]
impl Store for PgStore {
    async fn user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("select {} from users where id = $1", User::COL_NAMES);
        self.query_opt(&sql, &[&id]).await
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("select {} from users", User::COL_NAMES);
        self.query_all(&sql, &dbargs![]).await
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let sql = format!(
            "insert into users (id, name, balance) values ($1, $2, $3) returning {}",
            User::COL_NAMES,
        );
        self.query_one(&sql, &[&Uuid::new_v4(), &new.name, &new.balance]).await
    }

    async fn update_user(&self, id: Uuid, change: UserChange) -> StoreResult<User> {
        let sql = format!(
            "update users set \
                name = coalesce($2, name), \
                balance = coalesce($3, balance) \
                where id = $1 \
                returning {}",
            User::COL_NAMES,
        );
        self.query_opt(&sql, &[&id, &change.name, &change.balance])
            .await?
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        // Profile, posts and subscription edges are removed via `on delete cascade`.
        self.delete_by_id("users", "user", id).await
    }

    async fn profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let sql = format!("select {} from profiles where id = $1", Profile::COL_NAMES);
        self.query_opt(&sql, &[&id]).await
    }

    async fn profiles(&self) -> StoreResult<Vec<Profile>> {
        let sql = format!("select {} from profiles", Profile::COL_NAMES);
        self.query_all(&sql, &dbargs![]).await
    }

    async fn profile_of_user(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let sql = format!("select {} from profiles where user_id = $1", Profile::COL_NAMES);
        self.query_opt(&sql, &[&user_id]).await
    }

    async fn profiles_with_member_type(&self, id: MemberTypeId) -> StoreResult<Vec<Profile>> {
        let sql = format!("select {} from profiles where member_type_id = $1", Profile::COL_NAMES);
        self.query_all(&sql, &[&id]).await
    }

    async fn create_profile(&self, new: NewProfile) -> StoreResult<Profile> {
        let sql = format!(
            "insert into profiles (id, is_male, year_of_birth, user_id, member_type_id) \
                values ($1, $2, $3, $4, $5) \
                returning {}",
            Profile::COL_NAMES,
        );
        let id = Uuid::new_v4();
        let args = dbargs![
            &id,
            &new.is_male,
            &new.year_of_birth,
            &new.user_id,
            &new.member_type_id,
        ];
        self.query_one(&sql, &args).await
    }

    async fn update_profile(&self, id: Uuid, change: ProfileChange) -> StoreResult<Profile> {
        let sql = format!(
            "update profiles set \
                is_male = coalesce($2, is_male), \
                year_of_birth = coalesce($3, year_of_birth), \
                member_type_id = coalesce($4, member_type_id) \
                where id = $1 \
                returning {}",
            Profile::COL_NAMES,
        );
        let args = dbargs![&id, &change.is_male, &change.year_of_birth, &change.member_type_id];
        self.query_opt(&sql, &args)
            .await?
            .ok_or_else(|| StoreError::not_found("profile", id))
    }

    async fn delete_profile(&self, id: Uuid) -> StoreResult<()> {
        self.delete_by_id("profiles", "profile", id).await
    }

    async fn post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let sql = format!("select {} from posts where id = $1", Post::COL_NAMES);
        self.query_opt(&sql, &[&id]).await
    }

    async fn posts(&self) -> StoreResult<Vec<Post>> {
        let sql = format!("select {} from posts", Post::COL_NAMES);
        self.query_all(&sql, &dbargs![]).await
    }

    async fn posts_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Post>> {
        let sql = format!("select {} from posts where author_id = $1", Post::COL_NAMES);
        self.query_all(&sql, &[&author_id]).await
    }

    async fn create_post(&self, new: NewPost) -> StoreResult<Post> {
        let sql = format!(
            "insert into posts (id, title, content, author_id) \
                values ($1, $2, $3, $4) \
                returning {}",
            Post::COL_NAMES,
        );
        self.query_one(&sql, &[&Uuid::new_v4(), &new.title, &new.content, &new.author_id]).await
    }

    async fn update_post(&self, id: Uuid, change: PostChange) -> StoreResult<Post> {
        let sql = format!(
            "update posts set \
                title = coalesce($2, title), \
                content = coalesce($3, content) \
                where id = $1 \
                returning {}",
            Post::COL_NAMES,
        );
        self.query_opt(&sql, &[&id, &change.title, &change.content])
            .await?
            .ok_or_else(|| StoreError::not_found("post", id))
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        self.delete_by_id("posts", "post", id).await
    }

    async fn member_type(&self, id: MemberTypeId) -> StoreResult<Option<MemberType>> {
        let sql = format!("select {} from member_types where id = $1", MemberType::COL_NAMES);
        self.query_opt(&sql, &[&id]).await
    }

    async fn member_types(&self) -> StoreResult<Vec<MemberType>> {
        let sql = format!("select {} from member_types", MemberType::COL_NAMES);
        self.query_all(&sql, &dbargs![]).await
    }

    async fn authors_of(&self, subscriber_id: Uuid) -> StoreResult<Vec<User>> {
        let sql = format!(
            "select {} from users \
                join subscribers_on_authors on subscribers_on_authors.author_id = users.id \
                where subscribers_on_authors.subscriber_id = $1",
            User::COL_NAMES,
        );
        self.query_all(&sql, &[&subscriber_id]).await
    }

    async fn subscribers_of(&self, author_id: Uuid) -> StoreResult<Vec<User>> {
        let sql = format!(
            "select {} from users \
                join subscribers_on_authors on subscribers_on_authors.subscriber_id = users.id \
                where subscribers_on_authors.author_id = $1",
            User::COL_NAMES,
        );
        self.query_all(&sql, &[&author_id]).await
    }

    async fn subscribe(&self, edge: Subscription) -> StoreResult<Subscription> {
        let sql = format!(
            "insert into subscribers_on_authors (subscriber_id, author_id) \
                values ($1, $2) \
                returning {}",
            Subscription::COL_NAMES,
        );
        self.query_one(&sql, &[&edge.subscriber_id, &edge.author_id]).await
    }

    async fn unsubscribe(&self, edge: Subscription) -> StoreResult<()> {
        let sql = "delete from subscribers_on_authors where subscriber_id = $1 and author_id = $2";
        match self.execute(sql, &[&edge.subscriber_id, &edge.author_id]).await? {
            0 => Err(StoreError::not_found(
                "subscription",
                format!("{} -> {}", edge.subscriber_id, edge.author_id),
            )),
            _ => Ok(()),
        }
    }
}
