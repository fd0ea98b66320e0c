use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{
    MemberType, MemberTypeId, NewPost, NewProfile, NewUser, Post, PostChange, Profile,
    ProfileChange, Subscription, User, UserChange,
};
use super::{constraint, Store, StoreError, StoreResult};


/// In-memory store with the same constraint semantics as the SQL schema.
/// Records are kept in insertion order.
pub(crate) struct MemoryStore {
    data: Mutex<Data>,
}

#[derive(Default)]
struct Data {
    users: Vec<User>,
    profiles: Vec<Profile>,
    posts: Vec<Post>,
    member_types: Vec<MemberType>,
    subscriptions: Vec<Subscription>,
}

impl MemoryStore {
    /// Creates an empty store that only contains the seeded member types.
    pub(crate) fn new() -> Self {
        let data = Data {
            member_types: vec![
                MemberType {
                    id: MemberTypeId::Basic,
                    discount: 2.3,
                    posts_limit_per_month: 20,
                },
                MemberType {
                    id: MemberTypeId::Business,
                    discount: 7.7,
                    posts_limit_per_month: 100,
                },
            ],
            ..Data::default()
        };

        Self { data: Mutex::new(data) }
    }

    fn lock(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap()
    }
}

impl Data {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn users_by_ids(&self, ids: impl Iterator<Item = Uuid>) -> Vec<User> {
        ids.filter_map(|id| self.users.iter().find(|u| u.id == id).cloned()).collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        Ok(self.lock().users.clone())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            balance: new.balance,
        };
        self.lock().users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, change: UserChange) -> StoreResult<User> {
        let mut data = self.lock();
        let user = data.users.iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::not_found("user", id))?;

        if let Some(name) = change.name {
            user.name = name;
        }
        if let Some(balance) = change.balance {
            user.balance = balance;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut data = self.lock();
        if !data.user_exists(id) {
            return Err(StoreError::not_found("user", id));
        }

        data.users.retain(|u| u.id != id);
        data.profiles.retain(|p| p.user_id != id);
        data.posts.retain(|p| p.author_id != id);
        data.subscriptions.retain(|s| s.subscriber_id != id && s.author_id != id);
        Ok(())
    }

    async fn profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.lock().profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn profiles(&self) -> StoreResult<Vec<Profile>> {
        Ok(self.lock().profiles.clone())
    }

    async fn profile_of_user(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.lock().profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn profiles_with_member_type(&self, id: MemberTypeId) -> StoreResult<Vec<Profile>> {
        Ok(self.lock().profiles.iter().filter(|p| p.member_type_id == id).cloned().collect())
    }

    async fn create_profile(&self, new: NewProfile) -> StoreResult<Profile> {
        let mut data = self.lock();
        if !data.user_exists(new.user_id) {
            return Err(StoreError::ForeignKeyViolation(constraint::PROFILE_USER_FK.into()));
        }
        if data.profiles.iter().any(|p| p.user_id == new.user_id) {
            return Err(StoreError::UniqueViolation(constraint::PROFILE_USER_UNIQUE.into()));
        }

        let profile = Profile {
            id: Uuid::new_v4(),
            is_male: new.is_male,
            year_of_birth: new.year_of_birth,
            user_id: new.user_id,
            member_type_id: new.member_type_id,
        };
        data.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, id: Uuid, change: ProfileChange) -> StoreResult<Profile> {
        let mut data = self.lock();
        let profile = data.profiles.iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("profile", id))?;

        if let Some(is_male) = change.is_male {
            profile.is_male = is_male;
        }
        if let Some(year_of_birth) = change.year_of_birth {
            profile.year_of_birth = year_of_birth;
        }
        if let Some(member_type_id) = change.member_type_id {
            profile.member_type_id = member_type_id;
        }
        Ok(profile.clone())
    }

    async fn delete_profile(&self, id: Uuid) -> StoreResult<()> {
        let mut data = self.lock();
        let before = data.profiles.len();
        data.profiles.retain(|p| p.id != id);
        if data.profiles.len() == before {
            return Err(StoreError::not_found("profile", id));
        }
        Ok(())
    }

    async fn post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        Ok(self.lock().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn posts(&self) -> StoreResult<Vec<Post>> {
        Ok(self.lock().posts.clone())
    }

    async fn posts_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Post>> {
        Ok(self.lock().posts.iter().filter(|p| p.author_id == author_id).cloned().collect())
    }

    async fn create_post(&self, new: NewPost) -> StoreResult<Post> {
        let mut data = self.lock();
        if !data.user_exists(new.author_id) {
            return Err(StoreError::ForeignKeyViolation(constraint::POST_AUTHOR_FK.into()));
        }

        let post = Post {
            id: Uuid::new_v4(),
            title: new.title,
            content: new.content,
            author_id: new.author_id,
        };
        data.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: Uuid, change: PostChange) -> StoreResult<Post> {
        let mut data = self.lock();
        let post = data.posts.iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::not_found("post", id))?;

        if let Some(title) = change.title {
            post.title = title;
        }
        if let Some(content) = change.content {
            post.content = content;
        }
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        let mut data = self.lock();
        let before = data.posts.len();
        data.posts.retain(|p| p.id != id);
        if data.posts.len() == before {
            return Err(StoreError::not_found("post", id));
        }
        Ok(())
    }

    async fn member_type(&self, id: MemberTypeId) -> StoreResult<Option<MemberType>> {
        Ok(self.lock().member_types.iter().find(|m| m.id == id).cloned())
    }

    async fn member_types(&self) -> StoreResult<Vec<MemberType>> {
        Ok(self.lock().member_types.clone())
    }

    async fn authors_of(&self, subscriber_id: Uuid) -> StoreResult<Vec<User>> {
        let data = self.lock();
        let ids = data.subscriptions.iter()
            .filter(|s| s.subscriber_id == subscriber_id)
            .map(|s| s.author_id);
        Ok(data.users_by_ids(ids))
    }

    async fn subscribers_of(&self, author_id: Uuid) -> StoreResult<Vec<User>> {
        let data = self.lock();
        let ids = data.subscriptions.iter()
            .filter(|s| s.author_id == author_id)
            .map(|s| s.subscriber_id);
        Ok(data.users_by_ids(ids))
    }

    async fn subscribe(&self, edge: Subscription) -> StoreResult<Subscription> {
        let mut data = self.lock();
        if data.subscriptions.contains(&edge) {
            return Err(StoreError::UniqueViolation(constraint::SUBSCRIPTION_PKEY.into()));
        }
        if !data.user_exists(edge.subscriber_id) {
            return Err(StoreError::ForeignKeyViolation(
                constraint::SUBSCRIPTION_SUBSCRIBER_FK.into(),
            ));
        }
        if !data.user_exists(edge.author_id) {
            return Err(StoreError::ForeignKeyViolation(constraint::SUBSCRIPTION_AUTHOR_FK.into()));
        }

        data.subscriptions.push(edge);
        Ok(edge)
    }

    async fn unsubscribe(&self, edge: Subscription) -> StoreResult<()> {
        let mut data = self.lock();
        let before = data.subscriptions.len();
        data.subscriptions.retain(|s| *s != edge);
        if data.subscriptions.len() == before {
            return Err(StoreError::not_found(
                "subscription",
                format!("{} -> {}", edge.subscriber_id, edge.author_id),
            ));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::{
        model::{NewPost, NewProfile, NewUser, MemberTypeId, PostChange, ProfileChange, Subscription},
        store::{Store, StoreError, constraint},
    };
    use super::MemoryStore;

    fn new_user(name: &str) -> NewUser {
        NewUser { name: name.into(), balance: 0.0 }
    }

    #[tokio::test]
    async fn delete_user_cascades() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let bob = store.create_user(new_user("bob")).await.unwrap();

        store.create_profile(NewProfile {
            is_male: false,
            year_of_birth: 1990,
            member_type_id: MemberTypeId::Basic,
            user_id: alice.id,
        }).await.unwrap();
        store.create_post(NewPost {
            author_id: alice.id,
            title: "hello".into(),
            content: "world".into(),
        }).await.unwrap();
        store.subscribe(Subscription { subscriber_id: bob.id, author_id: alice.id })
            .await
            .unwrap();

        store.delete_user(alice.id).await.unwrap();
        assert!(store.profile_of_user(alice.id).await.unwrap().is_none());
        assert!(store.posts_by_author(alice.id).await.unwrap().is_empty());
        assert!(store.authors_of(bob.id).await.unwrap().is_empty());
        assert_eq!(store.users().await.unwrap(), vec![bob]);
    }

    #[tokio::test]
    async fn second_profile_for_user_is_rejected() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("carol")).await.unwrap();
        let new = NewProfile {
            is_male: true,
            year_of_birth: 2000,
            member_type_id: MemberTypeId::Business,
            user_id: user.id,
        };

        store.create_profile(new.clone()).await.unwrap();
        match store.create_profile(new).await {
            Err(StoreError::UniqueViolation(c)) => assert_eq!(c, constraint::PROFILE_USER_UNIQUE),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn post_for_unknown_author_is_rejected() {
        let store = MemoryStore::new();
        let result = store.create_post(NewPost {
            author_id: Uuid::new_v4(),
            title: "orphan".into(),
            content: "".into(),
        }).await;

        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));
    }

    #[tokio::test]
    async fn partial_updates_keep_other_fields() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("dana")).await.unwrap();
        let profile = store.create_profile(NewProfile {
            is_male: true,
            year_of_birth: 1975,
            member_type_id: MemberTypeId::Basic,
            user_id: user.id,
        }).await.unwrap();
        let post = store.create_post(NewPost {
            author_id: user.id,
            title: "old".into(),
            content: "kept".into(),
        }).await.unwrap();

        let profile = store.update_profile(profile.id, ProfileChange {
            year_of_birth: Some(1976),
            ..ProfileChange::default()
        }).await.unwrap();
        assert!(profile.is_male);
        assert_eq!(profile.year_of_birth, 1976);
        assert_eq!(profile.member_type_id, MemberTypeId::Basic);

        let post = store.update_post(post.id, PostChange {
            title: Some("new".into()),
            ..PostChange::default()
        }).await.unwrap();
        assert_eq!(post.title, "new");
        assert_eq!(post.content, "kept");
    }
}
