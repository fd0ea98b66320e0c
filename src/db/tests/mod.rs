use crate::{
    prelude::*,
    model::{
        MemberTypeId, NewPost, NewProfile, NewUser, PostChange, ProfileChange, Subscription,
        UserChange,
    },
    store::{constraint, Store, StoreError},
};
use self::util::TestDb;

mod util;


fn new_user(name: &str, balance: f64) -> NewUser {
    NewUser { name: name.into(), balance }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a running PostgreSQL database"]
async fn member_types_are_seeded() -> Result<()> {
    let db = TestDb::with_migrations().await?;

    let basic = db.member_type(MemberTypeId::Basic).await?.context("basic missing")?;
    assert_eq!(basic.discount, 2.3);
    assert_eq!(basic.posts_limit_per_month, 20);

    let business = db.member_type(MemberTypeId::Business).await?.context("business missing")?;
    assert_eq!(business.discount, 7.7);
    assert_eq!(business.posts_limit_per_month, 100);

    assert_eq!(db.member_types().await?.len(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a running PostgreSQL database"]
async fn user_crud() -> Result<()> {
    let db = TestDb::with_migrations().await?;

    let user = db.create_user(new_user("Ann", 10.0)).await?;
    assert_eq!(db.user(user.id).await?, Some(user.clone()));

    let changed = db.update_user(user.id, UserChange {
        balance: Some(12.5),
        ..UserChange::default()
    }).await?;
    assert_eq!(changed.name, "Ann");
    assert_eq!(changed.balance, 12.5);

    db.delete_user(user.id).await?;
    assert_eq!(db.user(user.id).await?, None);
    assert!(matches!(db.delete_user(user.id).await, Err(StoreError::NotFound { .. })));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a running PostgreSQL database"]
async fn constraint_violations_are_classified() -> Result<()> {
    let db = TestDb::with_migrations().await?;
    let user = db.create_user(new_user("Bo", 0.0)).await?;

    let new_profile = NewProfile {
        is_male: true,
        year_of_birth: 1985,
        member_type_id: MemberTypeId::Basic,
        user_id: user.id,
    };
    db.create_profile(new_profile.clone()).await?;
    match db.create_profile(new_profile).await {
        Err(StoreError::UniqueViolation(c)) => assert_eq!(c, constraint::PROFILE_USER_UNIQUE),
        other => panic!("expected unique violation, got {other:?}"),
    }

    let orphan = db.create_post(NewPost {
        author_id: uuid::Uuid::new_v4(),
        title: "t".into(),
        content: "c".into(),
    }).await;
    match orphan {
        Err(StoreError::ForeignKeyViolation(c)) => assert_eq!(c, constraint::POST_AUTHOR_FK),
        other => panic!("expected foreign key violation, got {other:?}"),
    }

    let edge = Subscription { subscriber_id: user.id, author_id: user.id };
    db.subscribe(edge).await?;
    match db.subscribe(edge).await {
        Err(StoreError::UniqueViolation(c)) => assert_eq!(c, constraint::SUBSCRIPTION_PKEY),
        other => panic!("expected unique violation, got {other:?}"),
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a running PostgreSQL database"]
async fn subscriptions_and_cascades() -> Result<()> {
    let db = TestDb::with_migrations().await?;
    let reader = db.create_user(new_user("reader", 1.0)).await?;
    let writer = db.create_user(new_user("writer", 2.0)).await?;

    let post = db.create_post(NewPost {
        author_id: writer.id,
        title: "first".into(),
        content: "hello".into(),
    }).await?;
    let post = db.update_post(post.id, PostChange {
        content: Some("hello world".into()),
        ..PostChange::default()
    }).await?;
    assert_eq!(post.title, "first");
    assert_eq!(post.content, "hello world");

    db.subscribe(Subscription { subscriber_id: reader.id, author_id: writer.id }).await?;
    assert_eq!(db.authors_of(reader.id).await?, vec![writer.clone()]);
    assert_eq!(db.subscribers_of(writer.id).await?, vec![reader.clone()]);

    db.delete_user(writer.id).await?;
    assert!(db.authors_of(reader.id).await?.is_empty());
    assert!(db.posts_by_author(writer.id).await?.is_empty());
    assert_eq!(db.post(post.id).await?, None);

    let missing = Subscription { subscriber_id: reader.id, author_id: writer.id };
    assert!(matches!(db.unsubscribe(missing).await, Err(StoreError::NotFound { .. })));

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a running PostgreSQL database"]
async fn partial_profile_update() -> Result<()> {
    let db = TestDb::with_migrations().await?;
    let user = db.create_user(new_user("Cy", 3.0)).await?;
    let profile = db.create_profile(NewProfile {
        is_male: true,
        year_of_birth: 1980,
        member_type_id: MemberTypeId::Business,
        user_id: user.id,
    }).await?;

    let changed = db.update_profile(profile.id, ProfileChange {
        is_male: Some(false),
        ..ProfileChange::default()
    }).await?;
    assert!(!changed.is_male);
    assert_eq!(changed.year_of_birth, 1980);
    assert_eq!(changed.member_type_id, MemberTypeId::Business);
    assert_eq!(changed.user_id, user.id);
    assert_eq!(db.profile(profile.id).await?, Some(changed));

    let missing = db.update_profile(uuid::Uuid::new_v4(), ProfileChange::default()).await;
    assert!(matches!(missing, Err(StoreError::NotFound { .. })));

    Ok(())
}
