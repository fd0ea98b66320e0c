use std::ops::Deref;
use secrecy::ExposeSecret;
use tokio_postgres::{Client, NoTls};

use crate::{prelude::*, config::Config, db::{self, DbConfig, PgStore, TlsMode}};


/// Path of the config used to connect to the test database server. Can be
/// overwritten with `MEMBERHUB_TEST_CONFIG`.
const DEFAULT_TEST_CONFIG: &str = "util/dev-config/config.toml";

async fn conn(config: &DbConfig) -> Result<Client> {
    let (client, connection) = tokio_postgres::config::Config::new()
        .user(&config.user)
        .password(config.password.expose_secret())
        .dbname(&config.database)
        .host(&config.host)
        .port(config.port)
        .application_name("memberhub DB tests")
        .connect(NoTls)
        .await
        .context("could not connect to DB in test")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            panic!("PG connection error: {e}");
        }
    });

    Ok(client)
}

/// A temporary DB used for a single unit test. Is removed on drop.
///
/// Be sure to use the multi threaded Tokio runtime or else `drop` will hang
/// indefinitely!
pub(super) struct TestDb {
    store: Option<PgStore>,
    controller: Client,
    db_name: String,
}

impl TestDb {
    /// Creates a new temporary, fully migrated database with connection data
    /// from the dev config.
    pub(super) async fn with_migrations() -> Result<Self> {
        let path = std::env::var("MEMBERHUB_TEST_CONFIG")
            .unwrap_or_else(|_| DEFAULT_TEST_CONFIG.into());
        let config = Config::load_from(&path).context("failed to load config")?;

        // Create connection to original database and create a new temporary one.
        let controller = conn(&config.db).await?;
        let db_name = format!("memberhub_test_{}", rand::random::<u64>());
        controller.execute(&format!("create database {db_name}"), &[]).await
            .context("failed to create temporary test DB")?;

        let db_config = DbConfig {
            database: db_name.clone(),
            tls_mode: TlsMode::Off,
            server_cert: None,
            ..config.db
        };
        let pool = db::create_pool(&db_config).await?;
        let mut client = db::get_conn(&pool).await?;
        db::migrate(&mut client).await.context("failed to run migrations on test DB")?;
        drop(client);

        Ok(Self {
            store: Some(PgStore::new(pool)),
            controller,
            db_name,
        })
    }
}

impl Deref for TestDb {
    type Target = PgStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref().unwrap()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        // Since there is no "async drop" in Rust yet, this is a bit annoying.
        // First we drop the store (and with it, the pool) and then drop the
        // database within `block_on`. Pooled connections might still be
        // shutting down, hence `force`.
        //
        // This code requires the multi threaded Tokio runtime! :(
        drop(self.store.take());
        futures::executor::block_on(async move {
            self.controller.execute(&format!("drop database {} with (force)", self.db_name), &[])
                .await
                .expect("failed to drop temporary test DB");
        });
    }
}
