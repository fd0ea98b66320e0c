//! Connection pool, TLS, schema migrations and the PostgreSQL `Store`.

use deadpool_postgres::{Config as PoolConfig, Pool, Runtime, SslMode};
use secrecy::{ExposeSecret, SecretString};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio_postgres::NoTls;
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::prelude::*;


pub(crate) mod cmd;
mod migrations;
mod store;
pub(crate) mod util;

#[cfg(test)]
mod tests;

pub(crate) use self::{
    migrations::{migrate, pending_migrations},
    store::PgStore,
};


#[derive(Debug, confique::Config, Clone)]
pub(crate) struct DbConfig {
    /// Database user.
    #[config(default = "memberhub")]
    pub(crate) user: String,

    /// Password of the database user.
    pub(crate) password: SecretString,

    /// Host of the PostgreSQL server.
    #[config(default = "127.0.0.1")]
    pub(crate) host: String,

    /// Port of the PostgreSQL server.
    #[config(default = 5432)]
    pub(crate) port: u16,

    /// Name of the database holding users, profiles, posts and subscriptions.
    #[config(default = "memberhub")]
    pub(crate) database: String,

    /// Whether to encrypt the connection.
    ///
    /// - "on": TLS is required. The server certificate must be signed by a
    ///   certificate in the system store or in `server_cert`.
    /// - "off": plain TCP. Only use this for local development.
    #[config(default = "on")]
    pub(crate) tls_mode: TlsMode,

    /// PEM file with additional X509 certificates to trust, e.g. a self
    /// signed certificate of the database server. Requires `tls_mode = "on"`.
    pub(crate) server_cert: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum TlsMode {
    Off,
    On,
}

impl DbConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.server_cert.is_some() && self.tls_mode != TlsMode::On {
            bail!(r#"`db.server_cert` only makes sense with `db.tls_mode = "on"`"#);
        }

        Ok(())
    }

    fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            user: Some(self.user.clone()),
            password: Some(self.password.expose_secret().to_owned()),
            host: Some(self.host.clone()),
            port: Some(self.port),
            dbname: Some(self.database.clone()),
            ssl_mode: Some(match self.tls_mode {
                TlsMode::Off => SslMode::Disable,
                TlsMode::On => SslMode::Require,
            }),
            application_name: Some("memberhub".into()),
            .. PoolConfig::default()
        }
    }
}

/// An owned connection checked out of the pool.
pub(crate) type DbConnection = deadpool_postgres::Object;

/// What `DbConnection` derefs to. Functions that only need a client take
/// `&mut Db`.
pub(crate) type Db = deadpool_postgres::ClientWrapper;


/// Creates the connection pool and makes sure the server is reachable and
/// uses UTF8.
pub(crate) async fn create_pool(config: &DbConfig) -> Result<Pool> {
    config.validate()?;
    debug!(
        "Connecting to 'postgresql://{}:*****@{}:{}/{}' (TLS: {:?})",
        config.user,
        config.host,
        config.port,
        config.database,
        config.tls_mode,
    );

    let pool = match config.tls_mode {
        TlsMode::Off => config.pool_config().create_pool(Some(Runtime::Tokio1), NoTls)?,
        TlsMode::On => {
            let tls = tls_connector(config.server_cert.as_deref())?;
            config.pool_config().create_pool(Some(Runtime::Tokio1), tls)?
        }
    };
    info!("Created database pool");

    check_server(&pool).await?;
    Ok(pool)
}

fn tls_connector(server_cert: Option<&Path>) -> Result<MakeRustlsConnect> {
    let mut roots = rustls::RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    for e in &native.errors {
        warn!("Failed to load a system certificate: {e}");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    debug!("Trusting {added} system certificates ({ignored} ignored)");

    if let Some(path) = server_cert {
        let added = load_pem_file(path, &mut roots)
            .with_context(|| format!("failed to load '{}'", path.display()))?;
        debug!("Trusting {added} certificates from '{}'", path.display());
    }

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let tls_config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .context("failed to configure TLS protocol versions")?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(MakeRustlsConnect::new(tls_config))
}

async fn check_server(pool: &Pool) -> Result<()> {
    let client = pool.get().await.context("failed to get DB connection")?;
    let encoding = client.query_one("show server_encoding", &[]).await
        .context("failed to query DB server")?
        .get::<_, String>(0);
    debug!("Database connection works, server encoding is {encoding}");

    if encoding != "UTF8" {
        bail!("database encoding is '{encoding}', but memberhub requires UTF8");
    }

    Ok(())
}

/// Checks out a connection, warning if the pool was slow to hand one out.
pub(crate) async fn get_conn(pool: &Pool) -> Result<DbConnection, deadpool_postgres::PoolError> {
    let before = Instant::now();
    let connection = pool.get().await
        .inspect_err(|e| error!("Failed to obtain DB connection: {e}"))?;

    let waited = before.elapsed();
    if waited > Duration::from_millis(5) {
        warn!("Waited {waited:.2?} for a DB connection");
    }

    Ok(connection)
}

/// Adds every certificate in the PEM file at `path` to `roots` and returns
/// how many there were. Other PEM items are an error.
fn load_pem_file(path: &Path, roots: &mut rustls::RootCertStore) -> Result<usize> {
    let pem = fs::read(path).context("could not read file")?;

    let mut count = 0;
    for item in rustls_pemfile::read_all(&mut &*pem) {
        let rustls_pemfile::Item::X509Certificate(cert) = item.context("invalid PEM")? else {
            bail!("expected only X509 certificates in PEM file");
        };
        roots.add(cert).context("failed to add X509 certificate")?;
        count += 1;
    }

    Ok(count)
}
