//! Versioned schema migrations.
//!
//! Every migration that was applied is recorded in the `__db_migrations` meta
//! table together with its script. On startup, the recorded migrations are
//! compared to the ones compiled into this binary and the missing ones are
//! applied, in order, in one serializable transaction.

use deadpool_postgres::Transaction;
use std::time::Duration;
use tokio_postgres::{IsolationLevel, error::SqlState};

use crate::prelude::*;
use super::{Db, util::{collect_rows_mapped, dbargs}};


/// A migration known to this binary.
#[derive(Debug)]
pub(crate) struct Migration {
    pub(crate) version: i64,
    pub(crate) name: &'static str,
    pub(crate) script: &'static str,
}

/// A migration as recorded in the meta table.
#[derive(Debug, Clone)]
pub(crate) struct AppliedMigration {
    pub(crate) version: i64,
    pub(crate) name: String,
    pub(crate) applied_on: String,
    pub(crate) script: String,
}

macro_rules! migrations {
    ($($version:literal => $name:literal),+ $(,)?) => {
        &[$(
            Migration {
                version: $version,
                name: $name,
                script: include_str!(concat!("migrations/", $name, ".sql")),
            }
        ),+]
    };
}

pub(crate) static MIGRATIONS: &[Migration] = migrations![
    1 => "01-member-types",
    2 => "02-users",
    3 => "03-profiles",
    4 => "04-posts",
    5 => "05-subscriptions",
];

/// What has to happen to bring the schema up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Plan {
    /// The meta table does not exist yet. It is created and all migrations
    /// are applied.
    Bootstrap,

    /// The first `applied` migrations are in place, the rest is pending.
    Apply { applied: usize },
}

impl Plan {
    /// Compares the recorded migrations (`None` if there is no meta table) to
    /// `known`. Fails if the recorded history is not a prefix of `known`.
    pub(crate) fn new(recorded: Option<&[AppliedMigration]>, known: &[Migration]) -> Result<Self> {
        let Some(recorded) = recorded else {
            return Ok(Self::Bootstrap);
        };

        for (i, applied) in recorded.iter().enumerate() {
            let Some(expected) = known.get(i) else {
                bail!(
                    "migration {} '{}' (applied on {}) is unknown to this memberhub binary. \
                        Is the binary older than the database?",
                    applied.version,
                    applied.name,
                    applied.applied_on,
                );
            };

            if applied.version != expected.version {
                bail!(
                    "migration history is out of order: found version {} where {} was expected",
                    applied.version,
                    expected.version,
                );
            }

            if applied.script != expected.script {
                trace!("Recorded script of migration {}:\n{}", applied.version, applied.script);
                bail!(
                    "the recorded script of migration {} '{}' (applied on {}) differs from \
                        the one in this binary",
                    applied.version,
                    applied.name,
                    applied.applied_on,
                );
            }
        }

        Ok(Self::Apply { applied: recorded.len() })
    }

    /// The migrations this plan still has to run, out of `known`.
    pub(crate) fn pending<'a>(&self, known: &'a [Migration]) -> &'a [Migration] {
        match *self {
            Self::Bootstrap => known,
            Self::Apply { applied } => &known[applied.min(known.len())..],
        }
    }
}


/// Brings the schema up to date.
///
/// Concurrent memberhub processes might try this at the same time. The
/// serializable transaction makes all but one of them fail on commit, and
/// those retry and find nothing left to do.
pub(crate) async fn migrate(db: &mut Db) -> Result<()> {
    const RETRY_DELAY: Duration = Duration::from_millis(500);

    loop {
        let tx = db.build_transaction()
            .isolation_level(IsolationLevel::Serializable)
            .start()
            .await?;

        let recorded = load_recorded(&tx).await?;
        let plan = Plan::new(recorded.as_deref(), MIGRATIONS)?;
        apply(&tx, plan).await?;

        match tx.commit().await {
            Ok(()) => return Ok(()),
            Err(e) if e.code() == Some(&SqlState::T_R_SERIALIZATION_FAILURE) => {
                warn!("Migration transaction conflicted with another one, retrying in {RETRY_DELAY:?}");
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(e).context("failed to commit migrations"),
        }
    }
}

/// Returns the recorded migrations and the plan without changing anything.
pub(crate) async fn status(db: &mut Db) -> Result<(Vec<AppliedMigration>, Plan)> {
    let tx = db.build_transaction()
        .isolation_level(IsolationLevel::RepeatableRead)
        .read_only(true)
        .start()
        .await?;

    let recorded = load_recorded(&tx).await?;
    let plan = Plan::new(recorded.as_deref(), MIGRATIONS)?;
    Ok((recorded.unwrap_or_default(), plan))
}

/// Returns how many migrations `migrate` would apply. Fails if the recorded
/// history does not match this binary.
pub(crate) async fn pending_migrations(db: &mut Db) -> Result<usize> {
    let (_, plan) = status(db).await?;
    Ok(plan.pending(MIGRATIONS).len())
}

/// Loads the meta table, or returns `None` if it does not exist. An empty
/// schema is expected in that case.
async fn load_recorded(tx: &Transaction<'_>) -> Result<Option<Vec<AppliedMigration>>> {
    let has_meta_table = tx
        .query_one("select to_regclass('__db_migrations') is not null", &[])
        .await?
        .get::<_, bool>(0);

    if !has_meta_table {
        let tables = tx
            .query("select tablename from pg_tables where schemaname = 'public'", &[])
            .await?
            .iter()
            .map(|row| row.get::<_, String>(0))
            .collect::<Vec<_>>();
        if !tables.is_empty() {
            bail!(
                "the database has tables ({}) but no '__db_migrations' table. \
                    Refusing to touch it.",
                tables.join(", "),
            );
        }
        return Ok(None);
    }

    let rows = tx
        .query_raw(
            "select id, name, applied_on::text, script from __db_migrations order by id",
            dbargs![],
        )
        .await
        .context("failed to query '__db_migrations'")?;
    let recorded = collect_rows_mapped(rows, |row| AppliedMigration {
        version: row.get(0),
        name: row.get(1),
        applied_on: row.get(2),
        script: row.get(3),
    }).await?;

    Ok(Some(recorded))
}

async fn apply(tx: &Transaction<'_>, plan: Plan) -> Result<()> {
    if plan == Plan::Bootstrap {
        info!("Empty database: creating '__db_migrations'");
        tx.batch_execute(include_str!("db-migrations.sql"))
            .await
            .context("could not create '__db_migrations'")?;
    }

    let pending = plan.pending(MIGRATIONS);
    if pending.is_empty() {
        info!("Database schema is up to date");
        return Ok(());
    }

    for migration in pending {
        info!("Applying migration {} '{}'", migration.version, migration.name);
        trace!("Script:\n{}", migration.script);
        tx.batch_execute(migration.script)
            .await
            .with_context(|| format!("migration {} '{}' failed", migration.version, migration.name))?;
        tx.execute(
            "insert into __db_migrations (id, name, applied_on, script) \
                values ($1, $2, now() at time zone 'utc', $3)",
            &[&migration.version, &migration.name, &migration.script],
        ).await.context("failed to record migration")?;
    }
    info!("Applied {} migration(s)", pending.len());

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::{AppliedMigration, Migration, Plan, MIGRATIONS};

    static KNOWN: &[Migration] = &[
        Migration { version: 1, name: "01-a", script: "create table a();" },
        Migration { version: 2, name: "02-b", script: "create table b();" },
        Migration { version: 3, name: "03-c", script: "create table c();" },
    ];

    fn recorded(m: &Migration) -> AppliedMigration {
        AppliedMigration {
            version: m.version,
            name: m.name.into(),
            applied_on: "2024-01-01 00:00:00".into(),
            script: m.script.into(),
        }
    }

    #[test]
    fn migrations_are_consecutive() {
        assert_eq!(MIGRATIONS.len(), 5);
        assert!(MIGRATIONS.iter().map(|m| m.version).eq(1..=5));
    }

    #[test]
    fn member_types_are_seeded() {
        let script = MIGRATIONS[0].script;
        assert!(script.contains("'basic'"));
        assert!(script.contains("'business'"));
    }

    #[test]
    fn missing_meta_table_bootstraps_everything() {
        let plan = Plan::new(None, KNOWN).unwrap();
        assert_eq!(plan, Plan::Bootstrap);
        assert_eq!(plan.pending(KNOWN).len(), 3);
    }

    #[test]
    fn prefix_leaves_rest_pending() {
        let applied = vec![recorded(&KNOWN[0])];
        let plan = Plan::new(Some(&applied[..]), KNOWN).unwrap();
        assert_eq!(plan, Plan::Apply { applied: 1 });
        let pending = plan.pending(KNOWN);
        assert_eq!(pending.iter().map(|m| m.version).collect::<Vec<_>>(), [2, 3]);

        let all = KNOWN.iter().map(recorded).collect::<Vec<_>>();
        assert!(Plan::new(Some(&all[..]), KNOWN).unwrap().pending(KNOWN).is_empty());
    }

    #[test]
    fn changed_script_is_rejected() {
        let mut applied = recorded(&KNOWN[0]);
        applied.script = "create table z();".into();
        assert!(Plan::new(Some(&[applied][..]), KNOWN).is_err());
    }

    #[test]
    fn unknown_or_reordered_history_is_rejected() {
        let mut four = recorded(&KNOWN[2]);
        four.version = 4;
        let too_many = vec![recorded(&KNOWN[0]), recorded(&KNOWN[1]), recorded(&KNOWN[2]), four];
        assert!(Plan::new(Some(&too_many[..]), KNOWN).is_err());

        let skipped = vec![recorded(&KNOWN[1])];
        assert!(Plan::new(Some(&skipped[..]), KNOWN).is_err());
    }
}
