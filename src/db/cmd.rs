use crate::{prelude::*, config::Config};
use super::{create_pool, get_conn, migrations::{self, Plan, MIGRATIONS}};


#[derive(Debug, clap::Subcommand)]
pub(crate) enum DbCommand {
    /// Applies all pending migrations. This also happens automatically when
    /// starting the server.
    Migrate,

    /// Lists applied and pending migrations without changing anything.
    Status,
}

/// Entry point for `db` commands.
pub(crate) async fn run(cmd: &DbCommand, config: &Config) -> Result<()> {
    let pool = create_pool(&config.db).await?;
    let mut db = get_conn(&pool).await?;

    match cmd {
        DbCommand::Migrate => migrations::migrate(&mut db).await?,
        DbCommand::Status => {
            let (applied, plan) = migrations::status(&mut db).await?;
            print_status(&applied, plan);
        }
    }

    Ok(())
}

fn print_status(applied: &[migrations::AppliedMigration], plan: Plan) {
    if plan == Plan::Bootstrap {
        bunt::println!("{$yellow}Database is empty: no migration was applied yet{/$}");
    }

    for m in applied {
        bunt::println!(
            " {$green}✔{/$} {[bold]} {} {$dimmed}(applied on {}){/$}",
            m.version,
            m.name,
            m.applied_on,
        );
    }

    let pending = plan.pending(MIGRATIONS);
    for m in pending {
        bunt::println!(" {$yellow}…{/$} {[bold]} {} {$dimmed}(pending){/$}", m.version, m.name);
    }

    println!();
    if pending.is_empty() {
        bunt::println!("{$green+intense}Schema is up to date{/$}");
    } else {
        bunt::println!("{$yellow+intense}{} pending migration(s){/$}", pending.len());
    }
}
