//! `check` subcommand: verifies the configuration, referenced files and the
//! database without starting the server or changing anything.

use crate::{
    args::{self, Args},
    config::Config,
    db,
    init,
    prelude::*,
};


pub(crate) async fn run(shared: &args::Shared, args: &Args) -> Result<()> {
    let config = init(shared, args).context("cannot run checks without a valid config")?;

    info!("Running checks");
    let outcomes = [
        ("Configuration", Ok(())),
        ("Referenced files", check_referenced_files(&config).await),
        ("Database connection & schema", check_db(&config).await),
    ];

    println!();
    bunt::println!("{$bold+blue+intense}Results{/$}");
    let mut failed = 0;
    for (label, outcome) in &outcomes {
        match outcome {
            Ok(()) => bunt::println!("  {$green+bold}✔{/$} {[bold]}", label),
            Err(e) => {
                failed += 1;
                bunt::println!("  {$red+bold}✘{/$} {[bold]}: {[yellow]}", label, e);
                for cause in e.chain().skip(1) {
                    println!("      ‣ {cause}");
                }
            }
        }
    }

    println!();
    if failed > 0 {
        bunt::println!("{$red+intense}{} check(s) failed{/$}", failed);
        std::process::exit(1);
    }

    bunt::println!("{$green+intense}All checks passed{/$}");
    Ok(())
}

async fn check_referenced_files(config: &Config) -> Result<()> {
    if let Some(path) = &config.db.server_cert {
        debug!("Trying to open '{}'", path.display());
        tokio::fs::File::open(path)
            .await
            .with_context(|| format!("could not open '{}' for reading", path.display()))?;
    }

    Ok(())
}

/// Connects to the DB and makes sure the recorded migrations match this
/// binary. Pending migrations are fine, as `serve` applies them.
async fn check_db(config: &Config) -> Result<()> {
    let pool = db::create_pool(&config.db).await?;
    let mut conn = db::get_conn(&pool).await?;
    let pending = db::pending_migrations(&mut conn).await?;
    if pending > 0 {
        info!("{pending} migration(s) will be applied on next start");
    }

    Ok(())
}
