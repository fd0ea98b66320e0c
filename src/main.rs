//! memberhub: a GraphQL API for users, their profiles, posts and
//! subscriptions, backed by PostgreSQL.

use std::{env, sync::Arc};

use crate::{
    args::{Args, Command},
    config::Config,
    prelude::*,
};

mod api;
mod args;
mod cmd;
mod config;
mod db;
mod http;
mod logger;
mod model;
mod prelude;
mod store;


#[tokio::main]
async fn main() {
    let Err(e) = run().await else {
        return;
    };

    // Also goes to the log file, if one is configured.
    error!("{e:?}");
    print_error(&e);
    std::process::exit(1);
}

/// Prints the error and its chain of causes to stderr.
fn print_error(e: &anyhow::Error) {
    eprintln!();
    bunt::eprintln!("{$red+bold}✘ Error:{/$} {[yellow+intense]}", e);

    let mut causes = e.chain().skip(1).peekable();
    if causes.peek().is_some() {
        bunt::eprintln!("{$red+italic}  because:{/$}");
    }
    for (depth, cause) in causes.enumerate() {
        eprintln!("  {:indent$}‣ {cause}", "", indent = depth * 2);
    }
}

async fn run() -> Result<()> {
    // Panics should come with a backtrace unless explicitly configured.
    if env::var_os("RUST_BACKTRACE").is_none() {
        env::set_var("RUST_BACKTRACE", "1");
    }

    let args = <Args as clap::Parser>::parse();
    bunt::set_stdout_color_choice(args.stdout_color());
    bunt::set_stderr_color_choice(args.stderr_color());

    match &args.cmd {
        Command::Serve { shared } => serve(init(shared, &args)?).await,
        Command::Db { cmd, shared } => db::cmd::run(cmd, &init(shared, &args)?).await,
        Command::Check { shared } => cmd::check::run(shared, &args).await,
        Command::WriteConfig { target } => config::write_template(target.as_ref()),
        Command::ExportApiSchema { args } => cmd::export_api_schema::run(args),
    }
}

/// Migrates the database and runs the HTTP server until Ctrl+C.
async fn serve(config: Config) -> Result<()> {
    info!("Starting memberhub");
    trace!("Configuration: {config:#?}");

    let pool = db::create_pool(&config.db).await
        .context("could not connect to the database")?;
    let mut conn = db::get_conn(&pool).await?;
    db::migrate(&mut conn).await
        .context("failed to migrate the database")?;

    let store = Arc::new(db::PgStore::new(pool));
    http::serve(config, api::root_node(), store).await
        .context("HTTP server failed")
}

/// Loads the config (from `--config` or the default locations) and sets up
/// logging according to it.
fn init(shared: &args::Shared, args: &Args) -> Result<Config> {
    let (config, path) = match &shared.config {
        Some(path) => (Config::load_from(path)?, path.clone()),
        None => Config::from_env_or_default_locations()?,
    };

    logger::init(&config.log, args, args.cmd_name())?;
    info!("Using config '{}'", path.display());

    Ok(config)
}
