use confique::{Config as _, toml::FormatOptions};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

use crate::prelude::*;


/// Where we look for the config file if neither `--config` nor
/// `MEMBERHUB_CONFIG_PATH` is given. The first one that exists wins.
const DEFAULT_PATHS: &[&str] = &[
    // Only debug builds look into the repository's dev config.
    #[cfg(debug_assertions)]
    "util/dev-config/config.toml",

    "config.toml",
    "/etc/memberhub/config.toml",
];

const PATH_ENV_VAR: &str = "MEMBERHUB_CONFIG_PATH";

/// The complete memberhub configuration, loaded from one TOML file.
///
/// Relative paths in the file are interpreted relative to the file itself.
#[derive(Debug, Clone, confique::Config)]
pub(crate) struct Config {
    #[config(nested)]
    pub(crate) db: crate::db::DbConfig,

    #[config(nested)]
    pub(crate) http: crate::http::HttpConfig,

    #[config(nested)]
    pub(crate) api: crate::api::ApiConfig,

    #[config(nested)]
    pub(crate) log: crate::logger::LogConfig,
}

impl Config {
    /// Loads the file named by `MEMBERHUB_CONFIG_PATH` or the first existing
    /// one of `DEFAULT_PATHS`. Also returns the path that was used.
    pub(crate) fn from_env_or_default_locations() -> Result<(Self, PathBuf)> {
        let path = match std::env::var_os(PATH_ENV_VAR) {
            Some(path) => PathBuf::from(path),
            None => DEFAULT_PATHS.iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
                .ok_or_else(|| anyhow!(
                    "no config file given and none found at the default locations ({})",
                    DEFAULT_PATHS.join(", "),
                ))?,
        };

        let config = Self::load_from(&path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?;
        Ok((config, path))
    }

    /// Reads, resolves and validates the config file at `path`.
    pub(crate) fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)
            .with_context(|| format!("could not read '{}'", path.display()))?;

        let dir = path.canonicalize()
            .context("failed to canonicalize config path")?
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow!("config path '{}' has no parent", path.display()))?;
        config.make_paths_absolute(&dir);
        config.db.validate()?;

        Ok(config)
    }

    fn make_paths_absolute(&mut self, base: &Path) {
        let paths = [self.log.file.as_mut(), self.db.server_cert.as_mut()];
        for path in paths.into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Writes a commented config template to `path` or, if that's `None`, to
/// stdout.
pub(crate) fn write_template(path: Option<&PathBuf>) -> Result<()> {
    let mut options = FormatOptions::default();
    options.general.nested_field_gap = 2;
    let template = confique::toml::template::<Config>(options);

    match path {
        Some(path) => {
            info!("Writing config template to '{}'", path.display());
            std::fs::write(path, template)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
        }
        None => std::io::stdout().write_all(template.as_bytes())?,
    }

    Ok(())
}
