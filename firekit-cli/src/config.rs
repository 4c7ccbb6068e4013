//! Configuration loading for the firekit CLI.

use anyhow::{Context, Result};
use firekit_client::{initialize_app, App, Config};
use std::path::{Path, PathBuf};

/// Default config file location: `<config dir>/firekit.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "ydun", "firekit")
        .context("Could not determine home directory")?;
    Ok(dirs.config_dir().join("firekit.toml"))
}

/// Load the config file, then overlay the environment.
///
/// An explicit path must exist. The default path is optional.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => Config::from_file(path).context("Failed to load config")?,
        None => {
            let path = default_config_path()?;
            if path.exists() {
                Config::from_file(&path).context("Failed to load config")?
            } else {
                tracing::debug!("No config at {}, using defaults", path.display());
                Config::default()
            }
        }
    };
    Ok(config.apply_env())
}

/// Initialize the app from a loaded config.
pub fn initialize(config: Config) -> Result<App> {
    initialize_app(config.app, config.client).context("Failed to initialize app")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_config_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[app]\nproject_id = \"demo\"\n[app.credentials]\ntype = \"emulator\"\n\n[client]\nfirestore_emulator_host = \"localhost:8080\""
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.app.project_id.as_deref(), Some("demo"));

        let app = initialize(config).unwrap();
        assert_eq!(app.project_id(), Some("demo"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = load(Some(Path::new("/nonexistent/firekit.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }

    #[test]
    fn default_path_ends_with_file_name() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("firekit.toml"));
        }
    }
}
