use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use inos_core::InosConfig;
use toml::{Table, Value};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user, then project, then `explicit`)
    pub fn load(explicit: Option<&Path>) -> Result<InosConfig> {
        let mut layers = vec![Self::user_config_path(), Self::project_config_path()];
        if let Some(path) = explicit {
            anyhow::ensure!(path.exists(), "Config file not found: {}", path.display());
            layers.push(path.to_path_buf());
        }
        Self::load_layers(&layers)
    }

    /// Merge every existing file in `layers`, later files winning key by key
    pub fn load_layers(layers: &[PathBuf]) -> Result<InosConfig> {
        let mut merged = Table::new();
        for path in layers.iter().filter(|path| path.exists()) {
            debug!(path = %path.display(), "Loading config layer");
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let layer: Table = contents
                .parse()
                .with_context(|| format!("Invalid TOML in {}", path.display()))?;
            merge_tables(&mut merged, layer);
        }

        let config = Value::Table(merged)
            .try_into()
            .context("Invalid inos configuration")?;
        Ok(config)
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        inos_paths::user_config_path()
    }

    /// Get project config path
    /// Can be overridden with INOS_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("INOS_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join(inos_paths::CONFIG_FILE)
        } else {
            PathBuf::from(".inos").join(inos_paths::CONFIG_FILE)
        }
    }
}

/// Overlay `overlay` onto `base`. Nested tables merge; everything else is replaced.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(nested)) => merge_tables(existing, nested),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inos_core::Assessment;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    // ==================== Layering Tests ====================

    #[test]
    fn missing_layers_give_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_layers(&[dir.path().join("nope.toml")]).unwrap();
        assert_eq!(config, InosConfig::default());
    }

    #[test]
    fn later_layer_overrides_keys_it_sets() {
        let dir = TempDir::new().unwrap();
        let user = write(
            &dir,
            "user.toml",
            "[timing]\npre_run_pause_ms = 500\ntrial_count_max = 3\n",
        );
        let project = write(&dir, "project.toml", "[timing]\ntrial_count_max = 7\n");

        let config = ConfigLoader::load_layers(&[user, project]).unwrap();

        assert_eq!(config.timing.pre_run_pause_ms, 500);
        assert_eq!(config.timing.trial_count_max, 7);
    }

    #[test]
    fn arrays_are_replaced_not_appended() {
        let dir = TempDir::new().unwrap();
        let user = write(&dir, "user.toml", "[catalog]\ndisabled = [\"gps\"]\n");
        let project = write(&dir, "project.toml", "[catalog]\ndisabled = [\"barometer\"]\n");

        let config = ConfigLoader::load_layers(&[user, project]).unwrap();

        assert_eq!(config.catalog.disabled, vec![Assessment::Barometer]);
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let dir = TempDir::new().unwrap();
        let broken = write(&dir, "broken.toml", "[timing\n");

        let err = ConfigLoader::load_layers(&[broken]).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(ConfigLoader::load(Some(&missing)).is_err());
    }

    // ==================== Path Tests ====================

    #[test]
    #[serial]
    fn project_config_path_honours_env_override() {
        let dir = TempDir::new().unwrap();
        // SAFETY: serialized with the other env-dependent tests
        unsafe { std::env::set_var("INOS_PROJECT_CONFIG_DIR", dir.path()) };
        let path = ConfigLoader::project_config_path();
        unsafe { std::env::remove_var("INOS_PROJECT_CONFIG_DIR") };

        assert_eq!(path, dir.path().join("config.toml"));
    }
}
