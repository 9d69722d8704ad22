//! XDG Base Directory paths for inos.
//!
//! The bench harness and the result store resolve their files through
//! these helpers so that every entry point agrees on one layout:
//!
//! ```text
//! $XDG_CONFIG_HOME/inos/config.toml     user configuration
//! $XDG_DATA_HOME/inos/results.json      persisted pass/fail snapshot
//! ```

use std::path::PathBuf;

/// Directory name used under the XDG roots.
pub const APP_DIR: &str = "inos";

/// File name of the user configuration inside [`config_dir`].
pub const CONFIG_FILE: &str = "config.toml";

/// File name of the persisted results inside [`data_dir`].
pub const RESULTS_FILE: &str = "results.json";

/// Get the inos config directory.
///
/// Returns `$XDG_CONFIG_HOME/inos` if set, otherwise `~/.config/inos`.
///
/// # Examples
///
/// ```
/// use inos_paths::config_dir;
///
/// let config = config_dir();
/// let file = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    resolve("XDG_CONFIG_HOME", ".config")
}

/// Get the inos data directory.
///
/// Returns `$XDG_DATA_HOME/inos` if set, otherwise `~/.local/share/inos`.
pub fn data_dir() -> PathBuf {
    resolve("XDG_DATA_HOME", ".local/share")
}

/// Path of the user-level configuration file.
pub fn user_config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Default location of the persisted pass/fail snapshot.
pub fn results_path() -> PathBuf {
    data_dir().join(RESULTS_FILE)
}

fn resolve(xdg_var: &str, home_relative: &str) -> PathBuf {
    if let Ok(root) = std::env::var(xdg_var)
        && !root.is_empty()
    {
        PathBuf::from(root).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(home_relative).join(APP_DIR)
    } else {
        PathBuf::from(home_relative).join(APP_DIR)
    }
}
