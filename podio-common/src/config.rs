//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "podio.db";

/// Resolve the application root folder, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(root_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_root_folder())
}

/// Ensure the root folder exists and return the database path inside it
pub fn prepare_root_folder(root: &PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    Ok(root.join(DATABASE_FILE))
}

/// Locate the configuration file for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/podio/config.toml first, then /etc/podio/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("podio").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/podio/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("podio").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("podio"))
        .unwrap_or_else(|| PathBuf::from("./podio_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let root = resolve_root_folder(Some("/tmp/podio-cli"), "PODIO_TEST_UNSET_VAR").unwrap();
        assert_eq!(root, PathBuf::from("/tmp/podio-cli"));
    }

    #[test]
    fn env_var_used_when_no_cli_arg() {
        std::env::set_var("PODIO_TEST_ROOT_A", "/tmp/podio-env");
        let root = resolve_root_folder(None, "PODIO_TEST_ROOT_A").unwrap();
        assert_eq!(root, PathBuf::from("/tmp/podio-env"));
        std::env::remove_var("PODIO_TEST_ROOT_A");
    }

    #[test]
    fn falls_back_to_default() {
        let root = resolve_root_folder(None, "PODIO_TEST_UNSET_VAR").unwrap();
        assert!(root.to_string_lossy().contains("podio"));
    }
}
