//! `config` subcommands: inspect and edit the INI settings file.
//!
//! Every subcommand works on an explicit file path (normally
//! [`config_file_path`], which honours `SIMDETECT_CONFIG`). Values are
//! reported as stored, so `config set detection.default_image_type depth_planar`
//! prints `DepthPlanar`.

use std::io::{self, Write};
use std::path::Path;

use clap::Subcommand;
use simdetect::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting (e.g. detection.default_camera)
    Get { key: String },

    /// Change one setting; an empty value clears optional keys
    Set { key: String, value: String },

    /// Print every setting with its current value
    List,

    /// Print the config file location
    Path,
}

/// Run a config subcommand against the default config file.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    let path = config_file_path();
    let stdout = io::stdout();
    execute(command, &path, &mut stdout.lock())
}

fn execute(command: ConfigCommands, path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let text = match command {
        ConfigCommands::Get { key } => {
            let key = lookup(&key)?;
            display_value(&key.get(&ConfigFile::load_from(path)?)).to_string()
        }
        ConfigCommands::Set { key, value } => {
            let key = lookup(&key)?;
            let mut config = ConfigFile::load_from(path)?;
            key.set(&mut config, &value)?;
            config.save_to(path)?;
            format!("{} = {}", key, display_value(&key.get(&config)))
        }
        ConfigCommands::List => listing(&ConfigFile::load_from(path)?),
        ConfigCommands::Path => {
            let state = if path.exists() { "" } else { " (not created yet)" };
            format!("{}{}", path.display(), state)
        }
    };
    writeln!(out, "{}", text).map_err(|e| CliError::Output(e.to_string()))
}

/// Resolve `section.key`, listing the valid names on failure.
fn lookup(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        let known: Vec<&str> = ConfigKey::all().iter().map(ConfigKey::name).collect();
        CliError::Config(format!(
            "unknown key '{}'; expected one of: {}",
            key,
            known.join(", ")
        ))
    })
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}

/// One `section.key = value` line per key, names padded to a column.
fn listing(config: &ConfigFile) -> String {
    let width = ConfigKey::all()
        .iter()
        .map(|key| key.name().len())
        .max()
        .unwrap_or(0);
    ConfigKey::all()
        .iter()
        .map(|key| {
            format!(
                "{:<width$} = {}",
                key.name(),
                display_value(&key.get(config)),
                width = width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use simdetect::config::CONFIG_ENV_VAR;
    use simdetect::ImageType;

    fn exec(command: ConfigCommands, path: &Path) -> Result<String, CliError> {
        let mut out = Vec::new();
        execute(command, path, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn set(path: &Path, key: &str, value: &str) -> Result<String, CliError> {
        exec(
            ConfigCommands::Set {
                key: key.to_string(),
                value: value.to_string(),
            },
            path,
        )
    }

    fn get(path: &Path, key: &str) -> Result<String, CliError> {
        exec(ConfigCommands::Get { key: key.to_string() }, path)
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simdetect").join("config.ini");

        set(&path, "detection.default_camera", "front_center").unwrap();
        assert_eq!(get(&path, "detection.default_camera").unwrap(), "front_center\n");

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.detection.default_camera.as_str(), "front_center");
    }

    #[test]
    fn test_set_reports_canonical_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let reply = set(&path, "detection.default_image_type", "depth_planar").unwrap();
        assert_eq!(reply, "detection.default_image_type = DepthPlanar\n");

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.detection.default_image_type, ImageType::DepthPlanar);
    }

    #[test]
    fn test_empty_value_clears_optional_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        set(&path, "detection.default_radius_m", "200").unwrap();
        assert_eq!(get(&path, "detection.default_radius_m").unwrap(), "200\n");

        let reply = set(&path, "detection.default_radius_m", "").unwrap();
        assert_eq!(reply, "detection.default_radius_m = (unset)\n");
        assert_eq!(get(&path, "detection.default_radius_m").unwrap(), "(unset)\n");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let err = get(&path, "detection.colour").unwrap_err();
        match err {
            CliError::Config(msg) => {
                assert!(msg.contains("detection.colour"));
                assert!(msg.contains("detection.default_camera"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(set(&path, "nope", "1").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_value_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        set(&path, "detection.case_sensitive", "true").unwrap();

        let err = set(&path, "detection.case_sensitive", "maybe").unwrap_err();
        assert!(matches!(err, CliError::ConfigFile(_)));
        assert_eq!(get(&path, "detection.case_sensitive").unwrap(), "true\n");
    }

    #[test]
    fn test_list_shows_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        set(&path, "logging.level", "debug").unwrap();

        let text = exec(ConfigCommands::List, &path).unwrap();
        assert_eq!(text.lines().count(), ConfigKey::all().len());
        assert!(text.contains("logging.level"));
        assert!(text.contains("= debug"));
        assert!(text.contains("logging.file"));
        assert!(text.contains("(unset)"));
    }

    #[test]
    fn test_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let text = exec(ConfigCommands::Path, &path).unwrap();
        assert!(text.contains("(not created yet)"));

        set(&path, "logging.level", "warn").unwrap();
        let text = exec(ConfigCommands::Path, &path).unwrap();
        assert!(!text.contains("(not created yet)"));
    }

    #[test]
    fn test_env_var_selects_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.ini");
        std::env::set_var(CONFIG_ENV_VAR, &path);

        let resolved = config_file_path();
        set(&resolved, "detection.default_camera", "3").unwrap();
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(resolved, path);
        assert_eq!(get(&path, "detection.default_camera").unwrap(), "3\n");
    }
}
