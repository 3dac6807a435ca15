use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_FALLBACK_PORT_MIN: u16 = 3000;
const DEFAULT_FALLBACK_PORT_MAX: u16 = 13000;
const DEFAULT_APP_PORT: u16 = 3000;
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_SUPERVISOR_CONF_DIR: &str = "/etc/supervisor/conf.d";
const DEFAULT_CLONE_TMP_DIR: &str = ".neup-clone-tmp";

// bash $RANDOM yields 0..=32767
pub(crate) const MAX_FALLBACK_SPAN: u32 = 32768;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Values threaded into the script generators
///
/// Generators never read the environment themselves; the same settings and
/// context always produce the same script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSettings {
    pub fallback_port_min: u16,
    pub fallback_port_max: u16,
    pub default_app_port: u16,
    pub default_branch: String,
    pub supervisor_conf_dir: String,
    pub clone_tmp_dir: String,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            fallback_port_min: DEFAULT_FALLBACK_PORT_MIN,
            fallback_port_max: DEFAULT_FALLBACK_PORT_MAX,
            default_app_port: DEFAULT_APP_PORT,
            default_branch: DEFAULT_BRANCH.to_string(),
            supervisor_conf_dir: DEFAULT_SUPERVISOR_CONF_DIR.to_string(),
            clone_tmp_dir: DEFAULT_CLONE_TMP_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NeupConfig {
    pub log_level: String,
    pub settings: ScriptSettings,
}

impl Default for NeupConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            settings: ScriptSettings::default(),
        }
    }
}

fn env_parsed<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            field: key.to_string(),
            error: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl NeupConfig {
    /// Reads `NEUPCLOUD_*` variables, falling back to defaults for unset keys
    pub fn from_env() -> Result<Self, ConfigError> {
        let log_level = env_string("NEUPCLOUD_LOG_LEVEL", DEFAULT_LOG_LEVEL).to_lowercase();

        let settings = ScriptSettings {
            fallback_port_min: env_parsed("NEUPCLOUD_FALLBACK_PORT_MIN", DEFAULT_FALLBACK_PORT_MIN)?,
            fallback_port_max: env_parsed("NEUPCLOUD_FALLBACK_PORT_MAX", DEFAULT_FALLBACK_PORT_MAX)?,
            default_app_port: env_parsed("NEUPCLOUD_DEFAULT_APP_PORT", DEFAULT_APP_PORT)?,
            default_branch: env_string("NEUPCLOUD_DEFAULT_BRANCH", DEFAULT_BRANCH),
            supervisor_conf_dir: env_string(
                "NEUPCLOUD_SUPERVISOR_CONF_DIR",
                DEFAULT_SUPERVISOR_CONF_DIR,
            ),
            clone_tmp_dir: env_string("NEUPCLOUD_CLONE_TMP_DIR", DEFAULT_CLONE_TMP_DIR),
        };

        Ok(Self {
            log_level,
            settings,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        let s = &self.settings;
        if s.fallback_port_min == 0 {
            return Err(ConfigError::ValidationFailed(
                "Fallback port range must start above 0".to_string(),
            ));
        }
        if s.fallback_port_min >= s.fallback_port_max {
            return Err(ConfigError::ValidationFailed(format!(
                "Fallback port range is empty: [{}, {})",
                s.fallback_port_min, s.fallback_port_max
            )));
        }
        let span = u32::from(s.fallback_port_max) - u32::from(s.fallback_port_min);
        if span > MAX_FALLBACK_SPAN {
            return Err(ConfigError::ValidationFailed(format!(
                "Fallback port range cannot span more than {} ports",
                MAX_FALLBACK_SPAN
            )));
        }

        if s.default_app_port == 0 {
            return Err(ConfigError::ValidationFailed(
                "Default app port must be at least 1".to_string(),
            ));
        }

        if s.clone_tmp_dir.contains('/') || s.clone_tmp_dir == "." || s.clone_tmp_dir == ".." {
            return Err(ConfigError::ValidationFailed(format!(
                "Clone temp dir must be a plain directory name: {}",
                s.clone_tmp_dir
            )));
        }

        Ok(())
    }

    pub fn settings(&self) -> &ScriptSettings {
        &self.settings
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let s = &self.settings;
        let mut map = HashMap::new();
        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert(
            "fallback_port_min".to_string(),
            s.fallback_port_min.to_string(),
        );
        map.insert(
            "fallback_port_max".to_string(),
            s.fallback_port_max.to_string(),
        );
        map.insert(
            "default_app_port".to_string(),
            s.default_app_port.to_string(),
        );
        map.insert("default_branch".to_string(), s.default_branch.clone());
        map.insert(
            "supervisor_conf_dir".to_string(),
            s.supervisor_conf_dir.clone(),
        );
        map.insert("clone_tmp_dir".to_string(), s.clone_tmp_dir.clone());
        map
    }
}

impl fmt::Display for NeupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.settings;
        writeln!(f, "Neup.Cloud Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(
            f,
            "  Fallback Ports: [{}, {})",
            s.fallback_port_min, s.fallback_port_max
        )?;
        writeln!(f, "  Default App Port: {}", s.default_app_port)?;
        writeln!(f, "  Default Branch: {}", s.default_branch)?;
        writeln!(f, "  Supervisor Conf Dir: {}", s.supervisor_conf_dir)?;
        writeln!(f, "  Clone Temp Dir: {}", s.clone_tmp_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(value) => env::set_var(&self.key, value),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    fn test_default_configuration_is_valid() {
        let config = NeupConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.settings().fallback_port_min, 3000);
        assert_eq!(config.settings().fallback_port_max, 13000);
        assert_eq!(config.settings().default_branch, "main");
    }

    #[test]
    fn test_invalid_log_level() {
        let config = NeupConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_empty_port_range() {
        let config = NeupConfig {
            settings: ScriptSettings {
                fallback_port_min: 5000,
                fallback_port_max: 5000,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_port_range_wider_than_random() {
        let config = NeupConfig {
            settings: ScriptSettings {
                fallback_port_min: 1024,
                fallback_port_max: 40000,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("32768"));
    }

    #[test]
    fn test_clone_tmp_dir_must_be_plain_name() {
        let config = NeupConfig {
            settings: ScriptSettings {
                clone_tmp_dir: "../escape".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        let _branch = EnvGuard::set("NEUPCLOUD_DEFAULT_BRANCH", "develop");
        let _min = EnvGuard::set("NEUPCLOUD_FALLBACK_PORT_MIN", "4000");
        let _level = EnvGuard::set("NEUPCLOUD_LOG_LEVEL", "DEBUG");

        let config = NeupConfig::from_env().unwrap();
        assert_eq!(config.settings().default_branch, "develop");
        assert_eq!(config.settings().fallback_port_min, 4000);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_non_numeric_port() {
        let _guard = EnvGuard::set("NEUPCLOUD_DEFAULT_APP_PORT", "eighty");

        let err = NeupConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("NEUPCLOUD_DEFAULT_APP_PORT"));
    }

    #[test]
    #[serial]
    fn test_blank_string_falls_back_to_default() {
        let _guard = EnvGuard::set("NEUPCLOUD_SUPERVISOR_CONF_DIR", "  ");

        let config = NeupConfig::from_env().unwrap();
        assert_eq!(
            config.settings().supervisor_conf_dir,
            "/etc/supervisor/conf.d"
        );
    }

    #[test]
    fn test_config_display() {
        let display = NeupConfig::default().to_string();
        assert!(display.contains("Neup.Cloud Configuration:"));
        assert!(display.contains("[3000, 13000)"));
    }

    #[test]
    fn test_display_map_has_every_setting() {
        let map = NeupConfig::default().to_display_map();
        assert_eq!(map.len(), 7);
        assert_eq!(map["clone_tmp_dir"], ".neup-clone-tmp");
    }
}
