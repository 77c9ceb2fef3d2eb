use crate::error::AppError;
use crate::user::{Role, ServiceWiring, UserFactory};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKGATE_CONFIG_PATH";
const DEFAULT_USER: &str = "user";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub wiring: Option<String>,
    #[serde(default)]
    pub start_logged_in: Option<bool>,
}

impl Config {
    pub fn user_name(&self) -> &str {
        self.user
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_USER)
    }

    pub fn role(&self) -> Result<Role, AppError> {
        match self.role.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(Role::Regular),
        }
    }

    pub fn wiring(&self) -> Result<ServiceWiring, AppError> {
        match self.wiring.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(ServiceWiring::default()),
        }
    }

    pub fn user_factory(&self) -> UserFactory {
        UserFactory::new().with_logged_in_by_default(self.start_logged_in.unwrap_or(true))
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub user: Option<String>,
    pub role: Option<String>,
    pub wiring: Option<String>,
    pub start_logged_in: Option<bool>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskgate")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskgate")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(user) = overrides.user.as_ref() {
        merged.user = Some(user.clone());
    }
    if let Some(role) = overrides.role.as_ref() {
        merged.role = Some(role.clone());
    }
    if let Some(wiring) = overrides.wiring.as_ref() {
        merged.wiring = Some(wiring.clone());
    }
    if let Some(start_logged_in) = overrides.start_logged_in {
        merged.start_logged_in = Some(start_logged_in);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, load_config_from_path, load_config_with_fallback_from_path,
        merge_overrides,
    };
    use crate::user::{Role, ServiceWiring, SessionState, TaskUser};
    use crate::service::TaskService;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskgate-{nanos}-{file_name}"))
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.map(|err| err.code()), Some("invalid_data"));
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "user": "ada",
            "role": "admin",
            "wiring": "isolated",
            "start_logged_in": false
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.user_name(), "ada");
        assert_eq!(loaded.role().unwrap(), Role::Admin);
        assert_eq!(loaded.wiring().unwrap(), ServiceWiring::Isolated);
        assert_eq!(loaded.start_logged_in, Some(false));
    }

    #[test]
    fn defaults_describe_a_logged_in_regular_user_on_shared_wiring() {
        let config = Config::default();

        assert_eq!(config.user_name(), "user");
        assert_eq!(config.role().unwrap(), Role::Regular);
        assert_eq!(config.wiring().unwrap(), ServiceWiring::Shared);

        let user = config
            .user_factory()
            .create_user_with_role(Role::Regular, "x", Arc::new(TaskService::in_memory()))
            .unwrap();
        assert_eq!(user.session_state(), SessionState::LoggedIn);
    }

    #[test]
    fn unknown_role_in_config_is_invalid_role() {
        let config = Config {
            role: Some("superuser".into()),
            ..Config::default()
        };

        assert_eq!(config.role().unwrap_err().code(), "invalid_role");
    }

    #[test]
    fn merge_overrides_replaces_only_given_fields() {
        let base = Config {
            user: Some("rita".into()),
            role: Some("regular".into()),
            wiring: Some("shared".into()),
            start_logged_in: None,
        };

        let overrides = ConfigOverrides {
            role: Some("admin".into()),
            start_logged_in: Some(false),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(merged.user.as_deref(), Some("rita"));
        assert_eq!(merged.role.as_deref(), Some("admin"));
        assert_eq!(merged.wiring.as_deref(), Some("shared"));
        assert_eq!(merged.start_logged_in, Some(false));
        assert_eq!(base.role.as_deref(), Some("regular"));
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            user: Some("rita".into()),
            ..Config::default()
        };

        let merged = merge_overrides(&base, &ConfigOverrides::default());

        assert_eq!(merged, base);
    }
}
