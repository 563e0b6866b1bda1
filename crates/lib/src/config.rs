//! Client settings and loading.
//!
//! Settings come from an optional JSON file (e.g. `~/.atypica/inbound.json`) and the
//! `ATYPICA_*` environment. Env wins over the file; the file wins over built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::protocol::ResponseMode;

const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:18789";
const DEFAULT_USER_ID: &str = "testuser";
const DEFAULT_PROJECT_ID: &str = "main";
const DEFAULT_INBOUND_API_KEY: &str = "test";
const DEFAULT_RESPONSE_MODE: &str = "sync";

pub const ENV_GATEWAY_URL: &str = "ATYPICA_GATEWAY_URL";
pub const ENV_USER_ID: &str = "ATYPICA_USER_ID";
pub const ENV_PROJECT_ID: &str = "ATYPICA_PROJECT_ID";
pub const ENV_INBOUND_API_KEY: &str = "ATYPICA_INBOUND_API_KEY";
pub const ENV_RESPONSE_MODE: &str = "ATYPICA_RESPONSE_MODE";
pub const ENV_CONFIG_PATH: &str = "ATYPICA_CONFIG_PATH";

/// On-disk settings file. Every field is optional; absent fields fall through to env or defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub gateway_url: Option<String>,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    /// Bearer token for the inbound API. Overridden by ATYPICA_INBOUND_API_KEY (even when empty).
    pub inbound_api_key: Option<String>,
    /// "sync" or anything else (treated as async).
    pub response_mode: Option<String>,
}

/// Resolved settings used by the client and the run flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Gateway base URL without a trailing slash.
    pub gateway_url: String,
    pub user_id: String,
    pub project_id: String,
    /// None when no key is configured; requests then carry no Authorization header.
    pub inbound_api_key: Option<String>,
    pub response_mode: ResponseMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&FileConfig::default(), |_| None)
    }
}

impl Settings {
    /// Merge a file config with an env lookup. `env` returns the raw variable value, if set.
    pub fn resolve<F>(file: &FileConfig, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |var: &str, from_file: &Option<String>, default: &str| -> String {
            env(var)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    from_file
                        .as_ref()
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                })
                .unwrap_or_else(|| default.to_string())
        };

        // An explicitly empty env key disables auth, so it is not filtered before the fallback.
        let inbound_api_key = match env(ENV_INBOUND_API_KEY) {
            Some(k) => k.trim().to_string(),
            None => file
                .inbound_api_key
                .clone()
                .unwrap_or_else(|| DEFAULT_INBOUND_API_KEY.to_string())
                .trim()
                .to_string(),
        };

        // A set mode variable is normalized as-is; an empty value means async.
        let response_mode = match env(ENV_RESPONSE_MODE) {
            Some(m) => ResponseMode::normalize(&m),
            None => ResponseMode::normalize(
                file.response_mode.as_deref().unwrap_or(DEFAULT_RESPONSE_MODE),
            ),
        };

        Self {
            gateway_url: pick(ENV_GATEWAY_URL, &file.gateway_url, DEFAULT_GATEWAY_URL)
                .trim_end_matches('/')
                .to_string(),
            user_id: pick(ENV_USER_ID, &file.user_id, DEFAULT_USER_ID),
            project_id: pick(ENV_PROJECT_ID, &file.project_id, DEFAULT_PROJECT_ID),
            inbound_api_key: Some(inbound_api_key).filter(|k| !k.is_empty()),
            response_mode,
        }
    }
}

/// Resolve settings file path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".atypica").join("inbound.json"))
                .unwrap_or_else(|| PathBuf::from("inbound.json"))
        })
}

/// Read the settings file at `path` (or the default path). Missing file => empty file config.
pub fn load_file_config(path: Option<PathBuf>) -> Result<(FileConfig, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("settings file not found, using env and defaults: {}", path.display());
        FileConfig::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing settings from {}", path.display()))?
    };
    Ok((config, path))
}

/// Load the settings file and apply the process environment on top.
pub fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    let (file, path) = load_file_config(path)?;
    let settings = Settings::resolve(&file, |var| std::env::var(var).ok());
    log::debug!(
        "settings resolved (file {}): gateway={} user={} project={}",
        path.display(),
        settings.gateway_url,
        settings.user_id,
        settings.project_id
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env_or_file() {
        let s = Settings::default();
        assert_eq!(s.gateway_url, "http://127.0.0.1:18789");
        assert_eq!(s.user_id, "testuser");
        assert_eq!(s.project_id, "main");
        assert_eq!(s.inbound_api_key.as_deref(), Some("test"));
        assert_eq!(s.response_mode, ResponseMode::Sync);
    }

    #[test]
    fn env_overrides_file() {
        let file = FileConfig {
            gateway_url: Some("http://file:1".into()),
            user_id: Some("file-user".into()),
            ..FileConfig::default()
        };
        let s = Settings::resolve(
            &file,
            env_of(&[(ENV_GATEWAY_URL, "http://env:2/"), (ENV_RESPONSE_MODE, "ASYNC")]),
        );
        assert_eq!(s.gateway_url, "http://env:2");
        assert_eq!(s.user_id, "file-user");
        assert_eq!(s.response_mode, ResponseMode::Async);
    }

    #[test]
    fn empty_env_key_disables_auth() {
        let file = FileConfig {
            inbound_api_key: Some("from-file".into()),
            ..FileConfig::default()
        };
        let s = Settings::resolve(&file, env_of(&[(ENV_INBOUND_API_KEY, "")]));
        assert_eq!(s.inbound_api_key, None);
    }

    #[test]
    fn file_key_used_when_env_unset() {
        let file = FileConfig {
            inbound_api_key: Some("from-file".into()),
            ..FileConfig::default()
        };
        let s = Settings::resolve(&file, env_of(&[]));
        assert_eq!(s.inbound_api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn unknown_mode_normalizes_to_async() {
        let s = Settings::resolve(&FileConfig::default(), env_of(&[(ENV_RESPONSE_MODE, "later")]));
        assert_eq!(s.response_mode, ResponseMode::Async);
    }

    #[test]
    fn empty_mode_env_normalizes_to_async() {
        let file = FileConfig {
            response_mode: Some("sync".into()),
            ..FileConfig::default()
        };
        for raw in ["", "   "] {
            let s = Settings::resolve(&file, env_of(&[(ENV_RESPONSE_MODE, raw)]));
            assert_eq!(s.response_mode, ResponseMode::Async, "{:?}", raw);
        }
        let s = Settings::resolve(&file, env_of(&[]));
        assert_eq!(s.response_mode, ResponseMode::Sync);
    }

    #[test]
    fn empty_identity_env_falls_back() {
        let s = Settings::resolve(
            &FileConfig::default(),
            env_of(&[(ENV_USER_ID, ""), (ENV_PROJECT_ID, " ")]),
        );
        assert_eq!(s.user_id, "testuser");
        assert_eq!(s.project_id, "main");
    }

    #[test]
    fn missing_file_yields_empty_config() {
        let path = std::env::temp_dir().join(format!("atypica-missing-{}.json", uuid::Uuid::new_v4()));
        let (file, used) = load_file_config(Some(path.clone())).expect("missing file is not an error");
        assert_eq!(used, path);
        assert!(file.gateway_url.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("atypica-bad-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"{not json").expect("write settings");
        let err = load_file_config(Some(path.clone())).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing settings"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn file_fields_are_camel_case() {
        let file: FileConfig =
            serde_json::from_str(r#"{"gatewayUrl":"http://x:9","projectId":"p1","responseMode":"async"}"#)
                .expect("parse");
        let s = Settings::resolve(&file, env_of(&[]));
        assert_eq!(s.gateway_url, "http://x:9");
        assert_eq!(s.project_id, "p1");
        assert_eq!(s.response_mode, ResponseMode::Async);
    }
}
