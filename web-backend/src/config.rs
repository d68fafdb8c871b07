use scan_ingest_core::UploadSurface;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// 服务配置，来自环境变量（启动时先加载 .env）
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_address: String,
    pub scanner_api_url: String,
    pub scanner_timeout: Duration,
    pub max_in_flight: usize,
    pub upload_limit_bytes: usize,
    pub default_surface: UploadSurface,
    /// `/api/ingest/path` 只允许读取该目录之下的路径；未设置时该接口关闭
    pub path_root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            scanner_api_url: "http://localhost:5000".to_string(),
            scanner_timeout: Duration::from_secs(300),
            max_in_flight: scan_ingest_core::pipeline::DEFAULT_MAX_IN_FLIGHT,
            upload_limit_bytes: 1024 * 1024 * 1024,
            default_surface: UploadSurface::QuickScan,
            path_root: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意查找函数构建配置，便于测试
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let bind_address = lookup("SCAN_INGEST_BIND").unwrap_or(defaults.bind_address);
        let scanner_api_url = lookup("SCANNER_API_URL").unwrap_or(defaults.scanner_api_url);

        let scanner_timeout = match lookup("SCANNER_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse("SCANNER_TIMEOUT_SECS", &value)?),
            None => defaults.scanner_timeout,
        };

        let max_in_flight = match lookup("INGEST_MAX_IN_FLIGHT") {
            Some(value) => {
                let n: usize = parse("INGEST_MAX_IN_FLIGHT", &value)?;
                if n == 0 {
                    return Err(ConfigError::Invalid {
                        key: "INGEST_MAX_IN_FLIGHT",
                        value,
                        reason: "must be at least 1".to_string(),
                    });
                }
                n
            }
            None => defaults.max_in_flight,
        };

        let upload_limit_bytes = match lookup("INGEST_UPLOAD_LIMIT_MB") {
            Some(value) => parse::<usize>("INGEST_UPLOAD_LIMIT_MB", &value)? * 1024 * 1024,
            None => defaults.upload_limit_bytes,
        };

        let default_surface = match lookup("INGEST_DEFAULT_SURFACE") {
            Some(value) => parse("INGEST_DEFAULT_SURFACE", &value)?,
            None => defaults.default_surface,
        };

        let path_root = lookup("INGEST_PATH_ROOT")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_address,
            scanner_api_url,
            scanner_timeout,
            max_in_flight,
            upload_limit_bytes,
            default_surface,
            path_root,
        })
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.bind_address, "0.0.0.0:8000");
        assert_eq!(settings.scanner_api_url, "http://localhost:5000");
        assert_eq!(settings.max_in_flight, 32);
        assert_eq!(settings.default_surface, UploadSurface::QuickScan);
        assert!(settings.path_root.is_none());
    }

    #[test]
    fn values_are_read_from_lookup() {
        let settings = settings_from(&[
            ("SCANNER_API_URL", "http://scanner:9000"),
            ("SCANNER_TIMEOUT_SECS", "15"),
            ("INGEST_MAX_IN_FLIGHT", "4"),
            ("INGEST_UPLOAD_LIMIT_MB", "2"),
            ("INGEST_DEFAULT_SURFACE", "logic-bomb"),
            ("INGEST_PATH_ROOT", "/srv/projects"),
        ])
        .unwrap();

        assert_eq!(settings.scanner_api_url, "http://scanner:9000");
        assert_eq!(settings.scanner_timeout, Duration::from_secs(15));
        assert_eq!(settings.max_in_flight, 4);
        assert_eq!(settings.upload_limit_bytes, 2 * 1024 * 1024);
        assert_eq!(settings.default_surface, UploadSurface::LogicBomb);
        assert_eq!(settings.path_root, Some(PathBuf::from("/srv/projects")));
    }

    #[test]
    fn blank_path_root_keeps_path_ingestion_disabled() {
        let settings = settings_from(&[("INGEST_PATH_ROOT", "  ")]).unwrap();
        assert!(settings.path_root.is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(settings_from(&[("INGEST_MAX_IN_FLIGHT", "0")]).is_err());
        assert!(settings_from(&[("SCANNER_TIMEOUT_SECS", "soon")]).is_err());
        assert!(settings_from(&[("INGEST_DEFAULT_SURFACE", "admin")]).is_err());
    }
}
