//! 服务配置：分层读取并校验
//! Server configuration, read from the layered sources and validated

use std::path::Path;
use std::sync::Arc;

use coe::{install_global_config_manager, ConfigError, ConfigManager, ConfigSource, LoggingOptions};
use config::FileFormat;

use crate::error::{AppError, AppResult};

pub const SERVICE_NAME: &str = "alert-portal";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["json", "text"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Dev,
    Prod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiSettings {
    pub toast_max_visible: usize,
    pub seed_defaults: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub page_limit_default: i64,
    pub page_limit_max: i64,
}

/// 门户配置 / Portal configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    pub env: AppEnv,
    pub server: ServerSettings,
    pub logging_level: String,
    pub logging_format: String,
    pub ui: UiSettings,
    pub api: ApiSettings,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            env: AppEnv::Dev,
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: None,
            },
            logging_level: "info".to_string(),
            logging_format: "json".to_string(),
            ui: UiSettings {
                toast_max_visible: coe_ui::notify::DEFAULT_MAX_VISIBLE,
                seed_defaults: true,
            },
            api: ApiSettings {
                page_limit_default: 20,
                page_limit_max: 100,
            },
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> AppError {
    AppError::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    })
}

impl PortalConfig {
    /// 从配置管理器读取并校验 / Read from a manager and validate
    pub fn from_manager(manager: &ConfigManager) -> AppResult<Self> {
        let d = Self::default();

        let env = match manager.get_or("app.env", "dev".to_string()).trim() {
            "dev" => AppEnv::Dev,
            "prod" => AppEnv::Prod,
            other => return Err(invalid("app.env", format!("expected dev|prod, got '{}'", other))),
        };

        let port: i64 = manager.get_or("server.port", i64::from(d.server.port));
        if !(1..=i64::from(u16::MAX)).contains(&port) {
            return Err(invalid("server.port", format!("port must be 1..=65535, got {}", port)));
        }
        let workers: Option<i64> = manager.get_opt("server.workers")?;
        let workers = match workers {
            Some(w) if w <= 0 => {
                return Err(invalid("server.workers", "workers must be positive"));
            }
            w => w.map(|w| w as usize),
        };

        let logging_level = manager
            .get_or("logging.level", d.logging_level.clone())
            .trim()
            .to_ascii_lowercase();
        if !LOG_LEVELS.contains(&logging_level.as_str()) {
            return Err(invalid(
                "logging.level",
                format!("expected one of {}, got '{}'", LOG_LEVELS.join("|"), logging_level),
            ));
        }
        let logging_format = manager
            .get_or("logging.format", d.logging_format.clone())
            .trim()
            .to_ascii_lowercase();
        if !LOG_FORMATS.contains(&logging_format.as_str()) {
            return Err(invalid(
                "logging.format",
                format!("expected json|text, got '{}'", logging_format),
            ));
        }

        let toast_max_visible: i64 =
            manager.get_or("ui.toast_max_visible", d.ui.toast_max_visible as i64);
        if toast_max_visible < 1 {
            return Err(invalid("ui.toast_max_visible", "must be at least 1"));
        }

        let page_limit_max: i64 = manager.get_or("api.page_limit_max", d.api.page_limit_max);
        let page_limit_default: i64 =
            manager.get_or("api.page_limit_default", d.api.page_limit_default);
        if page_limit_max < 1 || !(1..=page_limit_max).contains(&page_limit_default) {
            return Err(invalid(
                "api.page_limit_default",
                format!(
                    "default {} must be within 1..={}",
                    page_limit_default, page_limit_max
                ),
            ));
        }

        Ok(Self {
            env,
            server: ServerSettings {
                host: manager.get_or("server.host", d.server.host),
                port: port as u16,
                workers,
            },
            logging_level,
            logging_format,
            ui: UiSettings {
                toast_max_visible: toast_max_visible as usize,
                seed_defaults: manager.get_or("ui.seed_defaults", d.ui.seed_defaults),
            },
            api: ApiSettings {
                page_limit_default,
                page_limit_max,
            },
        })
    }

    pub fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            level: self.logging_level.clone(),
            format: coe::LogFormat::parse(&self.logging_format),
            service: SERVICE_NAME.to_string(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 构建并安装全局配置管理器；`extra` 为命令行指定的文件（必须存在）
/// Build and install the global manager; `extra` is a CLI file that must exist
pub fn load(extra: Option<&Path>) -> AppResult<(Arc<ConfigManager>, PortalConfig)> {
    let sources = extra
        .map(|p| {
            vec![ConfigSource::File {
                path: p.to_string_lossy().into_owned(),
                format: Some(FileFormat::Toml),
                required: true,
            }]
        })
        .unwrap_or_default();
    let manager = ConfigManager::with_sources(sources).map_err(|e| {
        AppError::Config(ConfigError::InitializationError {
            message: e.to_string(),
        })
    })?;
    let config = PortalConfig::from_manager(&manager)?;
    Ok((install_global_config_manager(manager), config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(toml: &str) -> ConfigManager {
        ConfigManager::isolated(vec![ConfigSource::String {
            content: toml.to_string(),
            format: FileFormat::Toml,
        }])
        .unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let cfg = PortalConfig::from_manager(&manager("")).unwrap();
        assert_eq!(cfg, PortalConfig::default());
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_reads_all_sections() {
        let cfg = PortalConfig::from_manager(&manager(
            r#"
            [app]
            env = "prod"
            [server]
            host = "127.0.0.1"
            port = 9090
            workers = 2
            [logging]
            level = "DEBUG"
            format = "text"
            [ui]
            toast_max_visible = 3
            seed_defaults = false
            [api]
            page_limit_default = 50
            page_limit_max = 200
            "#,
        ))
        .unwrap();
        assert_eq!(cfg.env, AppEnv::Prod);
        assert_eq!(cfg.server.workers, Some(2));
        assert_eq!(cfg.logging_level, "debug");
        assert_eq!(cfg.logging_options().format, coe::LogFormat::Text);
        assert_eq!(cfg.ui.toast_max_visible, 3);
        assert!(!cfg.ui.seed_defaults);
        assert_eq!(cfg.api.page_limit_max, 200);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(PortalConfig::from_manager(&manager("[server]\nport = 0")).is_err());
        assert!(PortalConfig::from_manager(&manager("[logging]\nlevel = \"loud\"")).is_err());
        assert!(PortalConfig::from_manager(&manager("[logging]\nformat = \"xml\"")).is_err());
        assert!(PortalConfig::from_manager(&manager("[app]\nenv = \"staging\"")).is_err());
        assert!(PortalConfig::from_manager(&manager(
            "[api]\npage_limit_default = 500\npage_limit_max = 100"
        ))
        .is_err());
    }
}
