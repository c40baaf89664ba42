use anyhow::{anyhow, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

lazy_static! {
    static ref GLOBAL_CONFIG_MANAGER: RwLock<Option<Arc<ConfigManager>>> = RwLock::new(None);
}

/// 环境变量前缀 / Environment variable prefix (`ALERTD_SERVER__PORT` -> `server.port`)
pub const ENV_PREFIX: &str = "ALERTD";

/// 配置错误类型 / Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: String },
    #[error("config key '{key}' not found")]
    KeyNotFound { key: String },
    #[error("config key '{key}' has an invalid value: {message}")]
    InvalidValue { key: String, message: String },
    #[error("config initialization failed: {message}")]
    InitializationError { message: String },
}

/// 配置数据源信息 / Configuration source info
#[derive(Debug, Clone)]
pub struct ConfigSourceInfo {
    pub source_type: String,
    pub description: String,
    pub priority: u8,
    pub loaded: bool,
}

/// 配置管理器 / Configuration manager
pub struct ConfigManager {
    config: Config,
    sources_info: Vec<ConfigSourceInfo>,
}

impl ConfigManager {
    /// 使用默认配置源创建 / Create with the default sources only
    pub fn new() -> Result<Self> {
        Self::with_sources(vec![])
    }

    /// 使用指定的配置源创建配置管理器（追加在默认源之后，优先级更高）
    /// Create with extra sources, appended after (and overriding) the defaults
    pub fn with_sources(sources: Vec<ConfigSource>) -> Result<Self> {
        Self::build(Self::default_sources().into_iter().chain(sources).collect())
    }

    /// 仅使用给定配置源（测试用，不读取文件与环境变量）
    /// Only the given sources, no files or environment (used by tests)
    pub fn isolated(sources: Vec<ConfigSource>) -> Result<Self> {
        Self::build(sources)
    }

    // 优先级从低到高：development.toml -> default.toml -> production.toml -> 环境变量
    // Lowest to highest: development.toml -> default.toml -> production.toml -> env
    fn default_sources() -> Vec<ConfigSource> {
        vec![
            ConfigSource::File {
                path: "config/development.toml".to_string(),
                format: Some(FileFormat::Toml),
                required: false,
            },
            ConfigSource::File {
                path: "config/default.toml".to_string(),
                format: Some(FileFormat::Toml),
                required: false,
            },
            ConfigSource::File {
                path: "config/production.toml".to_string(),
                format: Some(FileFormat::Toml),
                required: false,
            },
            ConfigSource::Env {
                prefix: ENV_PREFIX.to_string(),
                separator: "__",
            },
        ]
    }

    fn build(sources: Vec<ConfigSource>) -> Result<Self> {
        let mut builder = Config::builder();
        let mut sources_info = Vec::new();

        for (idx, source) in sources.into_iter().enumerate() {
            let info = source.get_source_info(idx as u8 + 1);

            // 可选文件不存在时跳过，必需文件不存在时报错
            // Skip a missing optional file, fail on a missing required one
            if let ConfigSource::File { path, required, .. } = &source {
                if !std::path::Path::new(path).exists() {
                    if *required {
                        return Err(ConfigError::FileNotFound { path: path.clone() }.into());
                    }
                    sources_info.push(info);
                    continue;
                }
            }

            builder = source.add_to_builder(builder)?;
            sources_info.push(ConfigSourceInfo {
                loaded: true,
                ..info
            });
        }

        let config = builder
            .build()
            .map_err(|e| anyhow!("failed to build config: {}", e))?;
        Ok(Self {
            config,
            sources_info,
        })
    }

    /// 获取指定 key 的配置值 / Get the value at `key`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.config
            .get(key)
            .map_err(|e| anyhow!("failed to read config '{}': {}", key, e))
    }

    /// 获取配置值，不存在或类型不符时返回默认值
    /// Get the value at `key`, or `default` when absent or mistyped
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// 可选配置值：不存在返回 None，类型错误返回错误
    /// Optional value: `None` when absent, an error when present but mistyped
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> std::result::Result<Option<T>, ConfigError> {
        match self.config.get::<T>(key) {
            Ok(v) => Ok(Some(v)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    /// 检查配置项是否存在 / Whether `key` is present
    pub fn exists(&self, key: &str) -> bool {
        self.config.get::<serde_json::Value>(key).is_ok()
    }

    /// 获取所有配置源信息 / All source infos
    pub fn sources_info(&self) -> &[ConfigSourceInfo] {
        &self.sources_info
    }

    /// 记录配置源加载情况 / Log which sources were loaded
    pub fn log_sources_info(&self) {
        for info in &self.sources_info {
            tracing::debug!(
                source_type = %info.source_type,
                priority = info.priority,
                loaded = info.loaded,
                "{}",
                info.description
            );
        }
        let loaded = self.sources_info.iter().filter(|i| i.loaded).count();
        tracing::info!(
            total = self.sources_info.len(),
            loaded,
            "configuration sources resolved"
        );
    }
}

/// 配置源类型 / Configuration source kinds
pub enum ConfigSource {
    /// 文件配置源 / File source
    File {
        path: String,
        format: Option<FileFormat>,
        required: bool,
    },
    /// 环境变量配置源 / Environment source
    Env {
        prefix: String,
        separator: &'static str,
    },
    /// 内存配置源（点号分隔的键） / In-memory source with dotted keys
    Memory(HashMap<String, serde_json::Value>),
    /// 字符串配置源 / Inline string source
    String { content: String, format: FileFormat },
}

fn format_name(format: Option<&FileFormat>) -> &'static str {
    match format {
        Some(FileFormat::Toml) => "TOML",
        Some(FileFormat::Yaml) => "YAML",
        Some(FileFormat::Json) => "JSON",
        Some(_) => "Other",
        None => "Auto-detect",
    }
}

impl ConfigSource {
    /// 获取配置源信息 / Describe this source
    pub fn get_source_info(&self, priority: u8) -> ConfigSourceInfo {
        let (source_type, description) = match self {
            ConfigSource::File {
                path,
                format,
                required,
            } => (
                "File",
                format!(
                    "file source: {} (format: {}, required: {})",
                    path,
                    format_name(format.as_ref()),
                    required
                ),
            ),
            ConfigSource::Env { prefix, separator } => (
                "Environment",
                format!("env source: prefix={}, separator={}", prefix, separator),
            ),
            ConfigSource::Memory(map) => ("Memory", format!("memory source: {} keys", map.len())),
            ConfigSource::String { format, .. } => (
                "String",
                format!("string source: format={}", format_name(Some(format))),
            ),
        };
        ConfigSourceInfo {
            source_type: source_type.to_string(),
            description,
            priority,
            loaded: false,
        }
    }

    pub fn add_to_builder(
        self,
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<ConfigBuilder<config::builder::DefaultState>> {
        match self {
            ConfigSource::File {
                path,
                format,
                required,
            } => {
                let file_source = match format {
                    Some(format) => File::with_name(&path).format(format),
                    None => File::with_name(&path),
                };
                Ok(builder.add_source(file_source.required(required)))
            }
            ConfigSource::Env { prefix, separator } => Ok(builder.add_source(
                Environment::with_prefix(&prefix)
                    .separator(separator)
                    .prefix_separator("_")
                    .ignore_empty(true),
            )),
            ConfigSource::Memory(map) => {
                let json_content = serde_json::to_string(&nest_dotted(map))
                    .map_err(|e| anyhow!("failed to serialize memory config: {}", e))?;
                Ok(builder.add_source(File::from_str(&json_content, FileFormat::Json)))
            }
            ConfigSource::String { content, format } => {
                Ok(builder.add_source(File::from_str(&content, format)))
            }
        }
    }
}

// 将 "a.b.c" 形式的键展开为嵌套对象
// Expand "a.b.c" keys into nested objects
fn nest_dotted(map: HashMap<String, serde_json::Value>) -> serde_json::Value {
    let mut root = serde_json::Map::new();
    for (key, value) in map {
        let mut parts: Vec<&str> = key.split('.').collect();
        let last = parts.pop().unwrap_or_default();
        let mut cursor = &mut root;
        for part in parts {
            let entry = cursor
                .entry(part.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if !entry.is_object() {
                *entry = serde_json::Value::Object(serde_json::Map::new());
            }
            cursor = match entry {
                serde_json::Value::Object(obj) => obj,
                _ => unreachable!("entry was just made an object"),
            };
        }
        cursor.insert(last.to_string(), value);
    }
    serde_json::Value::Object(root)
}

/// 安装全局配置管理器（启动时调用一次） / Install the process-wide manager at startup
pub fn install_global_config_manager(manager: ConfigManager) -> Arc<ConfigManager> {
    let manager = Arc::new(manager);
    match GLOBAL_CONFIG_MANAGER.write() {
        Ok(mut slot) => *slot = Some(Arc::clone(&manager)),
        Err(e) => tracing::warn!("global config lock poisoned: {}", e),
    }
    manager
}

/// 获取全局配置管理器实例（未安装时按默认源懒加载）
/// Get the process-wide manager (lazily built from default sources)
pub fn get_global_config_manager() -> Result<Arc<ConfigManager>> {
    {
        let manager = GLOBAL_CONFIG_MANAGER
            .read()
            .map_err(|e| anyhow!("global config read lock failed: {}", e))?;
        if let Some(ref config_manager) = *manager {
            return Ok(Arc::clone(config_manager));
        }
    }
    let mut manager = GLOBAL_CONFIG_MANAGER
        .write()
        .map_err(|e| anyhow!("global config write lock failed: {}", e))?;
    match manager.as_ref() {
        Some(existing) => Ok(Arc::clone(existing)),
        None => {
            let config_manager = Arc::new(ConfigManager::new()?);
            *manager = Some(Arc::clone(&config_manager));
            Ok(config_manager)
        }
    }
}

/// 全局配置获取函数 / Read a key from the global manager
pub fn get_config<T: DeserializeOwned>(key: &str) -> Result<T> {
    get_global_config_manager()?.get(key)
}
