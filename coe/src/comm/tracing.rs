use anyhow::Result;
use chrono::{Datelike, Timelike};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::comm::config::ConfigManager;

struct LogTimer;

impl fmt::time::FormatTime for LogTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        let ms = now.timestamp_subsec_millis();
        let s = format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            ms
        );
        w.write_str(&s)
    }
}

/// 日志输出格式 / Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 结构化 JSON（bunyan） / Structured JSON (bunyan)
    Json,
    /// 紧凑文本 / Compact text
    Text,
}

impl LogFormat {
    /// 未知值回退到 JSON / Unknown values fall back to JSON
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "compact" => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }
}

/// 日志初始化参数 / Logging bootstrap options
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub level: String,
    pub format: LogFormat,
    pub service: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            service: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl LoggingOptions {
    /// 从配置读取 `logging.level` / `logging.format`
    /// Read `logging.level` and `logging.format` from configuration
    pub fn from_config(manager: &ConfigManager, service: &str) -> Self {
        let level = manager.get_or("logging.level", "info".to_string());
        let format = manager.get_or("logging.format", "json".to_string());
        Self {
            level: normalize_level(&level),
            format: LogFormat::parse(&format),
            service: service.to_string(),
        }
    }
}

fn normalize_level(raw: &str) -> String {
    match raw.trim().to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error") => l.to_string(),
        "warning" => "warn".to_string(),
        _ => "info".to_string(),
    }
}

/// 初始化全局日志订阅者；`RUST_LOG` 优先于配置级别
/// Install the global subscriber; `RUST_LOG` wins over the configured level
pub fn init_tracing(opts: &LoggingOptions) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(&opts.level).unwrap_or_else(|_| EnvFilter::new("info")),
    };
    LogTracer::init().ok();

    match opts.format {
        LogFormat::Json => {
            let subscriber = Registry::default()
                .with(filter)
                .with(JsonStorageLayer)
                .with(BunyanFormattingLayer::new(
                    opts.service.clone(),
                    std::io::stdout,
                ));
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        LogFormat::Text => {
            fmt::SubscriberBuilder::default()
                .with_env_filter(filter)
                .with_timer(LogTimer)
                .compact()
                .with_target(false)
                .try_init()
                .ok();
        }
    }
    Ok(())
}
