// coe 基础库主入口，按需导出模块
// coe foundation crate entry, exports modules on demand

pub mod comm;
pub use crate::comm::config::*;
pub use crate::comm::tracing::{init_tracing, LogFormat, LoggingOptions};

pub mod http;

// 导出通用仓库 Trait 与存储错误
// Export the generic repository trait and storage errors
pub mod repo;
pub use crate::repo::*;

#[cfg(feature = "web_actix")]
pub mod response;

// 重新导出 tracing 宏，方便上层使用
// Re-export tracing macros for downstream convenience
pub use tracing::{debug, error, info, trace, warn};

use async_trait::async_trait;

/// 健康状态结构体：用于表示组件当前健康状况
/// Health status struct: represents the current health of a component
#[derive(Debug, serde::Serialize)]
pub struct HealthStatus {
    /// 组件名称（如 customer_store、list_schema_store）
    /// Component name (e.g., customer_store, list_schema_store)
    pub component: String,
    /// 是否健康（true=健康，false=不健康）
    /// Whether healthy (true=healthy, false=unhealthy)
    pub healthy: bool,
    /// 附加消息（错误信息或提示）
    /// Additional message (error details or hint)
    pub message: Option<String>,
    /// 采样时间戳（UTC）
    /// Sample timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthStatus {
    pub fn up(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            healthy: true,
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn down(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            healthy: false,
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// 健康检查通用接口：由各服务或资源实现具体检查逻辑
/// Generic health check interface: implemented by services/resources with concrete logic
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// 执行健康检查并返回健康状态
    /// Perform health check and return the status
    async fn check_health(&self) -> HealthStatus;
}
