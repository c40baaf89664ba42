use std::path::Path;
use std::sync::Arc;

use coe::ConfigManager;

use crate::app_bootstrap::AppBootstrap;
use crate::conf::{self, PortalConfig};
use crate::error::AppResult;

/// 加载配置；日志初始化之前调用 / Load configuration, before tracing is initialised
pub fn load_config(extra: Option<&Path>) -> AppResult<(Arc<ConfigManager>, PortalConfig)> {
    conf::load(extra)
}

/// 处理 server 命令 / Handle the server command
pub async fn handle_server_command(config: PortalConfig) -> AppResult<()> {
    AppBootstrap::new().with_config(config).run().await
}
