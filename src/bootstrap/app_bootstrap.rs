use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::{error, info, instrument};

use crate::conf::PortalConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::CorrelationIdMiddleware;
use crate::route_registry::{configure_portal_routes, portal_routes};
use crate::state::AppState;

/// 应用启动器
pub struct AppBootstrap {
    config: Option<PortalConfig>,
    state: Option<web::Data<AppState>>,
}

impl AppBootstrap {
    /// 创建新的应用启动器
    pub fn new() -> Self {
        Self {
            config: None,
            state: None,
        }
    }

    /// 设置配置
    pub fn with_config(mut self, config: PortalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 复用已构建的状态（测试或嵌入场景）/ Reuse a prepared state
    pub fn with_state(mut self, state: web::Data<AppState>) -> Self {
        self.state = Some(state);
        self
    }

    /// 设置工作线程数
    pub fn with_workers(mut self, workers: usize) -> Self {
        let mut config = self.config.unwrap_or_default();
        config.server.workers = Some(workers);
        self.config = Some(config);
        self
    }

    /// 运行应用服务器
    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        let config = self.config.clone().unwrap_or_default();
        info!(
            addr = %config.bind_addr(),
            env = ?config.env,
            workers = ?config.server.workers,
            "starting server"
        );

        let state = match self.state.clone() {
            Some(s) => s,
            None => AppState::in_memory(config.clone())?,
        };
        portal_routes().log_routes_info();

        match self.start_http_server(&config, state).await {
            Ok(()) => {
                info!("server stopped");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "server failed");
                Err(e)
            }
        }
    }

    /// 启动HTTP服务器
    async fn start_http_server(&self, config: &PortalConfig, state: web::Data<AppState>) -> AppResult<()> {
        let mut server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(CorrelationIdMiddleware::new())
                .wrap(Logger::default())
                .configure(configure_portal_routes)
        });
        if let Some(workers) = config.server.workers {
            server = server.workers(workers);
        }

        server
            .bind(config.bind_addr())
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?
            .run()
            .await
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

        Ok(())
    }
}

impl Default for AppBootstrap {
    fn default() -> Self {
        Self::new()
    }
}
