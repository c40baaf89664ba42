//! 应用共享状态 / Shared application state

use std::sync::Arc;

use actix_web::web;
use coe::{HealthCheck, HealthStatus};
use coe_ui::Notifier;

use crate::conf::PortalConfig;
use crate::error::AppResult;
use crate::modules::customer::CustomerStore;
use crate::modules::uischema::{seed, FormSchemaStore, ListSchemaStore};

pub struct AppState {
    pub config: PortalConfig,
    pub customers: Arc<CustomerStore>,
    pub lists: Arc<ListSchemaStore>,
    pub forms: Arc<FormSchemaStore>,
}

impl AppState {
    /// 内存存储；`ui.seed_defaults` 开启时写入缺省 schema
    /// In-memory stores, seeded when `ui.seed_defaults` is on
    pub fn in_memory(config: PortalConfig) -> AppResult<web::Data<Self>> {
        let lists = Arc::new(ListSchemaStore::new());
        let forms = Arc::new(FormSchemaStore::new());
        if config.ui.seed_defaults {
            seed::seed_defaults(&lists, &forms)?;
        }
        Ok(web::Data::new(Self {
            config,
            customers: Arc::new(CustomerStore::new()),
            lists,
            forms,
        }))
    }

    /// 单次页面渲染使用的通知队列 / Toast queue for one page render
    pub fn page_notifier(&self) -> Notifier {
        Notifier::new(self.config.ui.toast_max_visible)
    }

    pub fn page_limit(&self, requested: Option<i64>) -> i64 {
        let api = &self.config.api;
        match requested {
            Some(l) if (1..=api.page_limit_max).contains(&l) => l,
            _ => api.page_limit_default,
        }
    }

    pub fn health_checks(&self) -> Vec<Arc<dyn HealthCheck>> {
        vec![
            self.customers.clone() as Arc<dyn HealthCheck>,
            self.lists.clone() as Arc<dyn HealthCheck>,
            self.forms.clone() as Arc<dyn HealthCheck>,
        ]
    }

    /// 依次运行各存储的健康检查 / Run every store's health check
    pub async fn check_all(&self) -> Vec<HealthStatus> {
        let mut out = Vec::new();
        for check in self.health_checks() {
            out.push(check.check_health().await);
        }
        out
    }
}
