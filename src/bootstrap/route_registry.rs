use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::swagger::ApiDoc;

/// 路由配置函数类型
pub type RouteConfigFn = fn(&mut web::ServiceConfig);

/// 路由信息结构
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub name: String,
    pub description: String,
    pub module: String,
    pub config_fn: RouteConfigFn,
}

impl RouteInfo {
    pub fn new(name: &str, description: &str, module: &str, config_fn: RouteConfigFn) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            module: module.to_string(),
            config_fn,
        }
    }
}

/// 路由注册器：按注册顺序装配
/// Route registry, configured in registration order
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<RouteInfo>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// 同名路由覆盖原位置 / A route with an existing name replaces it in place
    pub fn register_route(&mut self, route_info: RouteInfo) {
        match self.routes.iter_mut().find(|r| r.name == route_info.name) {
            Some(slot) => *slot = route_info,
            None => self.routes.push(route_info),
        }
    }

    pub fn get_routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    pub fn get_routes_by_module(&self, module: &str) -> Vec<&RouteInfo> {
        self.routes.iter().filter(|r| r.module == module).collect()
    }

    /// 配置所有路由到 ServiceConfig
    pub fn configure_all_routes(&self, cfg: &mut web::ServiceConfig) {
        for route_info in &self.routes {
            (route_info.config_fn)(cfg);
        }
    }

    /// 获取路由统计信息
    pub fn get_stats(&self) -> (usize, Vec<String>) {
        let mut modules: Vec<String> = self.routes.iter().map(|r| r.module.clone()).collect();
        modules.sort();
        modules.dedup();
        (self.routes.len(), modules)
    }

    pub fn log_routes_info(&self) {
        for r in &self.routes {
            tracing::info!(name = %r.name, module = %r.module, "route group: {}", r.description);
        }
    }
}

fn swagger(cfg: &mut web::ServiceConfig) {
    // 通配路径兼容静态资源与尾随斜杠 / wildcard covers assets and the trailing slash
    cfg.service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()));
}

/// 门户的全部路由 / Every route group of the portal
pub fn portal_routes() -> RouteRegistry {
    let mut registry = RouteRegistry::new();
    registry.register_route(RouteInfo::new("swagger", "OpenAPI document and UI", "docs", swagger));
    registry.register_route(RouteInfo::new("api_v1", "REST API under /api/v1", "api", crate::api::v1::register));
    registry.register_route(RouteInfo::new(
        "customer_pages",
        "server-rendered customer pages",
        "customer",
        crate::modules::customer::pages::register,
    ));
    registry.register_route(RouteInfo::new("system", "probes and root redirect", "system", crate::api::system::register));
    registry
}

/// 配置所有门户路由
pub fn configure_portal_routes(cfg: &mut web::ServiceConfig) {
    portal_routes().configure_all_routes(cfg);
}
