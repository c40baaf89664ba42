//! 探针与根路径跳转 / Probes and the root redirect

use actix_web::{http::StatusCode, web, HttpResponse};
use coe::response::{respond_any, respond_body};

use crate::state::AppState;

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/healthz").route(web::get().to(healthz)))
        .service(web::resource("/readyz").route(web::get().to(readyz)))
        .service(web::resource("/").route(web::get().to(root)));
}

#[utoipa::path(get, path = "/healthz", tag = "System", responses((status = 200, description = "process is alive")))]
pub async fn healthz() -> HttpResponse {
    respond_body(StatusCode::OK, "ok")
}

/// 所有存储健康才就绪 / Ready only when every store reports healthy
#[utoipa::path(
    get,
    path = "/readyz",
    tag = "System",
    responses(
        (status = 200, description = "ready"),
        (status = 503, description = "component statuses")
    )
)]
pub async fn readyz(state: web::Data<AppState>) -> HttpResponse {
    let statuses = state.check_all().await;
    if statuses.iter().all(|s| s.healthy) {
        return respond_body(StatusCode::OK, "ready");
    }
    for s in statuses.iter().filter(|s| !s.healthy) {
        tracing::warn!(component = %s.component, message = ?s.message, "component not ready");
    }
    HttpResponse::ServiceUnavailable().json(statuses)
}

pub async fn root() -> HttpResponse {
    respond_any(StatusCode::FOUND, "/customers")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::PortalConfig;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_probes_and_root() {
        let state = AppState::in_memory(PortalConfig::default()).unwrap();
        let app = test::init_service(App::new().app_data(state).configure(register)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/healthz").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "ok");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/readyz").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "ready");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get("location").unwrap(), "/customers");
    }
}
