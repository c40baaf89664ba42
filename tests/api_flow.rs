use actix_web::{http::StatusCode, test, App};
use alert_portal::conf::PortalConfig;
use alert_portal::middleware::{CorrelationIdMiddleware, CORRELATION_HEADER};
use alert_portal::{configure_portal_routes, AppState};
use serde_json::{json, Value};

fn config(seed: bool) -> PortalConfig {
    let mut cfg = PortalConfig::default();
    cfg.ui.seed_defaults = seed;
    cfg
}

macro_rules! portal {
    ($seed:expr) => {
        test::init_service(
            App::new()
                .app_data(AppState::in_memory(config($seed)).unwrap())
                .wrap(CorrelationIdMiddleware::new())
                .configure(configure_portal_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn customers_rest_flow() {
    let app = portal!(true);

    for name in ["Acme", "Globex", "Initech"] {
        let req = test::TestRequest::post()
            .uri("/api/v1/customers")
            .set_json(json!({ "name": name }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert!(resp.headers().contains_key(CORRELATION_HEADER));
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/customers")
        .set_json(json!({ "name": " Acme " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "customer with this name already exists");

    let req = test::TestRequest::get().uri("/api/v1/customers?limit=2").to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["q"], "");
    assert_eq!(page["items"][0]["name"], "Initech");
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn unseeded_portal_reports_missing_schema() {
    let app = portal!(false);
    let req = test::TestRequest::get().uri("/api/v1/schema/list?model=customer").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "list schema not found");
    assert_eq!(body["message"], "list schema not found");
}

#[actix_web::test]
async fn activation_keeps_one_active_schema() {
    let app = portal!(true);

    let req = test::TestRequest::post()
        .uri("/api/v1/schema/list")
        .set_json(json!({ "model": "customer", "version": 2 }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/schema/list/{}/fields", id))
        .set_json(json!({ "field_name": "name", "field_label": "Customer", "field_type": "string" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/schema/list/{}/activate", id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/v1/schema/lists?model=customer").to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    let active: Vec<&Value> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["isActive"] == true)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"].as_u64(), Some(id));

    let req = test::TestRequest::get().uri("/api/v1/schema/list?model=customer").to_request();
    let schema: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(schema["columns"].as_array().unwrap().len(), 1);
    assert_eq!(schema["columns"][0]["label"], "Customer");
}

#[actix_web::test]
async fn system_endpoints() {
    let app = portal!(true);

    let req = test::TestRequest::get().uri("/api/v1/version").to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/healthz").to_request()).await;
    assert_eq!(test::read_body(resp).await, "ok");
    let resp = test::call_service(&app, test::TestRequest::get().uri("/readyz").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn html_pages_share_the_store_with_the_api() {
    let app = portal!(true);

    let req = test::TestRequest::post()
        .uri("/customers/create")
        .insert_header((CORRELATION_HEADER, "page-flow-1"))
        .set_form([("name", "Umbrella")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(CORRELATION_HEADER).unwrap(), "page-flow-1");

    let req = test::TestRequest::get().uri("/api/v1/customers?q=umb").to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total"], 1);
    let id = page["items"][0]["id"].as_u64().unwrap();

    let resp = test::call_service(&app, test::TestRequest::get().uri("/customers").to_request()).await;
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Umbrella"));
    assert!(html.contains("coe-toast-host"));

    let req = test::TestRequest::post()
        .uri(&format!("/customers/delete/{}", id))
        .to_request();
    let reply: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reply["ok"], true);
    assert_eq!(reply["message"], "Deleted 'Umbrella'");
}

#[actix_web::test]
async fn openapi_document_is_served() {
    let app = portal!(false);
    let req = test::TestRequest::get().uri("/api-doc/openapi.json").to_request();
    let doc: Value = test::call_and_read_body_json(&app, req).await;
    assert!(doc["paths"]["/api/v1/schema/list"].is_object());
}
