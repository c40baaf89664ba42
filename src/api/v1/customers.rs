use actix_web::{web, HttpResponse};
use coe::http::actix_ext::{created, json_ok};
use coe::http::PageQuery;
use coe::Repository;
use validator::Validate;

use crate::error::AppResult;
use crate::modules::customer::{Customer, CustomerInput, CustomerPage};
use crate::state::AppState;

/// 分页查询客户，最新优先 / Page through customers, newest first
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    tag = "Customers",
    params(
        ("limit" = Option<i64>, Query, description = "1..=100, default 20"),
        ("offset" = Option<i64>, Query, description = "negative means 0"),
        ("q" = Option<String>, Query, description = "substring match on name")
    ),
    responses((status = 200, description = "customer page", body = CustomerPage))
)]
pub async fn list_customers(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let limit = state.page_limit(query.limit);
    let offset = query.offset_or_default();
    let q = query.query();
    let (items, total) = state.customers.page(limit, offset, q.as_deref()).await?;
    Ok(json_ok(CustomerPage {
        items,
        limit,
        offset,
        q: q.unwrap_or_default(),
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    tag = "Customers",
    request_body = CustomerInput,
    responses(
        (status = 201, description = "created", body = Customer),
        (status = 400, description = "name must be 1..128 chars"),
        (status = 409, description = "customer with this name already exists")
    )
)]
pub async fn create_customer(
    state: web::Data<AppState>,
    body: web::Json<CustomerInput>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner().normalized();
    input.validate()?;
    let customer = state.customers.create(Customer::draft(&input.name)).await?;
    tracing::info!(id = customer.id, "customer created");
    Ok(created(customer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::PortalConfig;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_create_then_list() {
        let state = AppState::in_memory(PortalConfig::default()).unwrap();
        let app = test::init_service(App::new().app_data(state).configure(super::super::register)).await;

        for name in ["Acme", "  Globex  "] {
            let req = test::TestRequest::post()
                .uri("/api/v1/customers")
                .set_json(json!({ "name": name }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/v1/customers?limit=500&offset=-4&q=%20glo%20")
            .to_request();
        let page: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["limit"], 20);
        assert_eq!(page["offset"], 0);
        assert_eq!(page["q"], "glo");
        assert_eq!(page["total"], 1);
        assert_eq!(page["items"][0]["name"], "Globex");
        assert!(page["items"][0]["createdAt"].is_string());
    }

    #[actix_web::test]
    async fn test_create_rejects_bad_names() {
        let state = AppState::in_memory(PortalConfig::default()).unwrap();
        let app = test::init_service(App::new().app_data(state).configure(super::super::register)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/customers")
            .set_json(json!({ "name": "   " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "name must be 1..128 chars");

        let req = test::TestRequest::post()
            .uri("/api/v1/customers")
            .set_json(json!({ "name": "x".repeat(129) }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/customers")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid JSON");
    }

    #[actix_web::test]
    async fn test_duplicate_is_conflict() {
        let state = AppState::in_memory(PortalConfig::default()).unwrap();
        let app = test::init_service(App::new().app_data(state).configure(super::super::register)).await;
        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let req = test::TestRequest::post()
                .uri("/api/v1/customers")
                .set_json(json!({ "name": "Acme" }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), expected);
        }
    }
}
