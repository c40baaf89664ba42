//! 活动 schema 读取 / Active schema reads

use actix_web::{web, HttpResponse};
use coe::http::actix_ext::json_ok;
use coe_ui::schema::{FormSchemaDto, ListSchema};
use coe_ui::FormKind;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListSchemaQuery {
    pub model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FormSchemaQuery {
    pub model: Option<String>,
    pub kind: Option<String>,
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[utoipa::path(
    get,
    path = "/api/v1/schema/list",
    tag = "Schema",
    params(("model" = String, Query, description = "model name, e.g. customer")),
    responses(
        (status = 200, description = "active list schema", body = ListSchema),
        (status = 400, description = "model query param is required"),
        (status = 404, description = "list schema not found")
    )
)]
pub async fn get_list_schema(
    state: web::Data<AppState>,
    query: web::Query<ListSchemaQuery>,
) -> AppResult<HttpResponse> {
    let model = non_blank(&query.model).ok_or_else(|| AppError::bad_request("model query param is required"))?;
    let schema = state
        .lists
        .get_active(model)
        .ok_or_else(|| AppError::not_found("list schema not found"))?;
    Ok(json_ok(schema))
}

#[utoipa::path(
    get,
    path = "/api/v1/schema/form",
    tag = "Schema",
    params(
        ("model" = String, Query, description = "model name"),
        ("kind" = String, Query, description = "create | edit")
    ),
    responses(
        (status = 200, description = "active form schema", body = FormSchemaDto),
        (status = 400, description = "model and kind(create|edit) are required"),
        (status = 404, description = "form schema not found")
    )
)]
pub async fn get_form_schema(
    state: web::Data<AppState>,
    query: web::Query<FormSchemaQuery>,
) -> AppResult<HttpResponse> {
    let model = non_blank(&query.model);
    let kind = non_blank(&query.kind).and_then(FormKind::parse);
    let (model, kind) = match (model, kind) {
        (Some(m), Some(k)) => (m, k),
        _ => return Err(AppError::bad_request("model and kind(create|edit) are required")),
    };
    let schema = state
        .forms
        .get_active(model, kind)
        .ok_or_else(|| AppError::not_found("form schema not found"))?;
    Ok(json_ok(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::PortalConfig;
    use actix_web::{http::StatusCode, test, App};

    fn seeded() -> web::Data<AppState> {
        AppState::in_memory(PortalConfig::default()).unwrap()
    }

    #[actix_web::test]
    async fn test_seeded_customer_list_schema() {
        let app = test::init_service(App::new().app_data(seeded()).configure(super::super::register)).await;
        let req = test::TestRequest::get().uri("/api/v1/schema/list?model=customer").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["model"], "customer");
        let fields: Vec<&str> = body["columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["id", "name", "createdAt"]);
        assert_eq!(body["columns"][0]["align"], "right");
    }

    #[actix_web::test]
    async fn test_list_schema_errors() {
        let app = test::init_service(App::new().app_data(seeded()).configure(super::super::register)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/schema/list").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "model query param is required");

        let req = test::TestRequest::get().uri("/api/v1/schema/list?model=invoice").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "list schema not found");
    }

    #[actix_web::test]
    async fn test_form_schema_reads() {
        let app = test::init_service(App::new().app_data(seeded()).configure(super::super::register)).await;

        let req = test::TestRequest::get()
            .uri("/api/v1/schema/form?model=customer&kind=create")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["kind"], "create");
        assert_eq!(body["fields"][0]["name"], "name");
        assert_eq!(body["fields"][0]["maxLen"], 128);

        let req = test::TestRequest::get()
            .uri("/api/v1/schema/form?model=customer&kind=delete")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/v1/schema/form?model=customer&kind=edit")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "form schema not found");
    }
}
