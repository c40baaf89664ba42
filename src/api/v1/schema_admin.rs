//! 列表 schema 管理 / List schema administration

use actix_web::{web, HttpResponse};
use coe::http::actix_ext::{created, json_ok};
use coe_ui::schema::{
    ItemsResponse, NewListField, NewListSchema, SchemaPage, StatusResponse, UiListSchema,
    UiListSchemaField,
};
use serde::Deserialize;

use super::parse_id;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SchemaListQuery {
    pub model: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/schema/lists",
    tag = "Schema admin",
    params(
        ("model" = Option<String>, Query, description = "filter by model"),
        ("limit" = Option<i64>, Query, description = "1..=100, default 20"),
        ("offset" = Option<i64>, Query)
    ),
    responses((status = 200, description = "list schemas, most recently updated first", body = SchemaPage<UiListSchema>))
)]
pub async fn list_schemas(
    state: web::Data<AppState>,
    query: web::Query<SchemaListQuery>,
) -> AppResult<HttpResponse> {
    let model = query
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let limit = state.page_limit(query.limit);
    let offset = query.offset.unwrap_or(0).max(0);
    let (items, total) = state.lists.list_schemas(model.as_deref(), limit, offset);
    Ok(json_ok(SchemaPage {
        items,
        limit,
        offset,
        total,
        model,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/schema/list",
    tag = "Schema admin",
    request_body = NewListSchema,
    responses(
        (status = 201, description = "created", body = UiListSchema),
        (status = 400, description = "model is required")
    )
)]
pub async fn create_list_schema(
    state: web::Data<AppState>,
    body: web::Json<NewListSchema>,
) -> AppResult<HttpResponse> {
    let schema = state
        .lists
        .create_schema(body.into_inner())
        .map_err(AppError::from_admin_store)?;
    Ok(created(schema))
}

#[utoipa::path(
    post,
    path = "/api/v1/schema/list/{id}/activate",
    tag = "Schema admin",
    params(("id" = u64, Path, description = "schema id")),
    responses(
        (status = 200, description = "activated", body = StatusResponse),
        (status = 400, description = "invalid schema id"),
        (status = 404, description = "schema not found")
    )
)]
pub async fn activate_list_schema(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path, "invalid schema id")?;
    state.lists.activate(id).map_err(AppError::from_admin_store)?;
    Ok(json_ok(StatusResponse {
        status: "activated".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/schema/list/{id}/fields",
    tag = "Schema admin",
    params(("id" = u64, Path, description = "schema id")),
    responses(
        (status = 200, description = "all fields, hidden included", body = ItemsResponse<UiListSchemaField>),
        (status = 404, description = "schema not found")
    )
)]
pub async fn list_fields(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path, "invalid schema id")?;
    let items = state.lists.list_fields(id).map_err(AppError::from_admin_store)?;
    Ok(json_ok(ItemsResponse { items }))
}

#[utoipa::path(
    post,
    path = "/api/v1/schema/list/{id}/fields",
    tag = "Schema admin",
    params(("id" = u64, Path, description = "schema id")),
    request_body = NewListField,
    responses(
        (status = 201, description = "created", body = UiListSchemaField),
        (status = 400, description = "invalid field"),
        (status = 404, description = "schema not found")
    )
)]
pub async fn create_list_field(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<NewListField>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path, "invalid schema id")?;
    let field = state
        .lists
        .create_field(id, body.into_inner())
        .map_err(AppError::from_admin_store)?;
    Ok(created(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::PortalConfig;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    fn unseeded() -> web::Data<AppState> {
        let mut cfg = PortalConfig::default();
        cfg.ui.seed_defaults = false;
        AppState::in_memory(cfg).unwrap()
    }

    #[actix_web::test]
    async fn test_admin_round_trip() {
        let state = unseeded();
        let app = test::init_service(App::new().app_data(state.clone()).configure(super::super::register)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/schema/list")
            .set_json(json!({ "model": "invoice" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let schema: serde_json::Value = test::read_body_json(resp).await;
        let id = schema["id"].as_u64().unwrap();
        assert_eq!(schema["isActive"], false);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/schema/list/{}/fields", id))
            .set_json(json!({ "field_name": "total", "field_label": "Total", "field_type": "number", "align": "right" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/schema/list/{}/fields", id))
            .set_json(json!({ "field_name": "total", "field_label": "Again", "field_type": "number" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "duplicate field_name");

        // 未激活前读取 404 / not readable until activated
        let req = test::TestRequest::get().uri("/api/v1/schema/list?model=invoice").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/schema/list/{}/activate", id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "activated");

        let req = test::TestRequest::get().uri("/api/v1/schema/list?model=invoice").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["columns"][0]["field"], "total");

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/schema/list/{}/fields", id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["orderNo"], 10);

        let req = test::TestRequest::get().uri("/api/v1/schema/lists?model=invoice&limit=0").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["limit"], 20);
        assert_eq!(body["model"], "invoice");
    }

    #[actix_web::test]
    async fn test_admin_errors() {
        let app = test::init_service(App::new().app_data(unseeded()).configure(super::super::register)).await;

        let req = test::TestRequest::post().uri("/api/v1/schema/list/abc/activate").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid schema id");

        let req = test::TestRequest::post().uri("/api/v1/schema/list/42/activate").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/v1/schema/list/42/fields").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/api/v1/schema/list")
            .set_json(json!({ "model": "  " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "model is required");
    }
}
