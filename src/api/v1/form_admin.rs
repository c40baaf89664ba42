//! 表单 schema 管理 / Form schema administration

use actix_web::{web, HttpResponse};
use coe::http::actix_ext::{created, json_ok};
use coe_ui::schema::{
    NewFieldOption, NewFormField, NewFormSchema, StatusResponse, UiFormFieldOption, UiFormSchema,
    UiFormSchemaField,
};

use super::parse_id;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/schema/forms",
    tag = "Schema admin",
    request_body = NewFormSchema,
    responses(
        (status = 201, description = "created", body = UiFormSchema),
        (status = 400, description = "model and valid kind are required")
    )
)]
pub async fn create_form_schema(
    state: web::Data<AppState>,
    body: web::Json<NewFormSchema>,
) -> AppResult<HttpResponse> {
    let schema = state
        .forms
        .create_schema(body.into_inner())
        .map_err(AppError::from_admin_store)?;
    Ok(created(schema))
}

#[utoipa::path(
    post,
    path = "/api/v1/schema/forms/{id}/fields",
    tag = "Schema admin",
    params(("id" = u64, Path, description = "schema id")),
    request_body = NewFormField,
    responses(
        (status = 201, description = "created", body = UiFormSchemaField),
        (status = 400, description = "invalid field"),
        (status = 404, description = "schema not found")
    )
)]
pub async fn create_form_field(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<NewFormField>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path, "invalid schema id")?;
    let field = state
        .forms
        .create_field(id, body.into_inner())
        .map_err(AppError::from_admin_store)?;
    Ok(created(field))
}

#[utoipa::path(
    post,
    path = "/api/v1/schema/forms/{id}/activate",
    tag = "Schema admin",
    params(("id" = u64, Path, description = "schema id")),
    responses(
        (status = 200, description = "activated", body = StatusResponse),
        (status = 404, description = "schema not found")
    )
)]
pub async fn activate_form_schema(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path, "invalid schema id")?;
    state.forms.activate(id).map_err(AppError::from_admin_store)?;
    Ok(json_ok(StatusResponse {
        status: "activated".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/schema/forms/fields/{id}/options",
    tag = "Schema admin",
    params(("id" = u64, Path, description = "field id")),
    request_body = NewFieldOption,
    responses(
        (status = 201, description = "created", body = UiFormFieldOption),
        (status = 400, description = "invalid field id"),
        (status = 404, description = "field not found")
    )
)]
pub async fn add_field_option(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<NewFieldOption>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path, "invalid field id")?;
    let option = state
        .forms
        .add_option(id, body.into_inner())
        .map_err(AppError::from_admin_store)?;
    Ok(created(option))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::PortalConfig;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_select_field_with_options() {
        let state = AppState::in_memory(PortalConfig::default()).unwrap();
        let app = test::init_service(App::new().app_data(state).configure(super::super::register)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/schema/forms")
            .set_json(json!({ "model": "customer", "kind": "edit", "is_active": true }))
            .to_request();
        let schema: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let schema_id = schema["id"].as_u64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/schema/forms/{}/fields", schema_id))
            .set_json(json!({ "field_name": "tier", "field_label": "Tier", "widget": "select", "required": true }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let field: serde_json::Value = test::read_body_json(resp).await;
        let field_id = field["id"].as_u64().unwrap();

        for (label, value, order) in [("Gold", "gold", 20), ("Silver", "silver", 10)] {
            let req = test::TestRequest::post()
                .uri(&format!("/api/v1/schema/forms/fields/{}/options", field_id))
                .set_json(json!({ "label": label, "value": value, "order_no": order }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/v1/schema/form?model=customer&kind=edit")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["fields"][0]["options"][0]["value"], "silver");
        assert_eq!(body["fields"][0]["options"][1]["value"], "gold");
    }

    #[actix_web::test]
    async fn test_form_admin_errors() {
        let state = AppState::in_memory(PortalConfig::default()).unwrap();
        let app = test::init_service(App::new().app_data(state).configure(super::super::register)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/schema/forms")
            .set_json(json!({ "model": "customer", "kind": "view" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/schema/forms/fields/x/options")
            .set_json(json!({ "label": "A", "value": "a" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid field id");

        let req = test::TestRequest::post()
            .uri("/api/v1/schema/forms/fields/999/options")
            .set_json(json!({ "label": "A", "value": "a" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post().uri("/api/v1/schema/forms/999/activate").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
