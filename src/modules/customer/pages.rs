//! 服务端渲染的客户页面 / Server-rendered customer pages

use actix_web::{
    http::StatusCode,
    web::{self, Data, Form, Path, Query},
    HttpRequest, HttpResponse,
};
use coe::response::{respond_any, respond_body};
use coe::{Repository, StoreError};
use coe_ui::server::{
    render_data_table, render_form, Confirm, DataTableColumn, DataTableModel, DataTableRow,
    FormButton, FormField, FormModel, HeaderAction, Pagination, RowAction,
};
use coe_ui::{el, Node};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::flash::Flash;
use super::model::{Customer, CustomerInput, NAME_MAX_CHARS};
use crate::error::{AppError, AppResult};
use crate::middleware::CorrelationId;
use crate::modules::layout;
use crate::state::AppState;

pub const BASE: &str = "/customers";
pub const PAGE_SIZE: u64 = 10;

pub const DUPLICATE_ON_CREATE: &str = "A customer with this name already exists.";
pub const DUPLICATE_ON_EDIT: &str = "Another customer already has this name.";
pub const CREATED: &str = "Customer created.";
pub const UPDATED: &str = "Customer updated.";

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource(BASE).route(web::get().to(index)))
        .service(
            web::resource(format!("{}/create", BASE))
                .route(web::get().to(create_page))
                .route(web::post().to(create_submit)),
        )
        .service(
            web::resource(format!("{}/edit/{{id}}", BASE))
                .route(web::get().to(edit_page))
                .route(web::post().to(edit_submit)),
        )
        .service(web::resource(format!("{}/delete/{{id}}", BASE)).route(web::post().to(delete)));
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub page: Option<u64>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteReply {
    pub ok: bool,
    pub message: String,
}

fn sorry(cid: &CorrelationId) -> String {
    format!("Sorry, something went wrong. Ref: {}", cid)
}

fn html(status: StatusCode, title: &str, content: Vec<Node>) -> HttpResponse {
    respond_body(status, layout::page(title, content, &[]))
}

fn search_toolbar(q: &str) -> Node {
    el("form")
        .class("d-flex gap-2")
        .attr("method", "get")
        .attr("action", BASE)
        .attr("role", "search")
        .child(
            el("input")
                .class("form-control form-control-sm")
                .attr("type", "search")
                .attr("name", "q")
                .attr("placeholder", "Search by name")
                .attr("value", q),
        )
        .child(
            el("button")
                .class("btn btn-sm btn-outline-secondary")
                .attr("type", "submit")
                .text("Search"),
        )
        .into()
}

pub fn customer_table(items: &[Customer], page: u64, total: u64, q: &str) -> DataTableModel {
    let rows = items
        .iter()
        .map(|c| {
            DataTableRow::default()
                .cell("id", c.id.to_string())
                .cell("name", c.name.as_str())
                .cell("createdAt", c.created_at.format("%Y-%m-%d %H:%M:%S").to_string())
                .action(RowAction::link("Edit", &format!("{}/edit/{}", BASE, c.id)))
                .action(RowAction::ajax_delete(
                    "Delete",
                    &format!("{}/delete/{}", BASE, c.id),
                    &c.name,
                    Confirm::new(format!("Delete {}?", c.name), "This action cannot be undone."),
                ))
        })
        .collect();

    let keep = if q.is_empty() {
        Vec::new()
    } else {
        vec![("q".to_string(), q.to_string())]
    };

    DataTableModel {
        id: Some("customers-table".to_string()),
        title: Some("Customers".to_string()),
        header_action: Some(HeaderAction {
            href: format!("{}/create", BASE),
            ..HeaderAction::default()
        }),
        toolbar: vec![search_toolbar(q)],
        pager: Some(Pagination {
            page,
            page_size: PAGE_SIZE,
            total_items: total,
            keep,
            ..Pagination::default()
        }),
        columns: vec![
            DataTableColumn::new("ID", "id").align("text-end").width("90px"),
            DataTableColumn::new("Name", "name"),
            DataTableColumn::new("Created", "createdAt").width("200px"),
        ],
        rows,
        ..DataTableModel::default()
    }
}

pub fn customer_form(action: &str, name: &str, name_error: Option<&str>, errors: Vec<String>) -> FormModel {
    let mut field = FormField::text("name", "Name")
        .value(name)
        .placeholder("Enter customer name")
        .required()
        .max_length(NAME_MAX_CHARS as u32);
    if let Some(msg) = name_error {
        field = field.error(msg);
    }
    FormModel {
        id: Some("customer-form".to_string()),
        action: action.to_string(),
        fields: vec![field],
        buttons: vec![FormButton::submit("Save"), FormButton::cancel(BASE)],
        errors,
        ..FormModel::default()
    }
}

fn form_page(title: &str, form: &FormModel) -> HttpResponse {
    html(
        StatusCode::OK,
        title,
        vec![
            el("h1").class("h3 mb-3").text(title).into(),
            render_form(form),
        ],
    )
}

fn not_found_page() -> HttpResponse {
    html(
        StatusCode::NOT_FOUND,
        "Not found",
        vec![
            el("h1").class("h3").text("Customer not found").into(),
            el("a").attr("href", BASE).text("Back to customers").into(),
        ],
    )
}

/// 成功后写 flash 并 303 跳回列表 / On success set the flash and 303 back to the list
fn redirect_with_flash(flash: Flash) -> HttpResponse {
    let mut resp = respond_any(StatusCode::SEE_OTHER, BASE);
    if let Err(e) = resp.add_cookie(&flash.to_cookie()) {
        tracing::warn!(error = %e, "failed to set flash cookie");
    }
    resp
}

/// 提交校验，返回字段错误 / Validate a submission, returning the field error
fn name_error(input: &CustomerInput) -> Option<String> {
    input.validate().err().map(|errs| match AppError::from(errs) {
        AppError::BadRequest { message, .. } => message,
        other => other.to_string(),
    })
}

pub async fn index(
    req: HttpRequest,
    state: Data<AppState>,
    query: Query<IndexQuery>,
    cid: CorrelationId,
) -> HttpResponse {
    let page = query.page.unwrap_or(1).max(1);
    let q = query.q.as_deref().map(str::trim).unwrap_or_default().to_string();
    let filter = if q.is_empty() { None } else { Some(q.as_str()) };
    let offset = coe::http::page_offset(page, PAGE_SIZE as i64);

    let (items, total) = match state.customers.page(PAGE_SIZE as i64, offset, filter).await {
        Ok(found) => found,
        Err(e) => {
            tracing::error!(correlation_id = %cid, error = %e, "customer list failed");
            return html(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Customers",
                vec![el("div").class("alert alert-danger").text(sorry(&cid)).into()],
            );
        }
    };

    let notifier = state.page_notifier();
    let flash = Flash::from_request(&req);
    if let Some(f) = &flash {
        f.raise(&notifier);
    }

    let table = customer_table(&items, page, total, &q);
    let mut resp = respond_body(
        StatusCode::OK,
        layout::page("Customers", vec![render_data_table(&table)], &notifier.visible()),
    );
    if flash.is_some() {
        if let Err(e) = resp.add_cookie(&Flash::removal()) {
            tracing::warn!(error = %e, "failed to clear flash cookie");
        }
    }
    resp
}

pub async fn create_page() -> HttpResponse {
    let form = customer_form(&format!("{}/create", BASE), "", None, Vec::new());
    form_page("New customer", &form)
}

pub async fn create_submit(
    state: Data<AppState>,
    cid: CorrelationId,
    form: Form<CustomerInput>,
) -> HttpResponse {
    let action = format!("{}/create", BASE);
    let input = form.into_inner().normalized();
    if let Some(msg) = name_error(&input) {
        let form = customer_form(&action, &input.name, Some(&msg), Vec::new());
        return form_page("New customer", &form);
    }
    if state.customers.name_taken(&input.name, None) {
        let form = customer_form(&action, &input.name, Some(DUPLICATE_ON_CREATE), Vec::new());
        return form_page("New customer", &form);
    }

    match state.customers.create(Customer::draft(&input.name)).await {
        Ok(c) => {
            tracing::info!(correlation_id = %cid, id = c.id, "customer created");
            redirect_with_flash(Flash::success(CREATED))
        }
        Err(StoreError::Duplicate(_)) => {
            let form = customer_form(&action, &input.name, Some(DUPLICATE_ON_CREATE), Vec::new());
            form_page("New customer", &form)
        }
        Err(e) => {
            tracing::error!(correlation_id = %cid, error = %e, "customer create failed");
            let form = customer_form(&action, &input.name, None, vec![sorry(&cid)]);
            form_page("New customer", &form)
        }
    }
}

pub async fn edit_page(state: Data<AppState>, cid: CorrelationId, id: Path<u64>) -> HttpResponse {
    let id = id.into_inner();
    match state.customers.read_one(id).await {
        Ok(Some(c)) => {
            let form = customer_form(&format!("{}/edit/{}", BASE, id), &c.name, None, Vec::new());
            form_page("Edit customer", &form)
        }
        Ok(None) => not_found_page(),
        Err(e) => {
            tracing::error!(correlation_id = %cid, error = %e, "customer read failed");
            let form = customer_form(&format!("{}/edit/{}", BASE, id), "", None, vec![sorry(&cid)]);
            form_page("Edit customer", &form)
        }
    }
}

pub async fn edit_submit(
    state: Data<AppState>,
    cid: CorrelationId,
    id: Path<u64>,
    form: Form<CustomerInput>,
) -> HttpResponse {
    let id = id.into_inner();
    let action = format!("{}/edit/{}", BASE, id);
    let input = form.into_inner().normalized();

    match state.customers.read_one(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found_page(),
        Err(e) => {
            tracing::error!(correlation_id = %cid, error = %e, "customer read failed");
            let form = customer_form(&action, &input.name, None, vec![sorry(&cid)]);
            return form_page("Edit customer", &form);
        }
    }
    if let Some(msg) = name_error(&input) {
        let form = customer_form(&action, &input.name, Some(&msg), Vec::new());
        return form_page("Edit customer", &form);
    }
    if state.customers.name_taken(&input.name, Some(id)) {
        let form = customer_form(&action, &input.name, Some(DUPLICATE_ON_EDIT), Vec::new());
        return form_page("Edit customer", &form);
    }

    let mut row = Customer::draft(&input.name);
    row.id = id;
    match state.customers.update(row).await {
        Ok(_) => {
            tracing::info!(correlation_id = %cid, id, "customer updated");
            redirect_with_flash(Flash::success(UPDATED))
        }
        Err(StoreError::NotFound(_)) => not_found_page(),
        Err(StoreError::Duplicate(_)) => {
            let form = customer_form(&action, &input.name, Some(DUPLICATE_ON_EDIT), Vec::new());
            form_page("Edit customer", &form)
        }
        Err(e) => {
            tracing::error!(correlation_id = %cid, error = %e, "customer update failed");
            let form = customer_form(&action, &input.name, None, vec![sorry(&cid)]);
            form_page("Edit customer", &form)
        }
    }
}

/// AJAX 删除，返回 `{ok, message}` / AJAX delete returning `{ok, message}`
pub async fn delete(state: Data<AppState>, cid: CorrelationId, id: Path<u64>) -> AppResult<HttpResponse> {
    let removed = state.customers.delete(id.into_inner()).await?;
    tracing::info!(correlation_id = %cid, id = removed.id, "customer deleted");
    Ok(HttpResponse::Ok().json(DeleteReply {
        ok: true,
        message: format!("Deleted '{}'", removed.name),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::PortalConfig;
    use crate::modules::customer::flash::FLASH_COOKIE;
    use actix_web::{test, App};

    fn state() -> Data<AppState> {
        AppState::in_memory(PortalConfig::default()).unwrap()
    }

    #[actix_web::test]
    async fn test_index_lists_newest_first_with_actions() {
        let state = state();
        state.customers.create(Customer::draft("Acme")).await.unwrap();
        state.customers.create(Customer::draft("Globex")).await.unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(register)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/customers").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        let globex = body.find("Globex").unwrap();
        let acme = body.find("Acme").unwrap();
        assert!(globex < acme);
        assert!(body.contains("href=\"/customers/edit/1\""));
        assert!(body.contains("/customers/delete/2"));
        assert!(body.contains("Delete Acme?"));
        assert!(body.contains("href=\"/customers/create\""));
    }

    #[actix_web::test]
    async fn test_index_empty_shows_no_data() {
        let app = test::init_service(App::new().app_data(state()).configure(register)).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/customers?q=zzz").to_request()).await;
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("No data"));
    }

    #[actix_web::test]
    async fn test_index_out_of_range_page_renders_empty() {
        let state = state();
        state.customers.create(Customer::draft("Acme")).await.unwrap();
        let app = test::init_service(App::new().app_data(state).configure(register)).await;

        for uri in [
            "/customers?page=18446744073709551615",
            "/customers?page=9223372036854775808",
        ] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
            assert!(body.contains("No data"));
            assert!(!body.contains("Acme"));
        }

        let resp = test::call_service(&app, test::TestRequest::get().uri("/customers?page=0").to_request()).await;
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Acme"));
    }

    #[actix_web::test]
    async fn test_create_success_redirects_with_flash() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(register)).await;

        let req = test::TestRequest::post()
            .uri("/customers/create")
            .set_form([("name", "  Initech ")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get("location").unwrap(), "/customers");
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == FLASH_COOKIE)
            .unwrap()
            .into_owned();
        assert_eq!(Flash::decode(cookie.value()).unwrap().message, CREATED);
        assert!(state.customers.name_taken("Initech", None));

        // 下一次列表渲染显示 toast 并清除 cookie / next list render shows the toast and clears the cookie
        let req = test::TestRequest::get().uri("/customers").cookie(cookie).to_request();
        let resp = test::call_service(&app, req).await;
        let cleared = resp
            .response()
            .cookies()
            .find(|c| c.name() == FLASH_COOKIE)
            .map(|c| c.value().to_string());
        assert_eq!(cleared.as_deref(), Some(""));
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains(CREATED));
    }

    #[actix_web::test]
    async fn test_create_duplicate_and_invalid_rerender_form() {
        let state = state();
        state.customers.create(Customer::draft("Acme")).await.unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(register)).await;

        let req = test::TestRequest::post()
            .uri("/customers/create")
            .set_form([("name", "Acme")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains(DUPLICATE_ON_CREATE));

        let req = test::TestRequest::post()
            .uri("/customers/create")
            .set_form([("name", "   ")])
            .to_request();
        let body = String::from_utf8(test::read_body(test::call_service(&app, req).await).await.to_vec()).unwrap();
        assert!(body.contains("name must be 1..128 chars"));
        assert_eq!(state.customers.len(), 1);
    }

    #[actix_web::test]
    async fn test_edit_flow() {
        let state = state();
        state.customers.create(Customer::draft("Acme")).await.unwrap();
        state.customers.create(Customer::draft("Globex")).await.unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(register)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/customers/edit/1").to_request()).await;
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("value=\"Acme\""));

        let req = test::TestRequest::post()
            .uri("/customers/edit/1")
            .set_form([("name", "Globex")])
            .to_request();
        let body = String::from_utf8(test::read_body(test::call_service(&app, req).await).await.to_vec()).unwrap();
        assert!(body.contains(DUPLICATE_ON_EDIT));

        let req = test::TestRequest::post()
            .uri("/customers/edit/1")
            .set_form([("name", "Acme Corp")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(state.customers.read_one(1).await.unwrap().unwrap().name, "Acme Corp");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/customers/edit/99").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_delete_returns_json() {
        let state = state();
        state.customers.create(Customer::draft("Acme")).await.unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(register)).await;

        let resp = test::call_service(&app, test::TestRequest::post().uri("/customers/delete/1").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let reply: DeleteReply = test::read_body_json(resp).await;
        assert!(reply.ok);
        assert_eq!(reply.message, "Deleted 'Acme'");

        let resp = test::call_service(&app, test::TestRequest::post().uri("/customers/delete/1").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
