//! REST API `/api/v1`

pub mod customers;
pub mod form_admin;
pub mod schema;
pub mod schema_admin;
pub mod version;

use actix_web::{error::InternalError, web, HttpResponse, ResponseError};

use crate::error::{AppError, AppResult};

pub const API_PREFIX: &str = "/api/v1";

/// 请求体解析失败统一返回 400 `invalid JSON` / Body parse failures become 400 `invalid JSON`
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "rejecting request body");
        let resp: HttpResponse = AppError::bad_request("invalid JSON").error_response();
        InternalError::from_response(err, resp).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let resp: HttpResponse = AppError::bad_request("invalid query parameters").error_response();
        InternalError::from_response(err, resp).into()
    })
}

/// 路径中的正整数 id / Positive integer id from the path
pub(crate) fn parse_id(raw: &str, message: &str) -> AppResult<u64> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::bad_request(message)),
    }
}

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(API_PREFIX)
            .app_data(json_config())
            .app_data(query_config())
            .service(
                web::resource("/customers")
                    .route(web::get().to(customers::list_customers))
                    .route(web::post().to(customers::create_customer)),
            )
            // 同一路径的 GET/POST 必须挂在同一个 resource 上
            // GET and POST of one path share a single resource
            .service(
                web::resource("/schema/list")
                    .route(web::get().to(schema::get_list_schema))
                    .route(web::post().to(schema_admin::create_list_schema)),
            )
            .service(web::resource("/schema/lists").route(web::get().to(schema_admin::list_schemas)))
            .service(
                web::resource("/schema/list/{id}/activate")
                    .route(web::post().to(schema_admin::activate_list_schema)),
            )
            .service(
                web::resource("/schema/list/{id}/fields")
                    .route(web::get().to(schema_admin::list_fields))
                    .route(web::post().to(schema_admin::create_list_field)),
            )
            .service(web::resource("/schema/form").route(web::get().to(schema::get_form_schema)))
            .service(web::resource("/schema/forms").route(web::post().to(form_admin::create_form_schema)))
            .service(
                web::resource("/schema/forms/fields/{id}/options")
                    .route(web::post().to(form_admin::add_field_option)),
            )
            .service(
                web::resource("/schema/forms/{id}/fields")
                    .route(web::post().to(form_admin::create_form_field)),
            )
            .service(
                web::resource("/schema/forms/{id}/activate")
                    .route(web::post().to(form_admin::activate_form_schema)),
            )
            .service(web::resource("/version").route(web::get().to(version::get_version))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12", "invalid schema id").unwrap(), 12);
        assert!(parse_id("0", "invalid schema id").is_err());
        assert!(parse_id("-3", "invalid schema id").is_err());
        let err = parse_id("abc", "invalid field id").unwrap_err();
        assert_eq!(err.to_string(), "invalid field id");
    }
}
