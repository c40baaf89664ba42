use actix_web::HttpResponse;
use coe::http::actix_ext::json_ok;
use coe_ui::client::VersionInfo;

const UNKNOWN: &str = "unknown";

/// 编译期构建信息 / Build metadata captured at compile time
pub fn build_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: option_env!("ALERTD_COMMIT").unwrap_or(UNKNOWN).to_string(),
        built_at: option_env!("ALERTD_BUILT_AT").unwrap_or(UNKNOWN).to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/version",
    tag = "System",
    responses((status = 200, description = "build metadata", body = VersionInfo))
)]
pub async fn get_version() -> HttpResponse {
    json_ok(build_info())
}
