//! 类型化 API 客户端与渲染器的数据源接口
//! Typed API client and the data-source seams the renderers consume

use async_trait::async_trait;
use coe::http::{ErrorBody, FieldError, Page};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::schema::{
    FormKind, FormSchemaDto, ItemsResponse, ListSchema, NewFieldOption, NewFormField,
    NewFormSchema, NewListField, NewListSchema, Row, SchemaPage, StatusResponse, UiFormFieldOption,
    UiFormSchema, UiFormSchemaField, UiListSchema, UiListSchemaField,
};

/// 原始响应文本的最大保留字符数 / Max characters kept from a raw error body
pub const MAX_ERROR_TEXT: usize = 500;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const NO_QUERY: &[(&str, &str)] = &[];

/// 客户端错误分类 / Client failure taxonomy
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// 无响应或超时 / No response or timeout
    #[error("{0}")]
    Network(String),
    #[error("{message}")]
    Validation {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    /// 其他非 2xx 状态 / Any other non-2xx status
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Network(_) | ClientError::Decode(_) => None,
            ClientError::Validation { status, .. }
            | ClientError::Server { status, .. }
            | ClientError::Rejected { status, .. } => Some(*status),
            ClientError::Conflict(_) => Some(409),
            ClientError::NotFound(_) => Some(404),
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Conflict(_))
    }

    /// 由状态码与响应体构造错误 / Build from a status code and response body
    pub fn from_response(status: u16, content_type: &str, body: &str) -> Self {
        let message = error_message_from_body(content_type, status, body);
        match status {
            400 | 422 => ClientError::Validation {
                status,
                message,
                errors: field_errors_from_body(content_type, body),
            },
            404 => ClientError::NotFound(message),
            409 => ClientError::Conflict(message),
            s if s >= 500 => ClientError::Server { status, message },
            _ => ClientError::Rejected { status, message },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            ClientError::Network(format!("Network error or timeout: {}", e))
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

/// JSON 响应取 `error`/`message`，其他响应取截断的原始文本；都没有时返回 None
/// `error`/`message` for JSON replies, truncated raw text otherwise; `None` when neither exists
pub fn extract_error_message(content_type: &str, body: &str) -> Option<String> {
    if content_type.contains("application/json") {
        // JSON 响应只取 error/message 字段，无法解析时不回退到原文
        // JSON replies only yield error/message; unparseable JSON never falls back to raw text
        let v = serde_json::from_str::<serde_json::Value>(body).ok()?;
        return ["error", "message"].iter().find_map(|k| {
            v.get(*k)
                .and_then(|m| m.as_str())
                .filter(|m| !m.trim().is_empty())
                .map(str::to_string)
        });
    }
    let text = body.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(MAX_ERROR_TEXT).collect())
}

/// 人类可读的错误消息，缺省为 `Request failed (<status>)`
/// Human-readable message, defaulting to `Request failed (<status>)`
pub fn error_message_from_body(content_type: &str, status: u16, body: &str) -> String {
    extract_error_message(content_type, body)
        .unwrap_or_else(|| format!("Request failed ({})", status))
}

fn field_errors_from_body(content_type: &str, body: &str) -> Vec<FieldError> {
    if !content_type.contains("application/json") {
        return Vec::new();
    }
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.errors)
        .unwrap_or_default()
}

/// 列表查询参数 / List fetch parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

/// 构建信息 / Build metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: String,
    pub commit: String,
    pub built_at: String,
}

/// 活动 schema 的来源 / Where active schemas come from
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn list_schema(&self, model: &str) -> Result<ListSchema, ClientError>;
    async fn form_schema(&self, model: &str, kind: FormKind) -> Result<FormSchemaDto, ClientError>;
}

/// 分页数据来源 / Paged row source
#[async_trait]
pub trait ListSource: Send + Sync {
    async fn fetch_list(&self, params: ListParams) -> Result<Page<Row>, ClientError>;
}

/// 新建提交处理 / Create submission handler
#[async_trait]
pub trait CreateHandler: Send + Sync {
    async fn create(&self, values: Row) -> Result<Row, ClientError>;
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// `base_url` 形如 `http://host:8080/api/v1` / e.g. `http://host:8080/api/v1`
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = resp.text().await?;
        if !status.is_success() {
            let err = ClientError::from_response(status.as_u16(), &content_type, &body);
            tracing::debug!(status = status.as_u16(), error = %err, "api call failed");
            return Err(err);
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let resp = self.http.get(self.url(path)).query(query).send().await?;
        Self::decode(resp).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(resp).await
    }

    // ---- schema 读取 / schema reads ----

    pub async fn get_list_schema(&self, model: &str) -> Result<ListSchema, ClientError> {
        self.get_json("schema/list", &[("model", model)]).await
    }

    pub async fn get_form_schema(
        &self,
        model: &str,
        kind: FormKind,
    ) -> Result<FormSchemaDto, ClientError> {
        self.get_json("schema/form", &[("model", model), ("kind", kind.as_str())])
            .await
    }

    // ---- schema 管理 / schema administration ----

    pub async fn list_schemas(
        &self,
        model: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<SchemaPage<UiListSchema>, ClientError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(m) = model {
            query.push(("model", m.to_string()));
        }
        if let Some(l) = limit {
            query.push(("limit", l.to_string()));
        }
        if let Some(o) = offset {
            query.push(("offset", o.to_string()));
        }
        self.get_json("schema/lists", &query).await
    }

    pub async fn create_list_schema(&self, req: &NewListSchema) -> Result<UiListSchema, ClientError> {
        self.post_json("schema/list", req).await
    }

    pub async fn activate_list_schema(&self, id: u64) -> Result<StatusResponse, ClientError> {
        self.post_json(&format!("schema/list/{}/activate", id), &serde_json::json!({}))
            .await
    }

    pub async fn list_fields(&self, schema_id: u64) -> Result<Vec<UiListSchemaField>, ClientError> {
        let resp: ItemsResponse<UiListSchemaField> = self
            .get_json(&format!("schema/list/{}/fields", schema_id), NO_QUERY)
            .await?;
        Ok(resp.items)
    }

    pub async fn add_list_field(
        &self,
        schema_id: u64,
        req: &NewListField,
    ) -> Result<UiListSchemaField, ClientError> {
        self.post_json(&format!("schema/list/{}/fields", schema_id), req)
            .await
    }

    pub async fn create_form_schema(&self, req: &NewFormSchema) -> Result<UiFormSchema, ClientError> {
        self.post_json("schema/forms", req).await
    }

    pub async fn add_form_field(
        &self,
        schema_id: u64,
        req: &NewFormField,
    ) -> Result<UiFormSchemaField, ClientError> {
        self.post_json(&format!("schema/forms/{}/fields", schema_id), req)
            .await
    }

    pub async fn activate_form_schema(&self, id: u64) -> Result<StatusResponse, ClientError> {
        self.post_json(&format!("schema/forms/{}/activate", id), &serde_json::json!({}))
            .await
    }

    pub async fn add_field_option(
        &self,
        field_id: u64,
        req: &NewFieldOption,
    ) -> Result<UiFormFieldOption, ClientError> {
        self.post_json(&format!("schema/forms/fields/{}/options", field_id), req)
            .await
    }

    // ---- 系统 / system ----

    pub async fn version(&self) -> Result<VersionInfo, ClientError> {
        self.get_json("version", NO_QUERY).await
    }

    /// 资源端点句柄，例如 `customers` / Handle on a resource endpoint such as `customers`
    pub fn resource(&self, path: &str) -> ResourceEndpoint {
        ResourceEndpoint {
            client: self.clone(),
            path: path.trim_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SchemaSource for ApiClient {
    async fn list_schema(&self, model: &str) -> Result<ListSchema, ClientError> {
        self.get_list_schema(model).await
    }

    async fn form_schema(&self, model: &str, kind: FormKind) -> Result<FormSchemaDto, ClientError> {
        self.get_form_schema(model, kind).await
    }
}

/// 通用资源 CRUD 端点 / Generic resource endpoint
#[derive(Clone, Debug)]
pub struct ResourceEndpoint {
    client: ApiClient,
    path: String,
}

impl ResourceEndpoint {
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl ListSource for ResourceEndpoint {
    async fn fetch_list(&self, params: ListParams) -> Result<Page<Row>, ClientError> {
        self.client.get_json(&self.path, &params).await
    }
}

#[async_trait]
impl CreateHandler for ResourceEndpoint {
    async fn create(&self, values: Row) -> Result<Row, ClientError> {
        self.client.post_json(&self.path, &values).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_prefers_error_then_message() {
        let json = "application/json; charset=utf-8";
        assert_eq!(
            error_message_from_body(json, 409, r#"{"error":"duplicate","message":"other"}"#),
            "duplicate"
        );
        assert_eq!(
            error_message_from_body(json, 400, r#"{"message":"bad name"}"#),
            "bad name"
        );
        assert_eq!(error_message_from_body(json, 500, "{}"), "Request failed (500)");
    }

    #[test]
    fn test_unparseable_json_uses_status_fallback() {
        let json = "application/json";
        assert_eq!(extract_error_message(json, "<html>oops</html>"), None);
        assert_eq!(
            error_message_from_body(json, 502, "<html>oops</html>"),
            "Request failed (502)"
        );
    }

    #[test]
    fn test_raw_text_is_truncated() {
        let body = "x".repeat(800);
        let msg = error_message_from_body("text/plain", 502, &body);
        assert_eq!(msg.chars().count(), MAX_ERROR_TEXT);
        assert_eq!(error_message_from_body("text/html", 503, "  "), "Request failed (503)");
    }

    #[test]
    fn test_status_taxonomy() {
        let ct = "application/json";
        assert!(ClientError::from_response(404, ct, r#"{"error":"list schema not found"}"#).is_not_found());
        assert!(ClientError::from_response(409, ct, r#"{"error":"duplicate"}"#).is_conflict());
        assert!(matches!(
            ClientError::from_response(400, ct, r#"{"error":"name must be 1..128 chars"}"#),
            ClientError::Validation { status: 400, .. }
        ));
        assert!(matches!(
            ClientError::from_response(503, "text/plain", "down"),
            ClientError::Server { status: 503, .. }
        ));
        assert!(matches!(
            ClientError::from_response(403, ct, "{}"),
            ClientError::Rejected { status: 403, .. }
        ));
    }

    #[test]
    fn test_validation_carries_field_errors() {
        let body = r#"{"error":"Validation Failed","message":"Validation Failed","errors":[{"field":"name","code":"length","message":"too long"}]}"#;
        match ClientError::from_response(422, "application/json", body) {
            ClientError::Validation { errors, message, .. } => {
                assert_eq!(message, "Validation Failed");
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "name");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_list_params_skip_empty() {
        let p = ListParams {
            limit: Some(20),
            offset: None,
            q: Some("acme".into()),
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v, serde_json::json!({"limit": 20, "q": "acme"}));
    }

    #[test]
    fn test_base_url_normalized() {
        let c = ApiClient::new("http://localhost:8080/api/v1/").unwrap();
        assert_eq!(c.base_url(), "http://localhost:8080/api/v1");
        assert_eq!(c.url("/customers"), "http://localhost:8080/api/v1/customers");
        assert_eq!(c.resource("/customers/").path(), "customers");
    }
}
