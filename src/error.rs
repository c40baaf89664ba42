use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use coe::http::{ErrorBody, FieldError};
use coe::{ConfigError, StoreError};
use thiserror::Error;

/// 统一的应用错误类型 / Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 请求参数不合法（400） / Malformed or invalid request (400)
    #[error("{message}")]
    BadRequest {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        Self::BadRequest {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        Self::NotFound(resource.into())
    }

    /// 校验失败：消息取第一条字段错误 / Validation failure headed by the first field message
    pub fn invalid(errors: Vec<FieldError>) -> Self {
        let message = errors
            .iter()
            .find_map(|e| e.message.clone())
            .unwrap_or_else(|| "invalid request".to_string());
        Self::BadRequest { message, errors }
    }

    /// 写入方向的存储错误映射为 400（除 NotFound 外）
    /// Admin writes report every store failure except NotFound as 400
    pub fn from_admin_store(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::NotFound(format!("{} not found", what)),
            StoreError::Unavailable(msg) => Self::Internal(anyhow::anyhow!(msg)),
            other => Self::bad_request(other.to_string()),
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Config(_) | AppError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::NotFound(format!("{} not found", what)),
            StoreError::Duplicate(msg) => Self::Conflict(msg),
            StoreError::Invalid(msg) => Self::bad_request(msg),
            StoreError::Unavailable(msg) => Self::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errs
            .field_errors()
            .into_iter()
            .flat_map(|(field, list)| {
                list.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    code: e.code.to_string(),
                    message: e.message.as_ref().map(|m| m.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        Self::invalid(fields)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = ResponseError::status_code(self);
        match self {
            AppError::Config(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
            }
            _ => tracing::info!(status = status.as_u16(), error = %self, "client error"),
        }

        let message = self.public_message();
        let errors = match self {
            AppError::BadRequest { errors, .. } if !errors.is_empty() => Some(errors.clone()),
            _ => None,
        };
        HttpResponse::build(status).json(ErrorBody {
            error: message.clone(),
            message,
            errors,
        })
    }
}

/// 应用结果类型 / Application result type
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_store_errors_map_to_status() {
        let e: AppError = StoreError::Duplicate("customer with this name already exists".into()).into();
        assert_eq!(ResponseError::status_code(&e), StatusCode::CONFLICT);

        let e: AppError = StoreError::NotFound("customer 7".into()).into();
        assert_eq!(ResponseError::status_code(&e), StatusCode::NOT_FOUND);
        assert_eq!(e.to_string(), "customer 7 not found");

        let e = AppError::from_admin_store(StoreError::Duplicate("duplicate field_name".into()));
        assert_eq!(ResponseError::status_code(&e), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_envelope_carries_message_and_field_errors() {
        let e = AppError::invalid(vec![FieldError::new(
            "name",
            "length",
            "name must be 1..128 chars",
        )]);
        let resp = e.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["error"], "name must be 1..128 chars");
        assert_eq!(v["message"], "name must be 1..128 chars");
        assert_eq!(v["errors"][0]["field"], "name");
    }

    #[actix_web::test]
    async fn test_internal_errors_are_not_leaked() {
        let e = AppError::Internal(anyhow::anyhow!("lock poisoned at shard 3"));
        let body = to_bytes(e.error_response().into_body()).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["error"], "internal error");
    }
}
