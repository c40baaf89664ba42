use serde::{Deserialize, Serialize};

/// 字段级错误 / Field-level error entry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: Some(message.into()),
        }
    }
}

/// 统一错误响应体 `{error, message, errors?}`，error 与 message 同为可读文本
/// Uniform error envelope `{error, message, errors?}`; both strings carry the readable text
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

#[derive(Debug, Clone)]
pub enum HttpError {
    BadRequest(String),
    NotFound(String),
    Validation(Vec<FieldError>),
    Conflict(String),
    Internal(String),
}

impl HttpError {
    pub fn status_code(&self) -> u16 {
        match self {
            HttpError::BadRequest(_) => 400,
            HttpError::NotFound(_) => 404,
            HttpError::Validation(_) => 422,
            HttpError::Conflict(_) => 409,
            HttpError::Internal(_) => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        match self {
            HttpError::BadRequest(msg)
            | HttpError::NotFound(msg)
            | HttpError::Conflict(msg)
            | HttpError::Internal(msg) => ErrorBody {
                error: msg.clone(),
                message: msg.clone(),
                errors: None,
            },
            HttpError::Validation(errors) => ErrorBody {
                error: "Validation Failed".to_string(),
                message: "Validation Failed".to_string(),
                errors: Some(errors.clone()),
            },
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            HttpError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            HttpError::Validation(_) => write!(f, "Validation Failed"),
            HttpError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            HttpError::Internal(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_body_serialization() {
        let errs = vec![FieldError::new("name", "required", "name is required")];
        let e = HttpError::Validation(errs);
        let body = e.to_body();
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("Validation Failed"));
        assert!(json.contains("\"field\":\"name\""));
        assert_eq!(e.status_code(), 422);
        assert_eq!(body.errors.unwrap().len(), 1);
    }

    #[test]
    fn test_plain_body_omits_errors() {
        let body = HttpError::Conflict("customer with this name already exists".into()).to_body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "customer with this name already exists");
        assert_eq!(json["message"], "customer with this name already exists");
        assert!(json.get("errors").is_none());
    }
}
