use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};

// 通用 HTTP 响应封装（支持 JSON、文本、HTML）
// Generic HTTP response helpers (JSON, text, HTML)

/// 已渲染的 HTML 文档 / A rendered HTML document
#[derive(Debug, Clone)]
pub struct Html(pub String);

pub enum AutoBody {
    Json(serde_json::Value),
    Text(String),
    Html(String),
}

impl From<serde_json::Value> for AutoBody {
    fn from(v: serde_json::Value) -> Self {
        AutoBody::Json(v)
    }
}

impl From<String> for AutoBody {
    fn from(s: String) -> Self {
        AutoBody::Text(s)
    }
}

impl From<&str> for AutoBody {
    fn from(s: &str) -> Self {
        AutoBody::Text(s.to_string())
    }
}

impl From<Html> for AutoBody {
    fn from(h: Html) -> Self {
        AutoBody::Html(h.0)
    }
}

// 通用响应：3xx 时数据作为 Location，其他情况序列化为 JSON
// Generic response: 3xx uses the data as Location, otherwise JSON
pub fn respond_any<T: serde::Serialize + std::fmt::Debug>(
    code: StatusCode,
    data: T,
) -> HttpResponse {
    if code.is_redirection() {
        let loc = match serde_json::to_value(&data) {
            Ok(serde_json::Value::String(s)) => s,
            Ok(v) => v.to_string(),
            Err(_) => format!("{:?}", data),
        };
        return HttpResponse::build(code)
            .insert_header((header::LOCATION, loc))
            .finish();
    }
    match serde_json::to_value(&data) {
        Ok(v) => HttpResponse::build(code).json(v),
        Err(_) => HttpResponse::build(code)
            .content_type("text/plain; charset=utf-8")
            .body(format!("{:?}", data)),
    }
}

// 指定体裁响应 / Response with an explicit body kind
pub fn respond_body<B: Into<AutoBody>>(code: StatusCode, body: B) -> HttpResponse {
    match body.into() {
        AutoBody::Json(v) => HttpResponse::build(code).json(v),
        AutoBody::Text(s) => HttpResponse::build(code)
            .content_type("text/plain; charset=utf-8")
            .body(s),
        AutoBody::Html(s) => HttpResponse::build(code)
            .content_type("text/html; charset=utf-8")
            .body(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_sets_location() {
        let resp = respond_any(StatusCode::SEE_OTHER, "/customers");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/customers");
    }

    #[test]
    fn test_html_content_type() {
        let resp = respond_body(StatusCode::OK, Html("<p>hi</p>".into()));
        let ct = resp.headers().get(header::CONTENT_TYPE).unwrap();
        assert_eq!(ct, "text/html; charset=utf-8");
    }
}
