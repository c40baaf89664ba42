use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use std::{rc::Rc, time::Instant};
use tracing::Instrument;

/// 关联 ID 请求/响应头 / Correlation id request and response header
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// 当前请求的关联 ID / Correlation id of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// 优先沿用调用方给出的非空值 / Reuse a non-blank caller value when present
    fn from_header(req: &HttpRequest) -> Option<Self> {
        req.headers()
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromRequest for CorrelationId {
    type Error = Error;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let id = req
            .extensions()
            .get::<CorrelationId>()
            .cloned()
            .or_else(|| CorrelationId::from_header(req))
            .unwrap_or_else(CorrelationId::generate);
        std::future::ready(Ok(id))
    }
}

/// 关联 ID 中间件：打开请求 span，回写响应头，结束时记录一条 http 日志
/// Correlation middleware: opens the request span, echoes the header and logs one http event
#[derive(Debug, Clone, Default)]
pub struct CorrelationIdMiddleware;

impl CorrelationIdMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorrelationIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = CorrelationIdMiddlewareService<S>;
    type InitError = ();
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(CorrelationIdMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct CorrelationIdMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for CorrelationIdMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let cid = CorrelationId::from_header(req.request()).unwrap_or_else(CorrelationId::generate);
        req.extensions_mut().insert(cid.clone());

        let method = req.method().to_string();
        let path = req.path().to_string();
        let span = tracing::info_span!(
            "request",
            correlation_id = %cid,
            method = %method,
            path = %path
        );

        Box::pin(
            async move {
                let started = Instant::now();
                let result = service.call(req).await;
                let latency_ms = started.elapsed().as_millis() as u64;

                match result {
                    Ok(mut res) => {
                        let status = res.status().as_u16();
                        if let Ok(value) = HeaderValue::from_str(cid.as_str()) {
                            res.headers_mut()
                                .insert(HeaderName::from_static(CORRELATION_HEADER), value);
                        }
                        tracing::info!(method = %method, path = %path, status, latency_ms, "http");
                        Ok(res)
                    }
                    Err(e) => {
                        let status = e.as_response_error().status_code().as_u16();
                        tracing::info!(method = %method, path = %path, status, latency_ms, "http");
                        Err(e)
                    }
                }
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    async fn echo(cid: CorrelationId) -> HttpResponse {
        HttpResponse::Ok().body(cid.0)
    }

    #[actix_web::test]
    async fn test_generates_id_when_missing() {
        let app = test::init_service(
            App::new()
                .wrap(CorrelationIdMiddleware::new())
                .route("/echo", web::get().to(echo)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/echo").to_request()).await;
        let header = resp
            .headers()
            .get(CORRELATION_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(header.len(), 32);
        let body = test::read_body(resp).await;
        assert_eq!(body, header.as_bytes());
    }

    #[actix_web::test]
    async fn test_echoes_caller_id() {
        let app = test::init_service(
            App::new()
                .wrap(CorrelationIdMiddleware::new())
                .route("/echo", web::get().to(echo)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/echo")
            .insert_header((CORRELATION_HEADER, "abc-123"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(CORRELATION_HEADER).unwrap(), "abc-123");
        assert_eq!(test::read_body(resp).await, "abc-123".as_bytes());

        // 空白值视为缺失 / blank counts as missing
        let req = test::TestRequest::get()
            .uri("/echo")
            .insert_header((CORRELATION_HEADER, "   "))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_ne!(resp.headers().get(CORRELATION_HEADER).unwrap(), "   ");
    }

    #[actix_web::test]
    async fn test_header_on_unmatched_route() {
        let app = test::init_service(App::new().wrap(CorrelationIdMiddleware::new())).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/nope").to_request()).await;
        assert_eq!(resp.status(), 404);
        assert!(resp.headers().contains_key(CORRELATION_HEADER));
    }
}
