use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use super::error::{ErrorBody, HttpError};

impl ResponseError for HttpError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(HttpError::status_code(self)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let body: ErrorBody = self.to_body();
        HttpResponse::build(ResponseError::status_code(self)).json(body)
    }
}

pub fn json_ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(data)
}

pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(data)
}

pub fn no_content() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status() {
        let resp = HttpError::NotFound("customer 9 not found".into()).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = HttpError::Validation(vec![]).error_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_created_status() {
        assert_eq!(created(serde_json::json!({"id": 1})).status(), StatusCode::CREATED);
        assert_eq!(no_content().status(), StatusCode::NO_CONTENT);
    }
}
