//! 一次性 flash 消息（cookie 承载，下一次页面渲染为 toast）
//! One-shot flash message carried in a cookie and shown as a toast on the next page

use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use coe_ui::{Notifier, ToastKind, ToastOptions};

pub const FLASH_COOKIE: &str = "coe_flash";

#[derive(Debug, Clone, PartialEq)]
pub struct Flash {
    pub kind: ToastKind,
    pub message: String,
}

fn kind_tag(kind: ToastKind) -> &'static str {
    match kind {
        ToastKind::Success => "success",
        ToastKind::Error => "error",
        ToastKind::Info => "info",
        ToastKind::Warning => "warning",
        ToastKind::Loading => "loading",
    }
}

fn parse_kind(tag: &str) -> Option<ToastKind> {
    match tag {
        "success" => Some(ToastKind::Success),
        "error" => Some(ToastKind::Error),
        "info" => Some(ToastKind::Info),
        "warning" => Some(ToastKind::Warning),
        // loading 需要显式关闭，不适合一次性消息 / loading is sticky, not a flash kind
        _ => None,
    }
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Warning,
            message: message.into(),
        }
    }

    /// `kind:message`，整体 URL 编码 / `kind:message`, URL-encoded
    pub fn encode(&self) -> String {
        urlencoding::encode(&format!("{}:{}", kind_tag(self.kind), self.message)).into_owned()
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?;
        let (tag, message) = decoded.split_once(':')?;
        let kind = parse_kind(tag)?;
        if message.trim().is_empty() {
            return None;
        }
        Some(Self {
            kind,
            message: message.to_string(),
        })
    }

    pub fn to_cookie(&self) -> Cookie<'static> {
        Cookie::build(FLASH_COOKIE, self.encode())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish()
    }

    pub fn from_request(req: &HttpRequest) -> Option<Self> {
        req.cookie(FLASH_COOKIE)
            .and_then(|c| Self::decode(c.value()))
    }

    /// 读取后清除 cookie / Clears the cookie once read
    pub fn removal() -> Cookie<'static> {
        let mut c = Cookie::new(FLASH_COOKIE, "");
        c.set_path("/");
        c.make_removal();
        c
    }

    pub fn raise(&self, notifier: &Notifier) {
        notifier.raise(self.kind, self.message.clone(), ToastOptions::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_encode_decode() {
        let f = Flash::success("Deleted 'Acme: West'");
        let back = Flash::decode(&f.encode()).unwrap();
        assert_eq!(back, f);
        assert!(Flash::decode("loading%3Await").is_none());
        assert!(Flash::decode("garbage").is_none());
    }

    #[test]
    fn test_read_from_request_and_raise() {
        let f = Flash::warning("Customer not found.");
        let req = TestRequest::default().cookie(f.to_cookie()).to_http_request();
        let read = Flash::from_request(&req).unwrap();
        let notifier = Notifier::new(5);
        read.raise(&notifier);
        let visible = notifier.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].kind, ToastKind::Warning);
        assert_eq!(visible[0].body, "Customer not found.");
    }
}
