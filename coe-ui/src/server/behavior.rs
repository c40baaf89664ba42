//! 伴随行为层：确认后提交、AJAX 表单提交、无表单的后台删除
//! Companion behavior layer: confirm-and-post, AJAX form submit, formless background delete
//!
//! 行为通过渲染结果上的 data-* 属性绑定；对话框与网络传输是注入的接口。
//! Behaviors bind to data-* attributes on rendered markup; the dialog and the
//! network transport are injected.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::client::extract_error_message;
use crate::html::{Element, Node};
use crate::notify::{Notifier, ToastOptions};
use crate::server::confirm::ConfirmOptions;
use crate::server::form::ANTIFORGERY_FIELD;

pub const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");
pub const ANTIFORGERY_HEADER: &str = "RequestVerificationToken";

/// 确认对话框 / Confirmation dialog
#[async_trait]
pub trait ConfirmDialog: Send + Sync {
    /// 接受返回 true / true when accepted
    async fn confirm(&self, opts: ConfirmOptions) -> bool;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutgoingRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_json(&self) -> bool {
        self.content_type.contains("application/json")
    }

    fn json(&self) -> Option<serde_json::Value> {
        if !self.is_json() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }
}

/// 后台请求传输层；Err 为网络错误消息
/// Background request transport; `Err` carries a network error message
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, req: OutgoingRequest) -> Result<HttpReply, String>;
}

/// 一次行为的结果 / Result of one behavior activation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 已有对话框或请求在进行 / A dialog or request is already pending
    Ignored,
    /// 控件不适用此行为 / Control does not opt into this behavior
    NotApplicable,
    /// 用户取消 / Declined by the user
    Cancelled,
    /// 确认通过，宿主应原生提交该请求 / Confirmed; the host submits this natively
    Submit(OutgoingRequest),
    Redirect(String),
    /// 成功且已弹出提示 / Success with a toast raised
    Message(String),
    Reload,
    /// 成功，无后续动作 / Success with nothing further to do
    Done,
    Failed {
        message: String,
        summary_written: bool,
    },
}

/// 从 data-* 属性解析出的控件参数 / Control parameters read from data-* attributes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlAttrs {
    pub is_post: bool,
    pub is_delete: bool,
    pub url: Option<String>,
    pub name: Option<String>,
    pub method: Option<String>,
    pub confirm_title: Option<String>,
    pub confirm_body: Option<String>,
    pub confirm_class: Option<String>,
    pub text: String,
}

impl ControlAttrs {
    pub fn from_element(e: &Element) -> Self {
        let non_empty = |k: &str| e.get_attr(k).filter(|v| !v.is_empty()).map(str::to_string);
        Self {
            is_post: e.has_attr("data-coe-post"),
            is_delete: e.has_attr("data-coe-delete"),
            url: non_empty("data-url").or_else(|| non_empty("href")),
            name: non_empty("data-name"),
            method: non_empty("data-method"),
            confirm_title: non_empty("data-coe-confirm-title"),
            confirm_body: non_empty("data-coe-confirm-body"),
            confirm_class: non_empty("data-coe-confirm-class"),
            text: Node::Element(e.clone()).text_content().trim().to_string(),
        }
    }

    fn wants_confirm(&self) -> bool {
        self.confirm_title.is_some() || self.confirm_body.is_some()
    }
}

/// 收集表单控件的提交值 / Collect the submitted values of a form's controls
pub fn form_values(form: &Element) -> Vec<(String, String)> {
    let root = Node::Element(form.clone());
    let mut controls = Vec::new();
    root.find_all(
        &|e| matches!(e.tag.as_str(), "input" | "textarea" | "select"),
        &mut controls,
    );
    let mut out = Vec::new();
    for c in controls {
        let Some(name) = c.get_attr("name") else {
            continue;
        };
        match c.tag.as_str() {
            "textarea" => out.push((
                name.to_string(),
                Node::Element(c.clone()).text_content(),
            )),
            "select" => {
                let select = Node::Element(c.clone());
                let mut options = Vec::new();
                select.find_all(&|e| e.tag == "option", &mut options);
                let chosen = options
                    .iter()
                    .find(|o| o.has_attr("selected"))
                    .or_else(|| options.first());
                if let Some(o) = chosen {
                    out.push((name.to_string(), o.get_attr("value").unwrap_or("").to_string()));
                }
            }
            _ => {
                let ty = c.get_attr("type").unwrap_or("text");
                if matches!(ty, "checkbox" | "radio") && !c.has_attr("checked") {
                    continue;
                }
                out.push((name.to_string(), c.get_attr("value").unwrap_or("").to_string()));
            }
        }
    }
    out
}

/// 页面中的防伪令牌 / Antiforgery token present on the page
pub fn find_antiforgery_token(page: &Node) -> Option<String> {
    page.find(&|e| e.tag == "input" && e.get_attr("name") == Some(ANTIFORGERY_FIELD))
        .and_then(|e| e.get_attr("value"))
        .map(str::to_string)
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct Behavior {
    dialog: Arc<dyn ConfirmDialog>,
    transport: Arc<dyn Transport>,
    notifier: Notifier,
    busy: Arc<AtomicBool>,
}

impl Behavior {
    pub fn new(
        dialog: Arc<dyn ConfirmDialog>,
        transport: Arc<dyn Transport>,
        notifier: Notifier,
    ) -> Self {
        Self {
            dialog,
            transport,
            notifier,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    // 同一时间只允许一个对话框或请求 / one dialog or request at a time
    fn acquire(&self) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.busy)))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// 表单内 `data-coe-post` 按钮：确认后提交外层表单
    /// A `data-coe-post` button inside a form: confirm, then submit the wrapping form
    pub async fn confirm_and_post(&self, form: &Element) -> Outcome {
        if form.tag != "form" {
            return Outcome::NotApplicable;
        }
        let Some(button) = Node::Element(form.clone())
            .find(&|e| e.tag == "button" && e.has_attr("data-coe-post"))
            .cloned()
        else {
            return Outcome::NotApplicable;
        };
        let Some(_guard) = self.acquire() else {
            tracing::debug!("confirm-and-post ignored, another action is pending");
            return Outcome::Ignored;
        };

        let attrs = ControlAttrs::from_element(&button);
        if attrs.wants_confirm() {
            let opts = ConfirmOptions {
                title: attrs
                    .confirm_title
                    .clone()
                    .unwrap_or_else(|| "Are you sure?".to_string()),
                body: attrs.confirm_body.clone().unwrap_or_default(),
                confirm_text: if attrs.text.is_empty() {
                    "Confirm".to_string()
                } else {
                    attrs.text.clone()
                },
                confirm_class: attrs
                    .confirm_class
                    .clone()
                    .unwrap_or_else(|| "btn-danger".to_string()),
                ..Default::default()
            };
            if !self.dialog.confirm(opts).await {
                return Outcome::Cancelled;
            }
        }

        Outcome::Submit(OutgoingRequest {
            method: form.get_attr("method").unwrap_or("post").to_uppercase(),
            url: form.get_attr("action").unwrap_or("").to_string(),
            headers: Vec::new(),
            form: form_values(form),
        })
    }

    /// `data-coe-ajax="true"` 的表单后台提交；请求前清空校验摘要，失败时写入消息
    /// Background submit of a `data-coe-ajax="true"` form. The validation summary
    /// is cleared before the request and receives the message on failure.
    pub async fn ajax_submit(&self, form: &mut Element) -> Outcome {
        if form.tag != "form" || form.get_attr("data-coe-ajax") != Some("true") {
            return Outcome::NotApplicable;
        }
        let Some(_guard) = self.acquire() else {
            return Outcome::Ignored;
        };

        write_summary(form, "");
        let method = form.get_attr("method").unwrap_or("post").to_uppercase();
        let req = OutgoingRequest {
            url: form.get_attr("action").unwrap_or("").to_string(),
            headers: vec![(REQUESTED_WITH.0.to_string(), REQUESTED_WITH.1.to_string())],
            form: if method == "GET" {
                Vec::new()
            } else {
                form_values(form)
            },
            method,
        };

        let reply = match self.transport.send(req).await {
            Ok(r) => r,
            Err(e) => {
                let msg = if e.is_empty() { "Network error".to_string() } else { e };
                let written = write_summary(form, &msg);
                return self.fail(msg, written);
            }
        };

        if reply.is_success() {
            if !reply.is_json() {
                return Outcome::Reload;
            }
            let data = reply.json().unwrap_or(serde_json::Value::Null);
            if let Some(r) = data.get("redirect").and_then(|v| v.as_str()) {
                return Outcome::Redirect(r.to_string());
            }
            if let Some(m) = data.get("message").filter(|v| !v.is_null()) {
                let m = json_text(m);
                self.notifier.success(m.clone(), ToastOptions::default());
                return Outcome::Message(m);
            }
            return Outcome::Done;
        }

        let msg = extract_error_message(&reply.content_type, &reply.body)
            .unwrap_or_else(|| format!("Request failed ({})", reply.status));
        let written = write_summary(form, &msg);
        self.fail(msg, written)
    }

    /// 无外层表单的 `data-coe-delete` 控件 / A `data-coe-delete` control with no wrapping form
    pub async fn ajax_delete(&self, control: &Element, antiforgery: Option<&str>) -> Outcome {
        let attrs = ControlAttrs::from_element(control);
        if !attrs.is_delete {
            return Outcome::NotApplicable;
        }
        let Some(url) = attrs.url.clone() else {
            return Outcome::NotApplicable;
        };
        let Some(_guard) = self.acquire() else {
            tracing::debug!(%url, "delete ignored, another action is pending");
            return Outcome::Ignored;
        };

        let name = attrs.name.clone().unwrap_or_else(|| "this item".to_string());
        let opts = ConfirmOptions {
            title: attrs
                .confirm_title
                .clone()
                .unwrap_or_else(|| format!("Delete {}?", name)),
            body: attrs.confirm_body.clone().unwrap_or_default(),
            confirm_text: if attrs.text.is_empty() {
                "Delete".to_string()
            } else {
                attrs.text.clone()
            },
            confirm_class: attrs
                .confirm_class
                .clone()
                .unwrap_or_else(|| "btn-danger".to_string()),
            ..Default::default()
        };
        if !self.dialog.confirm(opts).await {
            return Outcome::Cancelled;
        }

        let mut headers = vec![(REQUESTED_WITH.0.to_string(), REQUESTED_WITH.1.to_string())];
        if let Some(token) = antiforgery {
            headers.push((ANTIFORGERY_HEADER.to_string(), token.to_string()));
        }
        let req = OutgoingRequest {
            method: attrs.method.clone().unwrap_or_else(|| "POST".to_string()).to_uppercase(),
            url,
            headers,
            form: Vec::new(),
        };

        let reply = match self.transport.send(req).await {
            Ok(r) => r,
            Err(e) => {
                let msg = if e.is_empty() { "Network error".to_string() } else { e };
                return self.fail(msg, false);
            }
        };

        // 成功后总是离开当前页：跟随 redirect，否则重新加载
        // Success always leaves the page: follow `redirect`, else reload
        if reply.is_success() {
            if let Some(data) = reply.json() {
                if let Some(m) = data.get("message").filter(|v| !v.is_null()) {
                    self.notifier.success(json_text(m), ToastOptions::default());
                }
                if let Some(r) = data.get("redirect").and_then(|v| v.as_str()) {
                    return Outcome::Redirect(r.to_string());
                }
            }
            return Outcome::Reload;
        }

        let msg = extract_error_message(&reply.content_type, &reply.body)
            .unwrap_or_else(|| format!("Delete failed ({})", reply.status));
        self.fail(msg, false)
    }

    fn fail(&self, message: String, has_summary: bool) -> Outcome {
        tracing::warn!(%message, "background request failed");
        self.notifier.error(message.clone(), ToastOptions::default());
        Outcome::Failed {
            message,
            summary_written: has_summary,
        }
    }
}

/// 写入表单的校验摘要槽；没有该槽时返回 false
/// Write into the form's validation summary slot; false when the form has none
fn write_summary(form: &mut Element, message: &str) -> bool {
    match form.find_mut(&|e| e.has_attr("data-coe-val-summary")) {
        Some(summary) => {
            summary.set_text(message);
            true
        }
        None => false,
    }
}

fn json_text(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
