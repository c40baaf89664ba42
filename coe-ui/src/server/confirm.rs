//! 确认对话框与通知宿主标记 / Confirm-modal and toast-host markup

use crate::html::{el, Element, Node};
use crate::notify::Toast;

pub const CONFIRM_TEMPLATE_ID: &str = "coe-confirm-template";
pub const TOAST_HOST_ID: &str = "coe-toast-host";

/// 确认对话框参数 / Confirmation dialog parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmOptions {
    pub title: String,
    pub body: String,
    pub confirm_text: String,
    pub confirm_class: String,
    pub cancel_text: String,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            title: "Confirm".to_string(),
            body: "Are you sure?".to_string(),
            confirm_text: "Confirm".to_string(),
            confirm_class: "btn-danger".to_string(),
            cancel_text: "Cancel".to_string(),
        }
    }
}

fn modal(opts: &ConfirmOptions) -> Element {
    let body = if opts.body.is_empty() {
        el("div").class("modal-body")
    } else {
        el("div")
            .class("modal-body")
            .child(el("p").text(opts.body.as_str()))
    };
    el("div")
        .class("modal fade")
        .attr("tabindex", "-1")
        .attr("aria-hidden", "true")
        .child(
            el("div").class("modal-dialog modal-dialog-centered").child(
                el("div")
                    .class("modal-content")
                    .child(
                        el("div")
                            .class("modal-header")
                            .child(el("h5").class("modal-title").text(opts.title.as_str()))
                            .child(
                                el("button")
                                    .attr("type", "button")
                                    .class("btn-close")
                                    .attr("data-bs-dismiss", "modal")
                                    .attr("aria-label", "Close"),
                            ),
                    )
                    .child(body)
                    .child(
                        el("div")
                            .class("modal-footer")
                            .child(
                                el("button")
                                    .attr("type", "button")
                                    .class("btn btn-outline-secondary")
                                    .attr("data-bs-dismiss", "modal")
                                    .text(opts.cancel_text.as_str()),
                            )
                            .child(
                                el("button")
                                    .attr("type", "button")
                                    .class(&format!("btn {}", opts.confirm_class))
                                    .attr("data-role", "confirm")
                                    .text(opts.confirm_text.as_str()),
                            ),
                    ),
            ),
        )
}

/// 页面布局中放置一次的确认对话框模板
/// The confirm template placed once in the page layout
pub fn confirm_template() -> Node {
    el("template")
        .attr("id", CONFIRM_TEMPLATE_ID)
        .child(modal(&ConfirmOptions::default()))
        .into()
}

/// 以给定参数填充的对话框 / A dialog hydrated with the given options
pub fn confirm_dialog(opts: &ConfirmOptions) -> Node {
    modal(opts).into()
}

fn toast_node(t: &Toast) -> Node {
    let mut body = el("div").class("toast-body");
    if !t.title.is_empty() {
        body = body.child(el("div").class("fw-semibold mb-1").text(t.title.as_str()));
    }
    body = body.text(t.body.as_str());
    el("div")
        .class(&format!(
            "toast align-items-center text-bg-{} show",
            t.kind.variant()
        ))
        .attr("role", "alert")
        .attr("aria-live", "assertive")
        .attr("aria-atomic", "true")
        .attr("data-coe-toast-key", t.key.as_str())
        .attr("data-bs-autohide", t.autohide().to_string())
        .attr("data-bs-delay", t.delay_ms().to_string())
        .child(
            el("div").class("d-flex").child(body).child(
                el("button")
                    .attr("type", "button")
                    .class("btn-close btn-close-white me-2 m-auto")
                    .attr("data-bs-dismiss", "toast")
                    .attr("aria-label", "Close"),
            ),
        )
        .into()
}

/// 通知宿主，含当前可见通知 / Toast host carrying the currently visible toasts
pub fn toast_host(toasts: &[Toast]) -> Node {
    el("div")
        .attr("id", TOAST_HOST_ID)
        .class("toast-container position-fixed top-0 end-0 p-3")
        .children(toasts.iter().map(toast_node))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notifier, ToastOptions};

    #[test]
    fn test_confirm_template_shape() {
        let node = confirm_template();
        let html = node.render();
        assert!(html.starts_with("<template id=\"coe-confirm-template\">"));
        assert!(node.find(&|e| e.get_attr("data-role") == Some("confirm")).is_some());
        assert!(html.contains("class=\"modal-title\">Confirm</h5>"));
    }

    #[test]
    fn test_confirm_dialog_hydrated() {
        let opts = ConfirmOptions {
            title: "Delete Acme?".into(),
            body: "<b>gone</b>".into(),
            confirm_text: "Delete".into(),
            ..Default::default()
        };
        let html = confirm_dialog(&opts).render();
        assert!(html.contains("Delete Acme?"));
        assert!(html.contains("&lt;b&gt;gone&lt;/b&gt;"));
        assert!(html.contains("class=\"btn btn-danger\" data-role=\"confirm\">Delete</button>"));
    }

    #[test]
    fn test_toast_host_renders_queue() {
        let n = Notifier::default();
        n.success("Created 'Acme'", ToastOptions::default());
        n.error("boom", ToastOptions::default());
        let html = toast_host(&n.visible()).render();
        assert!(html.contains("id=\"coe-toast-host\""));
        assert!(html.contains("text-bg-success"));
        assert!(html.contains("text-bg-danger"));
        assert!(html.contains("Created &#39;Acme&#39;"));
        assert!(html.contains("data-bs-delay=\"2000\""));
    }
}
