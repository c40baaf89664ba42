//! 页面外壳：导航、内容、通知宿主与确认模板
//! Page shell with navigation, content, toast host and confirm template

use coe::response::Html;
use coe_ui::server::{confirm_template, toast_host};
use coe_ui::{el, Node, Toast};

const BOOTSTRAP_CSS: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";
const BOOTSTRAP_JS: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/js/bootstrap.bundle.min.js";

pub const APP_TITLE: &str = "Alert Portal";

fn navbar() -> Node {
    el("nav")
        .class("navbar navbar-expand bg-body-tertiary border-bottom")
        .child(
            el("div")
                .class("container")
                .child(el("a").class("navbar-brand").attr("href", "/").text(APP_TITLE))
                .child(
                    el("ul").class("navbar-nav").child(
                        el("li").class("nav-item").child(
                            el("a").class("nav-link").attr("href", "/customers").text("Customers"),
                        ),
                    ),
                ),
        )
        .into()
}

pub fn page(title: &str, content: Vec<Node>, toasts: &[Toast]) -> Html {
    let head = el("head")
        .child(el("meta").attr("charset", "utf-8"))
        .child(
            el("meta")
                .attr("name", "viewport")
                .attr("content", "width=device-width, initial-scale=1"),
        )
        .child(el("title").text(format!("{} - {}", title, APP_TITLE)))
        .child(el("link").attr("rel", "stylesheet").attr("href", BOOTSTRAP_CSS));

    let body = el("body")
        .child(navbar())
        .child(el("main").class("container py-4").children(content))
        .child(toast_host(toasts))
        .child(confirm_template())
        .child(el("script").attr("src", BOOTSTRAP_JS));

    let doc: Node = el("html").attr("lang", "en").child(head).child(body).into();
    Html(format!("<!DOCTYPE html>{}", doc.render()))
}
