//! 数据表描述与渲染 / Data table descriptor and renderer

use std::collections::HashMap;

use coe::http::total_pages;

use crate::html::{el, text, Element, Node};

pub const NO_DATA: &str = "No data";

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderAction {
    pub text: String,
    pub href: String,
    pub class: String,
    pub icon_class: Option<String>,
}

impl Default for HeaderAction {
    fn default() -> Self {
        Self {
            text: "Add".to_string(),
            href: "#".to_string(),
            class: "btn btn-primary".to_string(),
            icon_class: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub query_param: String,
    /// 翻页链接需保留的其他查询参数 / Other query parameters kept on page links
    pub keep: Vec<(String, String)>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            total_items: 0,
            query_param: "page".to_string(),
            keep: Vec::new(),
        }
    }
}

impl Pagination {
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total_items, self.page_size)
    }

    /// `?page=N`（附带保留参数） / `?page=N` plus kept parameters
    pub fn href(&self, page: u64) -> String {
        let mut parts = vec![format!("{}={}", urlencoding::encode(&self.query_param), page)];
        for (k, v) in &self.keep {
            parts.push(format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)));
        }
        format!("?{}", parts.join("&"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataTableColumn {
    pub header: String,
    /// 读取 `row.cells` 的键 / Key into `row.cells`
    pub key: String,
    /// text-start | text-center | text-end
    pub align_class: Option<String>,
    pub width: Option<String>,
}

impl DataTableColumn {
    pub fn new(header: &str, key: &str) -> Self {
        Self {
            header: header.to_string(),
            key: key.to_string(),
            align_class: None,
            width: None,
        }
    }

    pub fn align(mut self, class: &str) -> Self {
        self.align_class = Some(class.to_string());
        self
    }

    pub fn width(mut self, width: &str) -> Self {
        self.width = Some(width.to_string());
        self
    }
}

/// 确认对话框配置 / Confirmation dialog settings
#[derive(Debug, Clone, PartialEq)]
pub struct Confirm {
    pub title: Option<String>,
    pub body: Option<String>,
    pub confirm_class: String,
}

impl Confirm {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
            confirm_class: "btn-danger".to_string(),
        }
    }
}

/// 行操作：导航链接或带确认的表单提交
/// Row action: a navigate link or a confirm-and-post form
#[derive(Debug, Clone, PartialEq)]
pub enum RowAction {
    Link {
        text: String,
        href: String,
        class: String,
        data: Vec<(String, String)>,
        method: Option<String>,
        disabled: bool,
    },
    Post {
        text: String,
        action: String,
        class: String,
        hidden: Vec<(String, String)>,
        confirm: Option<Confirm>,
        disabled: bool,
    },
}

impl RowAction {
    pub fn link(text: &str, href: &str) -> Self {
        RowAction::Link {
            text: text.to_string(),
            href: href.to_string(),
            class: "btn btn-outline-secondary btn-sm".to_string(),
            data: Vec::new(),
            method: None,
            disabled: false,
        }
    }

    pub fn post(text: &str, action: &str) -> Self {
        RowAction::Post {
            text: text.to_string(),
            action: action.to_string(),
            class: "btn btn-outline-danger btn-sm".to_string(),
            hidden: Vec::new(),
            confirm: None,
            disabled: false,
        }
    }

    /// 无外层表单的后台删除控件（由行为层处理）
    /// Background delete control with no wrapping form, handled by the behavior layer
    pub fn ajax_delete(text: &str, url: &str, name: &str, confirm: Confirm) -> Self {
        let mut data = vec![
            ("coe-delete".to_string(), "true".to_string()),
            ("url".to_string(), url.to_string()),
            ("name".to_string(), name.to_string()),
        ];
        if let Some(t) = confirm.title {
            data.push(("coe-confirm-title".to_string(), t));
        }
        if let Some(b) = confirm.body {
            data.push(("coe-confirm-body".to_string(), b));
        }
        data.push(("coe-confirm-class".to_string(), confirm.confirm_class));
        RowAction::Link {
            text: text.to_string(),
            href: url.to_string(),
            class: "btn btn-outline-danger btn-sm".to_string(),
            data,
            method: Some("POST".to_string()),
            disabled: false,
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        match &mut self {
            RowAction::Link { class: c, .. } | RowAction::Post { class: c, .. } => {
                *c = class.to_string()
            }
        }
        self
    }

    pub fn with_confirm(mut self, confirm: Confirm) -> Self {
        if let RowAction::Post { confirm: c, .. } = &mut self {
            *c = Some(confirm);
        }
        self
    }

    pub fn with_hidden(mut self, name: &str, value: &str) -> Self {
        if let RowAction::Post { hidden, .. } = &mut self {
            hidden.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn disabled(mut self, on: bool) -> Self {
        match &mut self {
            RowAction::Link { disabled, .. } | RowAction::Post { disabled, .. } => *disabled = on,
        }
        self
    }

    fn render(&self) -> Node {
        match self {
            RowAction::Link {
                text,
                href,
                class,
                data,
                method,
                disabled,
            } => {
                let mut a = el("a").attr("href", href.as_str()).class(class);
                for (k, v) in data {
                    a = a.attr(&format!("data-{}", k), v.as_str());
                }
                a = a.attr_opt("data-method", method.as_deref());
                if *disabled {
                    a = a.class("disabled").attr("aria-disabled", "true").attr("tabindex", "-1");
                }
                a.text(text.as_str()).into()
            }
            RowAction::Post {
                text,
                action,
                class,
                hidden,
                confirm,
                disabled,
            } => {
                let mut form = el("form")
                    .attr("method", "post")
                    .attr("action", action.as_str())
                    .class("d-inline");
                for (k, v) in hidden {
                    form = form.child(
                        el("input")
                            .attr("type", "hidden")
                            .attr("name", k.as_str())
                            .attr("value", v.as_str()),
                    );
                }
                let mut btn = el("button")
                    .attr("type", "submit")
                    .class(class)
                    .flag("data-coe-post")
                    .flag_if("disabled", *disabled);
                if let Some(c) = confirm {
                    btn = btn
                        .attr_opt("data-coe-confirm-title", c.title.as_deref())
                        .attr_opt("data-coe-confirm-body", c.body.as_deref())
                        .attr("data-coe-confirm-class", c.confirm_class.as_str());
                }
                form.child(btn.text(text.as_str())).into()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTableRow {
    pub cells: HashMap<String, Node>,
    pub actions: Vec<RowAction>,
    pub row_class: Option<String>,
    pub data_attributes: Vec<(String, String)>,
}

impl DataTableRow {
    pub fn cell(mut self, key: &str, value: impl Into<Node>) -> Self {
        self.cells.insert(key.to_string(), value.into());
        self
    }

    pub fn action(mut self, action: RowAction) -> Self {
        self.actions.push(action);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataTableModel {
    pub id: Option<String>,
    pub striped: bool,
    pub hover: bool,
    pub center: bool,
    pub bordered: bool,
    pub title: Option<String>,
    pub header_action: Option<HeaderAction>,
    /// 标题栏附加内容（如搜索框） / Extra header content such as a search box
    pub toolbar: Vec<Node>,
    pub pager: Option<Pagination>,
    pub actions_header: Option<String>,
    pub actions_column_width: Option<String>,
    pub columns: Vec<DataTableColumn>,
    pub rows: Vec<DataTableRow>,
}

impl Default for DataTableModel {
    fn default() -> Self {
        Self {
            id: None,
            striped: true,
            hover: false,
            center: true,
            bordered: true,
            title: None,
            header_action: None,
            toolbar: Vec::new(),
            pager: None,
            actions_header: None,
            actions_column_width: Some("160px".to_string()),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}

impl DataTableModel {
    /// 是否渲染操作列 / Whether the actions column is rendered
    pub fn has_actions_column(&self) -> bool {
        self.actions_header.is_some() || self.rows.iter().any(|r| !r.actions.is_empty())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len() + usize::from(self.has_actions_column())
    }
}

fn style_width(width: &Option<String>) -> Option<String> {
    width.as_ref().map(|w| format!("width: {}", w))
}

/// 渲染数据表 / Render a data table
pub fn render_data_table(model: &DataTableModel) -> Node {
    let with_actions = model.has_actions_column();

    let mut table_class = String::from("table mb-0");
    if model.striped {
        table_class.push_str(" table-striped");
    }
    if model.hover {
        table_class.push_str(" table-hover");
    }
    if model.bordered {
        table_class.push_str(" table-bordered");
    }
    if model.center {
        table_class.push_str(" align-middle");
    }

    let mut head_row = el("tr");
    for c in &model.columns {
        let th = el("th")
            .attr("scope", "col")
            .class(c.align_class.as_deref().unwrap_or(""))
            .attr_opt("style", style_width(&c.width))
            .text(c.header.as_str());
        head_row = head_row.child(th);
    }
    if with_actions {
        head_row = head_row.child(
            el("th")
                .attr("scope", "col")
                .class("text-end")
                .attr_opt("style", style_width(&model.actions_column_width))
                .text(model.actions_header.as_deref().unwrap_or("Actions")),
        );
    }

    let mut tbody = el("tbody");
    if model.rows.is_empty() {
        tbody = tbody.child(
            el("tr").child(
                el("td")
                    .attr("colspan", model.column_count().max(1).to_string())
                    .class("text-center text-muted py-4")
                    .text(NO_DATA),
            ),
        );
    }
    for row in &model.rows {
        let mut tr = el("tr").class(row.row_class.as_deref().unwrap_or(""));
        for (k, v) in &row.data_attributes {
            tr = tr.attr(&format!("data-{}", k), v.as_str());
        }
        for c in &model.columns {
            let mut td = el("td").class(c.align_class.as_deref().unwrap_or(""));
            if let Some(cell) = row.cells.get(&c.key) {
                td = td.child(cell.clone());
            }
            tr = tr.child(td);
        }
        if with_actions {
            let group = el("div")
                .class("d-inline-flex gap-1")
                .children(row.actions.iter().map(RowAction::render));
            tr = tr.child(el("td").class("text-end").child(group));
        }
        tbody = tbody.child(tr);
    }

    let table = el("table")
        .class(&table_class)
        .attr_opt("id", model.id.as_deref())
        .child(el("thead").class("table-light").child(head_row))
        .child(tbody);

    let mut card = el("div").class("card");
    if model.title.is_some() || model.header_action.is_some() || !model.toolbar.is_empty() {
        let mut header = el("div").class("card-header d-flex align-items-center gap-2");
        if let Some(t) = &model.title {
            header = header.child(el("h5").class("mb-0 me-auto").text(t.as_str()));
        }
        header = header.children(model.toolbar.iter().cloned());
        if let Some(a) = &model.header_action {
            header = header.child(render_header_action(a));
        }
        card = card.child(header);
    }
    card = card.child(el("div").class("table-responsive").child(table));
    if let Some(p) = &model.pager {
        if let Some(nav) = render_pager(p) {
            card = card.child(el("div").class("card-footer").child(nav));
        }
    }
    card.into()
}

fn render_header_action(a: &HeaderAction) -> Element {
    let mut link = el("a").attr("href", a.href.as_str()).class(&a.class);
    if let Some(icon) = &a.icon_class {
        link = link.child(el("i").class(icon)).text(" ");
    }
    link.text(a.text.as_str())
}

/// 单页时不渲染分页 / No pager for a single page
pub fn render_pager(p: &Pagination) -> Option<Node> {
    let pages = p.total_pages();
    if pages <= 1 {
        return None;
    }
    let current = p.page.clamp(1, pages);
    let item = |label: String, target: Option<u64>, active: bool| {
        let li = el("li")
            .class("page-item")
            .class(if active { "active" } else { "" })
            .class(if target.is_none() { "disabled" } else { "" });
        let inner = match target {
            Some(n) => el("a").class("page-link").attr("href", p.href(n)).text(label),
            None => el("span").class("page-link").text(label),
        };
        li.child(inner)
    };

    let mut ul = el("ul").class("pagination pagination-sm mb-0");
    ul = ul.child(item(
        "Previous".to_string(),
        (current > 1).then(|| current - 1),
        false,
    ));
    for n in 1..=pages {
        ul = ul.child(item(n.to_string(), Some(n), n == current));
    }
    ul = ul.child(item(
        "Next".to_string(),
        (current < pages).then(|| current + 1),
        false,
    ));
    Some(el("nav").attr("aria-label", "pagination").child(ul).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> DataTableModel {
        DataTableModel {
            title: Some("Customers".into()),
            columns: vec![
                DataTableColumn::new("ID", "id").align("text-end").width("90px"),
                DataTableColumn::new("Name", "name"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_table_renders_no_data_row() {
        let html = render_data_table(&model()).render();
        assert!(html.contains("<td colspan=\"2\" class=\"text-center text-muted py-4\">No data</td>"));
        assert!(!html.contains("Actions"));
    }

    #[test]
    fn test_actions_column_added_when_rows_have_actions() {
        let mut m = model();
        m.rows.push(
            DataTableRow::default()
                .cell("id", "1")
                .cell("name", "Acme <Ltd>")
                .action(RowAction::link("Edit", "/customers/edit/1"))
                .action(
                    RowAction::post("Delete", "/customers/delete/1")
                        .with_hidden("id", "1")
                        .with_confirm(Confirm::new("Delete Acme?", "This cannot be undone.")),
                ),
        );
        let html = render_data_table(&m).render();
        assert!(html.contains(">Actions</th>"));
        assert!(html.contains("Acme &lt;Ltd&gt;"));
        assert!(html.contains("href=\"/customers/edit/1\""));
        assert!(html.contains("data-coe-post"));
        assert!(html.contains("data-coe-confirm-title=\"Delete Acme?\""));
        assert!(html.contains("<input type=\"hidden\" name=\"id\" value=\"1\">"));
        assert_eq!(m.column_count(), 3);
    }

    #[test]
    fn test_ajax_delete_link_attributes() {
        let action = RowAction::ajax_delete(
            "Delete",
            "/customers/delete/7",
            "Acme",
            Confirm::new("Delete Acme?", ""),
        );
        let html = action.render().render();
        assert!(html.contains("data-coe-delete=\"true\""));
        assert!(html.contains("data-url=\"/customers/delete/7\""));
        assert!(html.contains("data-method=\"POST\""));
    }

    #[test]
    fn test_pager_links() {
        let p = Pagination {
            page: 2,
            page_size: 10,
            total_items: 35,
            keep: vec![("q".into(), "a b".into())],
            ..Default::default()
        };
        assert_eq!(p.total_pages(), 4);
        let html = render_pager(&p).unwrap().render();
        assert!(html.contains("href=\"?page=3&amp;q=a%20b\""));
        assert!(html.contains("class=\"page-item active\""));
        let single = Pagination {
            total_items: 3,
            ..Default::default()
        };
        assert!(render_pager(&single).is_none());
    }

    #[test]
    fn test_header_action_and_classes() {
        let mut m = model();
        m.hover = true;
        m.header_action = Some(HeaderAction {
            href: "/customers/create".into(),
            icon_class: Some("bi bi-plus".into()),
            ..Default::default()
        });
        let html = render_data_table(&m).render();
        assert!(html.contains("table mb-0 table-striped table-hover table-bordered align-middle"));
        assert!(html.contains("<a href=\"/customers/create\" class=\"btn btn-primary\"><i class=\"bi bi-plus\"></i> Add</a>"));
    }
}
