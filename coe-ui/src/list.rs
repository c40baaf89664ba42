//! 通用列表渲染器 / Generic list renderer
//!
//! 由 `ListSchema` 生成列定义并驱动分页、可搜索的数据表。搜索输入防抖后才拉取；
//! 显式搜索与外部 reload 信号立即拉取。每次拉取带单调递增的请求号，只应用最新
//! 请求的响应；卸载后到达的响应被丢弃。
//!
//! Builds columns from a `ListSchema` and drives a paged, searchable table.
//! Typed search is debounced; explicit search and reload signals fetch at once.
//! Every fetch carries a monotonically increasing request id and only the latest
//! request's response is applied; responses arriving after unmount are dropped.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{ListParams, ListSource};
use crate::html::{el, fragment, text, Node};
use crate::schema::{Align, ColumnType, ListSchema, Row};
use crate::server::table::{
    render_data_table, DataTableColumn, DataTableModel, DataTableRow, HeaderAction, Pagination,
    RowAction,
};

pub const DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_LIMIT: i64 = 20;
pub const ACTIONS_KEY: &str = "actions";
pub const ACTIONS_WIDTH: u32 = 140;
const EMPTY_CELL: &str = "-";

/// 每行操作生成器 / Per-row actions renderer
pub type ActionsRenderer = Arc<dyn Fn(&Row) -> Vec<RowAction> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Loading,
    /// 上次拉取失败，旧数据已丢弃 / Last fetch failed; previous rows discarded
    Error(String),
    Loaded { rows: Vec<Row>, total: Option<u64> },
}

/// 渲染用列定义 / Rendered column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ListColumn {
    pub title: String,
    pub key: String,
    pub column_type: ColumnType,
    pub width: Option<u32>,
    pub align: Align,
}

impl ListColumn {
    fn align_class(&self) -> &'static str {
        match self.align {
            Align::Left => "text-start",
            Align::Center => "text-center",
            Align::Right => "text-end",
        }
    }
}

/// N 个数据列，提供操作渲染器时追加一个 Actions 列
/// N data columns, plus a trailing Actions column iff an actions renderer is supplied
pub fn build_columns(schema: &ListSchema, with_actions: bool) -> Vec<ListColumn> {
    let mut cols: Vec<ListColumn> = schema
        .columns
        .iter()
        .map(|c| ListColumn {
            title: c.label.clone(),
            key: c.field.clone(),
            column_type: c.column_type,
            width: c.width,
            align: c.align.unwrap_or_default(),
        })
        .collect();
    if with_actions {
        cols.push(ListColumn {
            title: "Actions".to_string(),
            key: ACTIONS_KEY.to_string(),
            column_type: ColumnType::String,
            width: Some(ACTIONS_WIDTH),
            align: Align::Left,
        });
    }
    cols
}

fn plain(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 按列类型转换原始单元格值 / Transform a raw cell value by column type
pub fn format_cell(column_type: ColumnType, value: Option<&Value>) -> Node {
    match column_type {
        ColumnType::Datetime => {
            let raw = value.map(plain).unwrap_or_default();
            if raw.is_empty() {
                return text(EMPTY_CELL);
            }
            match DateTime::parse_from_rfc3339(&raw) {
                Ok(dt) => text(
                    dt.with_timezone(&Utc)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string(),
                ),
                Err(_) => text(raw),
            }
        }
        ColumnType::Boolean => {
            let on = match value {
                Some(Value::Bool(b)) => *b,
                Some(Value::String(s)) => matches!(s.as_str(), "true" | "1"),
                Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
                _ => false,
            };
            if on {
                el("span").class("badge bg-success").text("Yes").into()
            } else {
                el("span").class("badge bg-secondary").text("No").into()
            }
        }
        ColumnType::String | ColumnType::Number => text(value.map(plain).unwrap_or_default()),
    }
}

fn normalize_query(q: &str) -> Option<String> {
    let q = q.trim();
    (!q.is_empty()).then(|| q.to_string())
}

struct ListInner {
    mounted: bool,
    query: String,
    offset: i64,
    state: ListState,
    /// 最近一次发出的请求号 / Id of the latest issued request
    request_seq: u64,
    /// 防抖代数，新输入使旧定时器失效 / Debounce generation; new input voids older timers
    debounce_gen: u64,
    reload_signal: String,
}

/// 列表视图句柄，克隆体共享状态 / List view handle; clones share state
#[derive(Clone)]
pub struct ListView {
    title: String,
    schema: Arc<ListSchema>,
    source: Arc<dyn ListSource>,
    actions: Option<ActionsRenderer>,
    header_action: Option<HeaderAction>,
    limit: i64,
    debounce: Duration,
    inner: Arc<Mutex<ListInner>>,
}

impl std::fmt::Debug for ListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("title", &self.title)
            .field("model", &self.schema.model)
            .field("limit", &self.limit)
            .finish()
    }
}

impl ListView {
    pub fn new(title: &str, schema: ListSchema, source: Arc<dyn ListSource>) -> Self {
        Self {
            title: title.to_string(),
            schema: Arc::new(schema),
            source,
            actions: None,
            header_action: None,
            limit: DEFAULT_LIMIT,
            debounce: DEBOUNCE,
            inner: Arc::new(Mutex::new(ListInner {
                mounted: false,
                query: String::new(),
                offset: 0,
                state: ListState::Loading,
                request_seq: 0,
                debounce_gen: 0,
                reload_signal: String::new(),
            })),
        }
    }

    pub fn with_actions(mut self, actions: ActionsRenderer) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn with_header_action(mut self, action: HeaderAction) -> Self {
        self.header_action = Some(action);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = if limit > 0 { limit } else { DEFAULT_LIMIT };
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// 初始信号值，不触发拉取 / Initial signal value; does not fetch
    pub fn with_reload_signal(self, signal: impl Into<String>) -> Self {
        self.inner.lock().reload_signal = signal.into();
        self
    }

    pub fn schema(&self) -> &ListSchema {
        &self.schema
    }

    pub fn columns(&self) -> Vec<ListColumn> {
        build_columns(&self.schema, self.actions.is_some())
    }

    pub fn state(&self) -> ListState {
        self.inner.lock().state.clone()
    }

    pub fn query(&self) -> String {
        self.inner.lock().query.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.lock().mounted
    }

    /// 挂载并执行初始加载 / Mount and run the initial load
    pub async fn mount(&self) {
        self.inner.lock().mounted = true;
        self.load().await;
    }

    /// 卸载后所有在途响应与防抖定时器都不再生效
    /// After unmount, in-flight responses and pending debounce timers are no-ops
    pub fn unmount(&self) {
        let mut inner = self.inner.lock();
        inner.mounted = false;
        inner.debounce_gen += 1;
    }

    /// 用当前查询拉取一次 / Fetch once with the current query
    pub async fn load(&self) {
        let (id, params) = {
            let mut inner = self.inner.lock();
            if !inner.mounted {
                return;
            }
            inner.request_seq += 1;
            inner.state = ListState::Loading;
            (
                inner.request_seq,
                ListParams {
                    limit: Some(self.limit),
                    offset: Some(inner.offset),
                    q: normalize_query(&inner.query),
                },
            )
        };

        tracing::debug!(model = %self.schema.model, request = id, q = ?params.q, "list fetch");
        let result = self.source.fetch_list(params).await;

        let mut inner = self.inner.lock();
        if !inner.mounted {
            tracing::debug!(request = id, "list unmounted, dropping response");
            return;
        }
        if id != inner.request_seq {
            tracing::debug!(request = id, latest = inner.request_seq, "dropping stale list response");
            return;
        }
        inner.state = match result {
            Ok(page) => ListState::Loaded {
                rows: page.items,
                total: page.total,
            },
            Err(e) => {
                tracing::warn!(model = %self.schema.model, error = %e, "list fetch failed");
                ListState::Error(e.message())
            }
        };
    }

    /// 输入搜索词；静默防抖时长后从第一页拉取
    /// Typed search input; fetches from the first page after the debounce window
    pub fn set_query(&self, q: impl Into<String>) {
        let gen = {
            let mut inner = self.inner.lock();
            inner.query = q.into();
            inner.offset = 0;
            inner.debounce_gen += 1;
            inner.debounce_gen
        };
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.debounce).await;
            let current = {
                let inner = this.inner.lock();
                inner.mounted && inner.debounce_gen == gen
            };
            if current {
                this.load().await;
            }
        });
    }

    /// 回车/搜索图标：跳过防抖立即拉取 / Enter or search icon: bypass the debounce
    pub async fn search_now(&self) {
        {
            let mut inner = self.inner.lock();
            inner.debounce_gen += 1;
            inner.offset = 0;
        }
        self.load().await;
    }

    /// 信号值变化时立即用当前查询重新拉取
    /// Refetch at once with the current query when the signal value changes
    pub async fn set_reload_signal(&self, signal: impl Into<String>) {
        let signal = signal.into();
        let changed = {
            let mut inner = self.inner.lock();
            if inner.reload_signal == signal {
                false
            } else {
                inner.reload_signal = signal;
                true
            }
        };
        if changed {
            self.load().await;
        }
    }

    /// 跳到第 `page` 页（从 1 开始）/ Go to `page`, 1-based
    pub async fn goto_page(&self, page: u64) {
        self.inner.lock().offset = coe::http::page_offset(page, self.limit);
        self.load().await;
    }

    fn search_box(&self, query: &str) -> Node {
        el("form")
            .class("d-flex gap-1")
            .attr("role", "search")
            .attr("method", "get")
            .child(
                el("input")
                    .attr("type", "search")
                    .class("form-control form-control-sm")
                    .attr("name", "q")
                    .attr("placeholder", "Search")
                    .attr("value", query)
                    .attr("style", "width: 220px"),
            )
            .child(
                el("button")
                    .attr("type", "submit")
                    .class("btn btn-outline-secondary btn-sm")
                    .text("Refresh"),
            )
            .into()
    }

    /// 渲染当前状态 / Render the current state
    pub fn render(&self) -> Node {
        let (state, query, offset) = {
            let inner = self.inner.lock();
            (inner.state.clone(), inner.query.clone(), inner.offset)
        };

        let mut model = DataTableModel {
            title: Some(self.title.clone()),
            header_action: self.header_action.clone(),
            toolbar: vec![self.search_box(&query)],
            actions_column_width: Some(format!("{}px", ACTIONS_WIDTH)),
            ..Default::default()
        };

        let (rows, total) = match state {
            ListState::Loading => {
                return wrap_body(
                    &model,
                    el("div")
                        .class("d-flex justify-content-center py-5")
                        .child(
                            el("div")
                                .class("spinner-border")
                                .attr("role", "status")
                                .child(el("span").class("visually-hidden").text("Loading...")),
                        )
                        .into(),
                );
            }
            ListState::Error(msg) => {
                return wrap_body(
                    &model,
                    el("div")
                        .class("alert alert-danger m-3")
                        .attr("role", "alert")
                        .child(el("strong").text("Error loading data"))
                        .child(el("div").text(msg))
                        .into(),
                );
            }
            ListState::Loaded { rows, total } => (rows, total),
        };

        let columns = self.columns();
        model.columns = columns
            .iter()
            .filter(|c| c.key != ACTIONS_KEY)
            .map(|c| {
                let mut col = DataTableColumn::new(&c.title, &c.key).align(c.align_class());
                if let Some(w) = c.width {
                    col = col.width(&format!("{}px", w));
                }
                col
            })
            .collect();
        if self.actions.is_some() {
            model.actions_header = Some("Actions".to_string());
        }
        model.rows = rows
            .iter()
            .map(|row| {
                let mut r = DataTableRow::default();
                for c in columns.iter().filter(|c| c.key != ACTIONS_KEY) {
                    r = r.cell(&c.key, format_cell(c.column_type, row.get(&c.key)));
                }
                if let Some(id) = row.get("id") {
                    r.data_attributes.push(("id".to_string(), plain(id)));
                }
                if let Some(actions) = &self.actions {
                    r.actions = actions(row);
                }
                r
            })
            .collect();
        if let Some(total) = total {
            model.pager = Some(Pagination {
                page: (offset / self.limit) as u64 + 1,
                page_size: self.limit as u64,
                total_items: total,
                keep: normalize_query(&query)
                    .map(|q| vec![("q".to_string(), q)])
                    .unwrap_or_default(),
                ..Default::default()
            });
        }
        render_data_table(&model)
    }
}

// 加载/错误状态沿用卡片头部，表体换成状态面板
// loading and error states keep the card header and swap the body for a panel
fn wrap_body(model: &DataTableModel, body: Node) -> Node {
    let mut header = el("div").class("card-header d-flex align-items-center gap-2");
    if let Some(t) = &model.title {
        header = header.child(el("h5").class("mb-0 me-auto").text(t.as_str()));
    }
    header = header.children(model.toolbar.iter().cloned());
    if let Some(a) = &model.header_action {
        header = header.child(
            el("a")
                .attr("href", a.href.as_str())
                .class(&a.class)
                .text(a.text.as_str()),
        );
    }
    el("div")
        .class("card")
        .child(header)
        .child(fragment(vec![body]))
        .into()
}
