//! 服务端声明式渲染 / Server-side declarative rendering
//!
//! 表格与表单描述对象经纯函数转为 HTML 节点树；`behavior` 是绑定在 data-* 属性上的
//! 伴随行为层。
//! Table and form descriptors become HTML node trees through pure functions;
//! `behavior` is the companion layer bound to data-* attributes.

pub mod behavior;
pub mod confirm;
pub mod form;
pub mod table;

pub use behavior::{Behavior, ConfirmDialog, HttpReply, Outcome, OutgoingRequest, Transport};
pub use confirm::{confirm_dialog, confirm_template, toast_host, ConfirmOptions};
pub use form::{
    render_field, render_form, ButtonKind, FieldKind, FormButton, FormField, FormMethod,
    FormModel, FormOption, ANTIFORGERY_FIELD,
};
pub use table::{
    render_data_table, render_pager, Confirm, DataTableColumn, DataTableModel, DataTableRow,
    HeaderAction, Pagination, RowAction,
};
