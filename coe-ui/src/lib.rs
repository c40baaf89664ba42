//! Coe.UI：schema 驱动的列表/表单渲染工具包
//! Coe.UI: schema-driven list and form rendering toolkit

pub mod client;
pub mod form;
pub mod html;
pub mod list;
pub mod notify;
pub mod resource;
pub mod schema;
pub mod server;

pub use client::{ApiClient, ClientError, CreateHandler, ListParams, ListSource, SchemaSource};
pub use form::{FormView, SubmitOutcome};
pub use html::{el, Element, Node};
pub use list::{ListState, ListView};
pub use notify::{Notifier, Toast, ToastKind, ToastOptions};
pub use resource::{CreateConfig, CreateOutcome, ResourceState, ResourceView};
pub use schema::{FormKind, FormSchema, ListSchema, Row, SchemaError};
