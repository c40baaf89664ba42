//! 资源编排：schema 加载、列表渲染与新建弹窗
//! Resource orchestrator: schema loading, list rendering and the create modal
//!
//! 状态机 `SchemaLoading → SchemaError | SchemaReady`。新建成功后关闭弹窗、发出
//! 成功通知并递增内部 reload 计数；列表的 reload 信号由外部信号与内部计数拼接
//! 而成，两者互不覆盖。
//! State machine `SchemaLoading → SchemaError | SchemaReady`. A successful
//! create closes the modal, raises a success toast and bumps the internal
//! reload counter; the list's reload signal concatenates the external signal
//! with that counter so neither clobbers the other.

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::client::{ClientError, CreateHandler, ListSource, SchemaSource};
use crate::form::{FormView, SubmitOutcome};
use crate::html::{el, fragment, Node};
use crate::list::{ActionsRenderer, ListView};
use crate::notify::{Notifier, ToastOptions};
use crate::schema::{FormKind, FormSchema, Row};
use crate::server::form::FormButton;
use crate::server::table::HeaderAction;

pub const NO_ACTIVE_LIST_SCHEMA: &str = "No active list schema configured for this model.";
pub const NO_ACTIVE_FORM_SCHEMA: &str = "No active create form schema";
const CREATE_ANCHOR: &str = "#create";

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState {
    SchemaLoading,
    SchemaError { title: String, description: String },
    SchemaReady,
}

/// 新建入口配置；缺省时不显示 Add 按钮
/// Create affordance; without it the Add button is hidden
#[derive(Clone)]
pub struct CreateConfig {
    pub handler: Arc<dyn CreateHandler>,
    pub add_label: String,
    pub ok_text: String,
    /// 409 冲突归属的字段 / Field a 409 conflict is attributed to
    pub conflict_field: Option<String>,
    pub success_message: String,
}

impl CreateConfig {
    pub fn new(handler: Arc<dyn CreateHandler>) -> Self {
        Self {
            handler,
            add_label: "Add".to_string(),
            ok_text: "Create".to_string(),
            conflict_field: Some("name".to_string()),
            success_message: "Created".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Row),
    /// 本地校验未通过，弹窗保持打开 / Local validation failed; modal stays open
    Invalid,
    /// 服务端拒绝，弹窗保持打开 / Server rejected; modal stays open
    Rejected(ClientError),
    /// 没有打开的新建弹窗 / No create modal is open
    NotOpen,
}

struct ResourceInner {
    mounted: bool,
    state: ResourceState,
    list: Option<ListView>,
    modal: Option<FormView>,
    external_reload: String,
    internal_reload: u64,
}

impl ResourceInner {
    fn combined_reload(&self) -> String {
        format!("{}-{}", self.external_reload, self.internal_reload)
    }
}

pub struct ResourceView {
    model: String,
    title: String,
    schemas: Arc<dyn SchemaSource>,
    source: Arc<dyn ListSource>,
    create: Option<CreateConfig>,
    actions: Option<ActionsRenderer>,
    notifier: Notifier,
    inner: Mutex<ResourceInner>,
}

impl ResourceView {
    pub fn new(
        model: &str,
        schemas: Arc<dyn SchemaSource>,
        source: Arc<dyn ListSource>,
        notifier: Notifier,
    ) -> Self {
        Self {
            model: model.to_string(),
            title: model.to_string(),
            schemas,
            source,
            create: None,
            actions: None,
            notifier,
            inner: Mutex::new(ResourceInner {
                mounted: false,
                state: ResourceState::SchemaLoading,
                list: None,
                modal: None,
                external_reload: String::new(),
                internal_reload: 0,
            }),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        if !title.is_empty() {
            self.title = title.to_string();
        }
        self
    }

    pub fn with_create(mut self, create: CreateConfig) -> Self {
        self.create = Some(create);
        self
    }

    pub fn with_actions(mut self, actions: ActionsRenderer) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn state(&self) -> ResourceState {
        self.inner.lock().state.clone()
    }

    pub fn list(&self) -> Option<ListView> {
        self.inner.lock().list.clone()
    }

    pub fn modal(&self) -> Option<FormView> {
        self.inner.lock().modal.clone()
    }

    pub fn is_modal_open(&self) -> bool {
        self.inner.lock().modal.is_some()
    }

    pub fn reload_signal(&self) -> String {
        self.inner.lock().combined_reload()
    }

    /// 加载列表 schema，成功后挂载列表 / Load the list schema, then mount the list
    pub async fn mount(&self) {
        {
            let mut inner = self.inner.lock();
            inner.mounted = true;
            inner.state = ResourceState::SchemaLoading;
        }

        let fetched = self.schemas.list_schema(&self.model).await;

        let list = {
            let mut inner = self.inner.lock();
            if !inner.mounted {
                return;
            }
            let schema = fetched.map_err(|e| {
                if e.is_not_found() {
                    NO_ACTIVE_LIST_SCHEMA.to_string()
                } else {
                    e.message()
                }
            });
            let schema = schema.and_then(|s| s.validate().map(|_| s).map_err(|e| e.to_string()));
            match schema {
                Ok(schema) => {
                    let mut list = ListView::new(&self.title, schema, Arc::clone(&self.source))
                        .with_reload_signal(inner.combined_reload());
                    if let Some(actions) = &self.actions {
                        list = list.with_actions(Arc::clone(actions));
                    }
                    if let Some(c) = &self.create {
                        list = list.with_header_action(HeaderAction {
                            text: c.add_label.clone(),
                            href: CREATE_ANCHOR.to_string(),
                            ..Default::default()
                        });
                    }
                    inner.state = ResourceState::SchemaReady;
                    inner.list = Some(list.clone());
                    list
                }
                Err(description) => {
                    tracing::warn!(model = %self.model, %description, "list schema unavailable");
                    let description = if description.trim().is_empty() {
                        NO_ACTIVE_LIST_SCHEMA.to_string()
                    } else {
                        description
                    };
                    inner.state = ResourceState::SchemaError {
                        title: format!("Cannot render {}", self.title),
                        description,
                    };
                    return;
                }
            }
        };
        list.mount().await;
    }

    pub fn unmount(&self) {
        let mut inner = self.inner.lock();
        inner.mounted = false;
        inner.modal = None;
        if let Some(list) = &inner.list {
            list.unmount();
        }
    }

    /// 外部 reload 信号 / External reload signal
    pub async fn set_reload_signal(&self, signal: impl Into<String>) {
        let (list, combined) = {
            let mut inner = self.inner.lock();
            inner.external_reload = signal.into();
            (inner.list.clone(), inner.combined_reload())
        };
        if let Some(list) = list {
            list.set_reload_signal(combined).await;
        }
    }

    /// 打开新建弹窗（加载 create 表单 schema）/ Open the create modal, loading the create form schema
    pub async fn open_create(&self) -> bool {
        if self.create.is_none() || self.state() != ResourceState::SchemaReady {
            return false;
        }
        let form = match self.schemas.form_schema(&self.model, FormKind::Create).await {
            Ok(dto) => FormSchema::try_from(dto)
                .and_then(FormView::new)
                .map_err(|e| e.to_string()),
            Err(e) if e.is_not_found() => Err(NO_ACTIVE_FORM_SCHEMA.to_string()),
            Err(e) => Err(e.message()),
        };
        match form {
            Ok(form) => {
                let mut inner = self.inner.lock();
                if !inner.mounted {
                    return false;
                }
                inner.modal = Some(form);
                true
            }
            Err(msg) => {
                tracing::warn!(model = %self.model, error = %msg, "create form unavailable");
                self.notifier.error(msg, ToastOptions::default());
                false
            }
        }
    }

    pub fn cancel_create(&self) {
        self.inner.lock().modal = None;
    }

    /// 设置弹窗内字段值 / Set a value in the open create form
    pub fn set_create_value(&self, name: &str, value: impl Into<Value>) -> bool {
        match self.inner.lock().modal.as_mut() {
            Some(form) => form.set_value(name, value),
            None => false,
        }
    }

    /// 提交新建弹窗 / Submit the create modal
    pub async fn submit_create(&self) -> CreateOutcome {
        let Some(cfg) = &self.create else {
            return CreateOutcome::NotOpen;
        };
        let Some(mut form) = self.modal() else {
            return CreateOutcome::NotOpen;
        };
        form.set_error_text(None);

        let mut created = None;
        let outcome = {
            let handler = Arc::clone(&cfg.handler);
            let slot = &mut created;
            form.submit(|values| async move {
                *slot = Some(handler.create(values).await?);
                Ok::<(), ClientError>(())
            })
            .await
        };

        match outcome {
            SubmitOutcome::Submitted => {
                self.notifier
                    .success(cfg.success_message.clone(), ToastOptions::default());
                let (list, combined) = {
                    let mut inner = self.inner.lock();
                    inner.modal = None;
                    inner.internal_reload += 1;
                    (inner.list.clone(), inner.combined_reload())
                };
                tracing::info!(model = %self.model, reload = %combined, "created");
                if let Some(list) = list {
                    list.set_reload_signal(combined).await;
                }
                CreateOutcome::Created(created.unwrap_or_default())
            }
            SubmitOutcome::Invalid(_) => {
                self.put_back(form);
                CreateOutcome::Invalid
            }
            SubmitOutcome::Failed(e) => {
                tracing::warn!(model = %self.model, error = %e, "create failed");
                apply_create_error(&mut form, &e, cfg.conflict_field.as_deref());
                let msg = e.message();
                self.notifier.error(
                    if msg.is_empty() { "Create failed".to_string() } else { msg },
                    ToastOptions::default(),
                );
                self.put_back(form);
                CreateOutcome::Rejected(e)
            }
        }
    }

    // 弹窗仍打开时写回表单状态 / write the form back only while the modal is still open
    fn put_back(&self, form: FormView) {
        let mut inner = self.inner.lock();
        if inner.mounted && inner.modal.is_some() {
            inner.modal = Some(form);
        }
    }

    pub fn render(&self) -> Node {
        let (state, list, modal) = {
            let inner = self.inner.lock();
            (inner.state.clone(), inner.list.clone(), inner.modal.clone())
        };
        match state {
            ResourceState::SchemaLoading => el("div")
                .class("d-flex justify-content-center py-5")
                .child(el("div").class("spinner-border").attr("role", "status"))
                .into(),
            ResourceState::SchemaError { title, description } => el("div")
                .class("alert alert-danger")
                .attr("role", "alert")
                .child(el("h6").class("alert-heading").text(title))
                .child(el("div").text(description))
                .into(),
            ResourceState::SchemaReady => {
                let mut nodes = Vec::new();
                if let Some(list) = list {
                    nodes.push(list.render());
                }
                if let (Some(form), Some(cfg)) = (modal, &self.create) {
                    nodes.push(create_modal(&form, cfg));
                }
                fragment(nodes)
            }
        }
    }
}

/// 冲突映射到归属字段，字段级校验错误映射到对应字段，其余进顶部横幅
/// Conflicts go to the owning field and field-level validation errors to their
/// fields; anything else lands in the top-level banner
fn apply_create_error(form: &mut FormView, err: &ClientError, conflict_field: Option<&str>) {
    match err {
        ClientError::Conflict(_) => {
            let label = conflict_field.and_then(|name| {
                form.fields()
                    .iter()
                    .find(|f| f.name == name)
                    .map(|f| (f.name.clone(), f.label.clone()))
            });
            if let Some((name, label)) = label {
                form.set_field_error(&name, format!("{} already exists", label));
                return;
            }
        }
        ClientError::Validation { errors, .. } if !errors.is_empty() => {
            let mut mapped = false;
            for e in errors {
                if form.fields().iter().any(|f| f.name == e.field) {
                    let msg = e.message.clone().unwrap_or_else(|| e.code.clone());
                    form.set_field_error(&e.field, msg);
                    mapped = true;
                }
            }
            if mapped {
                return;
            }
        }
        _ => {}
    }
    let msg = err.message();
    form.set_error_text(Some(if msg.is_empty() {
        "Create failed".to_string()
    } else {
        msg
    }));
}

fn create_modal(form: &FormView, cfg: &CreateConfig) -> Node {
    let body = form.render(
        CREATE_ANCHOR,
        vec![FormButton::submit(&cfg.ok_text), FormButton::cancel("#")],
    );
    el("div")
        .class("modal d-block")
        .attr("tabindex", "-1")
        .attr("role", "dialog")
        .attr("aria-modal", "true")
        .child(
            el("div").class("modal-dialog").child(
                el("div")
                    .class("modal-content")
                    .child(
                        el("div")
                            .class("modal-header")
                            .child(el("h5").class("modal-title").text(cfg.add_label.as_str())),
                    )
                    .child(el("div").class("modal-body").child(body)),
            ),
        )
        .into()
}
