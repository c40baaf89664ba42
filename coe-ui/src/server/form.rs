//! 表单描述与渲染 / Form descriptor and renderer

use crate::html::{el, Element, Node};

pub const ANTIFORGERY_FIELD: &str = "__RequestVerificationToken";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMethod {
    #[default]
    Post,
    Get,
}

impl FormMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormMethod::Post => "post",
            FormMethod::Get => "get",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormOption {
    pub value: String,
    pub text: String,
    pub selected: bool,
}

impl FormOption {
    pub fn new(value: &str, text: &str) -> Self {
        Self {
            value: value.to_string(),
            text: text.to_string(),
            selected: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    TextArea { rows: u32 },
    Password,
    Email,
    Number {
        step: Option<String>,
        min: Option<String>,
        max: Option<String>,
    },
    Date,
    DateTime,
    Select {
        options: Vec<FormOption>,
        multiple: bool,
    },
    Checkbox,
    Radio { options: Vec<FormOption> },
    Hidden,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: Option<String>,
    pub placeholder: Option<String>,
    pub help: Option<String>,
    pub required: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub pattern: Option<String>,
    /// 字段级校验消息 / Field-level validation message
    pub error: Option<String>,
}

impl FormField {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            value: None,
            placeholder: None,
            help: None,
            required: false,
            min_length: None,
            max_length: None,
            pattern: None,
            error: None,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn placeholder(mut self, p: impl Into<String>) -> Self {
        self.placeholder = Some(p.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_length(mut self, n: u32) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn error(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into());
        self
    }

    fn control_id(&self, form_id: Option<&str>) -> String {
        match form_id {
            Some(f) => format!("{}_{}", f, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ButtonKind {
    Submit,
    Reset,
    Link { href: String },
    Back,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormButton {
    pub kind: ButtonKind,
    pub text: String,
    pub class: String,
}

impl FormButton {
    pub fn submit(text: &str) -> Self {
        Self {
            kind: ButtonKind::Submit,
            text: text.to_string(),
            class: "btn btn-primary".to_string(),
        }
    }

    pub fn cancel(href: &str) -> Self {
        Self {
            kind: ButtonKind::Link {
                href: href.to_string(),
            },
            text: "Cancel".to_string(),
            class: "btn btn-outline-secondary".to_string(),
        }
    }

    pub fn back() -> Self {
        Self {
            kind: ButtonKind::Back,
            text: "Back".to_string(),
            class: "btn btn-outline-secondary".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormModel {
    pub id: Option<String>,
    pub action: String,
    pub method: FormMethod,
    pub enctype: Option<String>,
    /// 存在时渲染隐藏的防伪字段 / Rendered as a hidden antiforgery field when set
    pub antiforgery_token: Option<String>,
    pub use_ajax: bool,
    pub fields: Vec<FormField>,
    pub buttons: Vec<FormButton>,
    /// 表单级错误，显示在字段上方 / Form-level errors shown above the fields
    pub errors: Vec<String>,
}

impl Default for FormModel {
    fn default() -> Self {
        Self {
            id: None,
            action: "/".to_string(),
            method: FormMethod::Post,
            enctype: None,
            antiforgery_token: None,
            use_ajax: false,
            fields: Vec::new(),
            buttons: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl FormModel {
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.fields.iter().any(|f| f.error.is_some())
    }
}

fn apply_constraints(mut input: Element, field: &FormField) -> Element {
    input = input
        .flag_if("required", field.required)
        .attr_opt("minlength", field.min_length.map(|n| n.to_string()))
        .attr_opt("maxlength", field.max_length.map(|n| n.to_string()))
        .attr_opt("pattern", field.pattern.as_deref())
        .attr_opt("placeholder", field.placeholder.as_deref());
    if field.error.is_some() {
        input = input.class("is-invalid");
    }
    input
}

fn render_options(options: &[FormOption], current: Option<&str>) -> Vec<Node> {
    options
        .iter()
        .map(|o| {
            let selected = o.selected || current == Some(o.value.as_str());
            el("option")
                .attr("value", o.value.as_str())
                .flag_if("selected", selected)
                .text(o.text.as_str())
                .into()
        })
        .collect()
}

fn feedback(field: &FormField) -> Option<Node> {
    field.error.as_ref().map(|e| {
        el("div")
            .class("invalid-feedback d-block")
            .attr("data-valmsg-for", field.name.as_str())
            .text(e.as_str())
            .into()
    })
}

/// 渲染单个字段（含标签、控件与校验消息）
/// Render one field with its label, control and validation message
pub fn render_field(field: &FormField, form_id: Option<&str>) -> Node {
    let id = field.control_id(form_id);
    let value = field.value.as_deref();

    match &field.kind {
        FieldKind::Hidden => el("input")
            .attr("type", "hidden")
            .attr("name", field.name.as_str())
            .attr("value", value.unwrap_or(""))
            .into(),
        FieldKind::Checkbox => {
            let checked = matches!(value, Some("true") | Some("on") | Some("1"));
            let input = el("input")
                .attr("type", "checkbox")
                .class("form-check-input")
                .attr("id", id.as_str())
                .attr("name", field.name.as_str())
                .attr("value", "true")
                .flag_if("checked", checked);
            let mut wrap = el("div")
                .class("mb-3 form-check")
                .child(apply_constraints(input, field))
                .child(
                    el("label")
                        .class("form-check-label")
                        .attr("for", id.as_str())
                        .text(field.label.as_str()),
                );
            if let Some(f) = feedback(field) {
                wrap = wrap.child(f);
            }
            wrap.into()
        }
        FieldKind::Radio { options } => {
            let mut group = el("div").class("mb-3").child(
                el("div").class("form-label").text(field.label.as_str()),
            );
            for (i, o) in options.iter().enumerate() {
                let rid = format!("{}_{}", id, i);
                let checked = o.selected || value == Some(o.value.as_str());
                group = group.child(
                    el("div")
                        .class("form-check")
                        .child(
                            el("input")
                                .attr("type", "radio")
                                .class("form-check-input")
                                .attr("id", rid.as_str())
                                .attr("name", field.name.as_str())
                                .attr("value", o.value.as_str())
                                .flag_if("checked", checked)
                                .flag_if("required", field.required),
                        )
                        .child(
                            el("label")
                                .class("form-check-label")
                                .attr("for", rid.as_str())
                                .text(o.text.as_str()),
                        ),
                );
            }
            if let Some(f) = feedback(field) {
                group = group.child(f);
            }
            group.into()
        }
        kind => {
            let control = match kind {
                FieldKind::TextArea { rows } => el("textarea")
                    .class("form-control")
                    .attr("rows", rows.to_string())
                    .text(value.unwrap_or("")),
                FieldKind::Select { options, multiple } => el("select")
                    .class("form-select")
                    .flag_if("multiple", *multiple)
                    .children(render_options(options, value)),
                FieldKind::Number { step, min, max } => el("input")
                    .attr("type", "number")
                    .class("form-control")
                    .attr_opt("step", step.as_deref())
                    .attr_opt("min", min.as_deref())
                    .attr_opt("max", max.as_deref())
                    .attr_opt("value", value),
                other => {
                    let ty = match other {
                        FieldKind::Password => "password",
                        FieldKind::Email => "email",
                        FieldKind::Date => "date",
                        FieldKind::DateTime => "datetime-local",
                        _ => "text",
                    };
                    let input = el("input").attr("type", ty).class("form-control");
                    // 密码不回显 / never echo passwords back
                    if ty == "password" {
                        input
                    } else {
                        input.attr_opt("value", value)
                    }
                }
            };
            let control = apply_constraints(
                control.attr("id", id.as_str()).attr("name", field.name.as_str()),
                field,
            );
            let mut group = el("div")
                .class("mb-3")
                .child(
                    el("label")
                        .class("form-label")
                        .attr("for", id.as_str())
                        .text(field.label.as_str()),
                )
                .child(control);
            if let Some(help) = &field.help {
                group = group.child(el("div").class("form-text").text(help.as_str()));
            }
            if let Some(f) = feedback(field) {
                group = group.child(f);
            }
            group.into()
        }
    }
}

fn render_button(b: &FormButton) -> Node {
    match &b.kind {
        ButtonKind::Submit => el("button")
            .attr("type", "submit")
            .class(&b.class)
            .text(b.text.as_str())
            .into(),
        ButtonKind::Reset => el("button")
            .attr("type", "reset")
            .class(&b.class)
            .text(b.text.as_str())
            .into(),
        ButtonKind::Link { href } => el("a")
            .attr("href", href.as_str())
            .class(&b.class)
            .text(b.text.as_str())
            .into(),
        ButtonKind::Back => el("button")
            .attr("type", "button")
            .class(&b.class)
            .attr("data-coe-back", "true")
            .text(b.text.as_str())
            .into(),
    }
}

/// 渲染整个表单 / Render a whole form
pub fn render_form(model: &FormModel) -> Node {
    let mut form = el("form")
        .attr_opt("id", model.id.as_deref())
        .attr("action", model.action.as_str())
        .attr("method", model.method.as_str())
        .attr_opt("enctype", model.enctype.as_deref())
        .flag("novalidate");
    if model.use_ajax {
        form = form.attr("data-coe-ajax", "true");
    }
    if let Some(token) = &model.antiforgery_token {
        form = form.child(
            el("input")
                .attr("type", "hidden")
                .attr("name", ANTIFORGERY_FIELD)
                .attr("value", token.as_str()),
        );
    }

    // 校验摘要槽：AJAX 失败时由行为层写入
    // Validation summary slot, written by the behavior layer on AJAX failure
    let mut summary = el("div")
        .class("text-danger mb-2")
        .attr("data-coe-val-summary", "true")
        .attr("role", "alert");
    if !model.errors.is_empty() {
        summary = summary.child(
            el("ul")
                .class("mb-0")
                .children(model.errors.iter().map(|e| el("li").text(e.as_str()))),
        );
    }
    form = form.child(summary);

    for f in &model.fields {
        form = form.child(render_field(f, model.id.as_deref()));
    }

    let buttons = if model.buttons.is_empty() {
        vec![FormButton::submit("Save")]
    } else {
        model.buttons.clone()
    };
    form = form.child(
        el("div")
            .class("d-flex gap-2")
            .children(buttons.iter().map(render_button)),
    );
    form.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_field_with_constraints_and_error() {
        let f = FormField::text("name", "Name")
            .value("Ac\"me")
            .required()
            .max_length(128)
            .error("A customer with this name already exists.");
        let html = render_field(&f, None).render();
        assert!(html.contains("<label class=\"form-label\" for=\"name\">Name</label>"));
        assert!(html.contains("value=\"Ac&quot;me\""));
        assert!(html.contains(" required"));
        assert!(html.contains("maxlength=\"128\""));
        assert!(html.contains("is-invalid"));
        assert!(html.contains("A customer with this name already exists."));
    }

    #[test]
    fn test_select_marks_current_value() {
        let f = FormField::new(
            "tier",
            "Tier",
            FieldKind::Select {
                options: vec![FormOption::new("a", "A"), FormOption::new("b", "B")],
                multiple: false,
            },
        )
        .value("b");
        let html = render_field(&f, Some("cust")).render();
        assert!(html.contains("<option value=\"a\">A</option><option value=\"b\" selected>B</option>"));
        assert!(html.contains("id=\"cust_tier\""));
    }

    #[test]
    fn test_form_ajax_token_summary_and_default_button() {
        let model = FormModel {
            id: Some("customer-form".into()),
            action: "/customers/create".into(),
            antiforgery_token: Some("tok".into()),
            use_ajax: true,
            fields: vec![FormField::text("name", "Name")],
            errors: vec!["Something failed".into()],
            ..Default::default()
        };
        let html = render_form(&model).render();
        assert!(html.contains("data-coe-ajax=\"true\""));
        assert!(html.contains("name=\"__RequestVerificationToken\" value=\"tok\""));
        assert!(html.contains("data-coe-val-summary=\"true\""));
        assert!(html.contains("<li>Something failed</li>"));
        assert!(html.contains("<button type=\"submit\" class=\"btn btn-primary\">Save</button>"));
        assert!(model.has_errors());
    }

    #[test]
    fn test_password_value_not_echoed() {
        let f = FormField::new("pw", "Password", FieldKind::Password).value("secret");
        assert!(!render_field(&f, None).render().contains("secret"));
    }
}
