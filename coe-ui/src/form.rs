//! 通用表单渲染器 / Generic form renderer
//!
//! 输入为按 orderNo 排好的字段描述，输出为带校验规则的控件；提交时收集按字段名
//! 组织的值并交给调用方的异步回调，本身不发任何网络请求。
//!
//! Field specs in, one control per spec with validation rules derived from the
//! spec; submit collects values keyed by name and hands them to the caller's
//! async callback. The renderer never calls the network itself.

use coe::http::FieldError;
use regex::Regex;
use serde_json::Value;
use std::future::Future;

use crate::html::Node;
use crate::schema::{FieldSpec, FormSchema, Row, SchemaError, Widget};
use crate::server::form::{
    render_form, FieldKind, FormButton, FormField, FormModel, FormOption,
};

const TEXTAREA_ROWS: u32 = 4;

/// 由字段描述编译出的校验规则 / Validation rules compiled from a field spec
#[derive(Debug, Clone)]
struct FieldRule {
    pattern: Option<Regex>,
}

/// 提交结果 / Submission outcome
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<E> {
    /// 本地校验未通过，未调用回调 / Local validation failed; callback not invoked
    Invalid(Vec<FieldError>),
    Submitted,
    Failed(E),
}

#[derive(Debug, Clone)]
pub struct FormView {
    schema: FormSchema,
    rules: Vec<FieldRule>,
    values: Row,
    field_errors: Vec<FieldError>,
    error_text: Option<String>,
    submitting: bool,
}

impl FormView {
    /// 编译正则；非法正则在此处报错 / Compiles patterns; an invalid regex fails here
    pub fn new(schema: FormSchema) -> Result<Self, SchemaError> {
        let rules = schema
            .fields
            .iter()
            .map(|f| {
                let pattern = match &f.pattern {
                    Some(p) => Some(Regex::new(p).map_err(|e| SchemaError::InvalidPattern {
                        field: f.name.clone(),
                        message: e.to_string(),
                    })?),
                    None => None,
                };
                Ok(FieldRule { pattern })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;
        Ok(Self {
            schema,
            rules,
            values: Row::new(),
            field_errors: Vec::new(),
            error_text: None,
            submitting: false,
        })
    }

    pub fn with_initial(mut self, initial: Row) -> Self {
        for f in &self.schema.fields {
            if let Some(v) = initial.get(&f.name) {
                self.values.insert(f.name.clone(), v.clone());
            }
        }
        self
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.schema.fields
    }

    /// 未知字段名被忽略 / Unknown field names are ignored
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> bool {
        if self.field(name).is_none() {
            tracing::debug!(field = name, "ignoring value for unknown field");
            return false;
        }
        self.values.insert(name.to_string(), value.into());
        self.clear_field_error(name);
        true
    }

    /// 按控件类型转换提交上来的文本 / Convert submitted text by widget kind
    pub fn set_text(&mut self, name: &str, raw: &str) -> bool {
        let Some(field) = self.field(name) else {
            return false;
        };
        let value = match field.widget {
            Widget::Switch => Value::Bool(matches!(raw, "true" | "on" | "1")),
            Widget::Number if !raw.trim().is_empty() => match raw.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(raw.to_string())),
            },
            _ => Value::String(raw.to_string()),
        };
        self.set_value(name, value)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// 按字段顺序收集的值 / Values collected in field order
    pub fn values(&self) -> Row {
        let mut out = Row::new();
        for f in &self.schema.fields {
            if let Some(v) = self.values.get(&f.name) {
                out.insert(f.name.clone(), v.clone());
            }
        }
        out
    }

    /// 顶部错误信息（例如服务端往返失败）/ Top-level error, e.g. a failed server round trip
    pub fn set_error_text(&mut self, message: Option<String>) {
        self.error_text = message;
    }

    pub fn error_text(&self) -> Option<&str> {
        self.error_text.as_deref()
    }

    /// 由调用方挂到某个字段上的错误 / Error attached to a field by the caller
    pub fn set_field_error(&mut self, name: &str, message: impl Into<String>) {
        self.clear_field_error(name);
        self.field_errors
            .push(FieldError::new(name, "server", message.into()));
    }

    pub fn field_error(&self, name: &str) -> Option<&str> {
        self.field_errors
            .iter()
            .find(|e| e.field == name)
            .and_then(|e| e.message.as_deref())
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.schema.fields.iter().find(|f| f.name == name)
    }

    fn clear_field_error(&mut self, name: &str) {
        self.field_errors.retain(|e| e.field != name);
    }

    /// 同步校验全部字段 / Validate every field synchronously
    pub fn validate(&self) -> Result<Row, Vec<FieldError>> {
        let mut errors = Vec::new();
        for (field, rule) in self.schema.fields.iter().zip(&self.rules) {
            if let Some(e) = check_field(field, rule, self.values.get(&field.name)) {
                errors.push(e);
            }
        }
        if errors.is_empty() {
            Ok(self.values())
        } else {
            Err(errors)
        }
    }

    /// 校验后调用回调；校验失败时不调用
    /// Validate, then invoke the callback; it is not called when validation fails
    pub async fn submit<F, Fut, E>(&mut self, on_submit: F) -> SubmitOutcome<E>
    where
        F: FnOnce(Row) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let values = match self.validate() {
            Ok(v) => v,
            Err(errors) => {
                self.field_errors = errors.clone();
                return SubmitOutcome::Invalid(errors);
            }
        };
        self.field_errors.clear();
        self.submitting = true;
        let result = on_submit(values).await;
        self.submitting = false;
        match result {
            Ok(()) => SubmitOutcome::Submitted,
            Err(e) => SubmitOutcome::Failed(e),
        }
    }

    /// 转为服务端表单描述 / Convert to a server-side form descriptor
    pub fn to_model(&self, action: &str, buttons: Vec<FormButton>) -> FormModel {
        let fields = self
            .schema
            .fields
            .iter()
            .map(|f| {
                let current = self.values.get(&f.name).map(value_text);
                let kind = match &f.widget {
                    Widget::Input => FieldKind::Text,
                    Widget::TextArea => FieldKind::TextArea {
                        rows: TEXTAREA_ROWS,
                    },
                    Widget::Password => FieldKind::Password,
                    Widget::Email => FieldKind::Email,
                    Widget::Number => FieldKind::Number {
                        step: None,
                        min: None,
                        max: None,
                    },
                    Widget::Select { options } => FieldKind::Select {
                        options: options
                            .iter()
                            .map(|o| FormOption::new(&o.value, &o.label))
                            .collect(),
                        multiple: false,
                    },
                    Widget::Switch => FieldKind::Checkbox,
                    Widget::Date => FieldKind::Date,
                    Widget::DateTime => FieldKind::DateTime,
                };
                FormField {
                    value: current,
                    placeholder: f.placeholder.clone(),
                    required: f.required,
                    min_length: f.min_len.filter(|_| f.widget.is_textual()),
                    max_length: f.max_len.filter(|_| f.widget.is_textual()),
                    error: self.field_error(&f.name).map(str::to_string),
                    ..FormField::new(&f.name, &f.label, kind)
                }
            })
            .collect();
        FormModel {
            id: Some(format!("{}_{}", self.schema.model, self.schema.kind)),
            action: action.to_string(),
            fields,
            buttons,
            errors: self.error_text.iter().cloned().collect(),
            ..Default::default()
        }
    }

    pub fn render(&self, action: &str, buttons: Vec<FormButton>) -> Node {
        render_form(&self.to_model(action, buttons))
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        _ => false,
    }
}

fn check_field(field: &FieldSpec, rule: &FieldRule, value: Option<&Value>) -> Option<FieldError> {
    let fail = |code: &str, msg: String| Some(FieldError::new(field.name.as_str(), code, msg));

    if is_empty(value) {
        if field.required {
            return fail("required", format!("{} is required", field.label));
        }
        return None;
    }
    let value = value?;

    match &field.widget {
        Widget::Select { options } => {
            let chosen = value_text(value);
            if !options.iter().any(|o| o.value == chosen) {
                return fail(
                    "choice",
                    format!("{} must be one of the listed options", field.label),
                );
            }
        }
        Widget::Number => {
            if !value.is_number() {
                return fail("number", format!("{} must be a number", field.label));
            }
        }
        w if w.is_textual() => {
            let s = value_text(value);
            let len = s.chars().count() as u32;
            if let Some(min) = field.min_len {
                if len < min {
                    return fail(
                        "min_length",
                        format!("{} must be at least {} characters", field.label, min),
                    );
                }
            }
            if let Some(max) = field.max_len {
                if len > max {
                    return fail(
                        "max_length",
                        format!("{} must be at most {} characters", field.label, max),
                    );
                }
            }
            if let Some(re) = &rule.pattern {
                if !re.is_match(&s) {
                    return fail("pattern", format!("{} is invalid", field.label));
                }
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FormFieldDto, FormFieldOptionDto, FormKind, FormSchemaDto};
    use serde_json::json;

    fn dto_field(name: &str, widget: &str, order_no: i32) -> FormFieldDto {
        FormFieldDto {
            name: name.into(),
            label: name.to_uppercase(),
            widget: widget.into(),
            data_type: "string".into(),
            required: false,
            max_len: None,
            min_len: None,
            pattern: None,
            placeholder: None,
            order_no,
            options: None,
        }
    }

    fn customer_form() -> FormView {
        let mut name = dto_field("name", "input", 10);
        name.required = true;
        name.max_len = Some(5);
        name.min_len = Some(2);
        let mut code = dto_field("code", "input", 20);
        code.pattern = Some("^[A-Z]{3}$".into());
        let mut tier = dto_field("tier", "select", 5);
        tier.options = Some(vec![
            FormFieldOptionDto {
                label: "B".into(),
                value: "b".into(),
                order: 2,
            },
            FormFieldOptionDto {
                label: "A".into(),
                value: "a".into(),
                order: 1,
            },
        ]);
        let dto = FormSchemaDto {
            model: "customer".into(),
            kind: FormKind::Create,
            fields: vec![name, code, tier],
        };
        FormView::new(FormSchema::try_from(dto).unwrap()).unwrap()
    }

    #[test]
    fn test_fields_render_in_order_with_labels() {
        let form = customer_form();
        let names: Vec<_> = form.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["tier", "name", "code"]);
        let html = form.render("/api/v1/customers", vec![]).render();
        let tier = html.find("customer_create_tier").unwrap();
        let name = html.find("customer_create_name").unwrap();
        assert!(tier < name);
        assert!(html.contains("maxlength=\"5\""));
    }

    #[test]
    fn test_select_options_keep_order() {
        let html = customer_form().render("/x", vec![]).render();
        let a = html.find("<option value=\"a\">A</option>").unwrap();
        let b = html.find("<option value=\"b\">B</option>").unwrap();
        assert!(a < b);
        assert_eq!(html.matches("<option").count(), 2);
    }

    #[tokio::test]
    async fn test_required_length_and_pattern_block_submit() {
        let mut form = customer_form();
        let mut called = false;
        let out = form
            .submit(|_| {
                called = true;
                async { Ok::<(), String>(()) }
            })
            .await;
        assert!(!called);
        match out {
            SubmitOutcome::Invalid(errs) => assert_eq!(errs[0].field, "name"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(form.field_error("name"), Some("NAME is required"));

        form.set_value("name", "toolong");
        assert_eq!(form.validate().unwrap_err()[0].code, "max_length");
        form.set_value("name", "x");
        assert_eq!(form.validate().unwrap_err()[0].code, "min_length");
        form.set_value("name", "ok");
        form.set_value("code", "abc");
        assert_eq!(form.validate().unwrap_err()[0].code, "pattern");
        form.set_value("code", "ABC");
        assert!(form.validate().is_ok());
    }

    #[tokio::test]
    async fn test_select_b_submits_value() {
        let mut form = customer_form();
        form.set_value("name", "Acme");
        form.set_value("tier", "b");
        let mut seen = None;
        let out = form
            .submit(|values| {
                seen = Some(values);
                async { Ok::<(), String>(()) }
            })
            .await;
        assert_eq!(out, SubmitOutcome::Submitted);
        let seen = seen.unwrap();
        assert_eq!(seen.get("tier"), Some(&json!("b")));
        assert_eq!(seen.get("name"), Some(&json!("Acme")));

        form.set_value("tier", "z");
        assert_eq!(form.validate().unwrap_err()[0].code, "choice");
    }

    #[tokio::test]
    async fn test_failed_callback_is_returned_to_caller() {
        let mut form = customer_form();
        form.set_value("name", "Acme");
        let out = form.submit(|_| async { Err("duplicate".to_string()) }).await;
        assert_eq!(out, SubmitOutcome::Failed("duplicate".to_string()));
        assert!(!form.is_submitting());

        form.set_error_text(Some("duplicate".into()));
        form.set_field_error("name", "already exists");
        let html = form.render("/x", vec![]).render();
        assert!(html.contains("<li>duplicate</li>"));
        assert!(html.contains("already exists"));
        assert!(html.contains("is-invalid"));
    }

    #[test]
    fn test_invalid_pattern_is_schema_error() {
        let mut f = FieldSpec::input("code", "Code", 1);
        f.pattern = Some("([".into());
        let schema = FormSchema {
            model: "customer".into(),
            kind: FormKind::Create,
            fields: vec![f],
        };
        assert!(matches!(
            FormView::new(schema),
            Err(SchemaError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_set_text_converts_by_widget() {
        let dto = FormSchemaDto {
            model: "customer".into(),
            kind: FormKind::Edit,
            fields: vec![dto_field("vip", "switch", 1), dto_field("age", "number", 2)],
        };
        let mut form = FormView::new(FormSchema::try_from(dto).unwrap()).unwrap();
        form.set_text("vip", "on");
        form.set_text("age", "42");
        assert!(!form.set_text("nope", "x"));
        assert_eq!(form.values(), {
            let mut r = Row::new();
            r.insert("vip".into(), json!(true));
            r.insert("age".into(), json!(42));
            r
        });
        form.set_text("age", "old");
        assert_eq!(form.validate().unwrap_err()[0].code, "number");
    }
}
