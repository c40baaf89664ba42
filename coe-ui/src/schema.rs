//! 列表/表单 schema 数据结构 / List and form schema data shapes
//!
//! `*Dto` 类型与线上 JSON 一一对应；`FormSchema`/`FieldSpec` 是编译后的形态，
//! 控件种类已解析为封闭枚举。
//! `*Dto` types mirror the wire JSON; `FormSchema`/`FieldSpec` are the compiled
//! form where the widget kind is resolved into a closed enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// 一行数据：字段名到原始值 / One data row keyed by field name
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("duplicate column field '{0}'")]
    DuplicateColumn(String),
    #[error("duplicate form field '{0}'")]
    DuplicateField(String),
    #[error("field '{0}' is a select but has no options")]
    MissingOptions(String),
    #[error("field '{field}' has an invalid pattern: {message}")]
    InvalidPattern { field: String, message: String },
    #[error("invalid {what} '{value}'")]
    InvalidEnum { what: &'static str, value: String },
}

/// 列类型，决定单元格渲染方式；未知类型按纯文本处理
/// Column type driving cell rendering; unknown types render as plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Datetime,
    Boolean,
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("number") => ColumnType::Number,
            Some("datetime") => ColumnType::Datetime,
            Some("boolean") => ColumnType::Boolean,
            _ => ColumnType::String,
        })
    }
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Datetime => "datetime",
            ColumnType::Boolean => "boolean",
        }
    }

    /// 严格解析（管理端写入时使用）/ Strict parse used by admin writes
    pub fn parse_strict(raw: &str) -> Result<Self, SchemaError> {
        match raw.trim() {
            "string" => Ok(ColumnType::String),
            "number" => Ok(ColumnType::Number),
            "datetime" => Ok(ColumnType::Datetime),
            "boolean" => Ok(ColumnType::Boolean),
            other => Err(SchemaError::InvalidEnum {
                what: "field_type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_str(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }

    /// 空串视为 left / Blank means left
    pub fn parse_or_left(raw: Option<&str>) -> Result<Self, SchemaError> {
        match raw.map(str::trim).unwrap_or("") {
            "" | "left" => Ok(Align::Left),
            "center" => Ok(Align::Center),
            "right" => Ok(Align::Right),
            other => Err(SchemaError::InvalidEnum {
                what: "align",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ColumnSpec {
    pub field: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sortable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub searchable: bool,
}

impl ColumnSpec {
    pub fn new(field: &str, label: &str, column_type: ColumnType) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            column_type,
            width: None,
            align: None,
            sortable: false,
            searchable: false,
        }
    }
}

/// 列表 schema / List view schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListSchema {
    pub model: String,
    pub columns: Vec<ColumnSpec>,
}

impl ListSchema {
    /// 校验列字段唯一 / Column fields must be unique
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for c in &self.columns {
            if !seen.insert(c.field.as_str()) {
                return Err(SchemaError::DuplicateColumn(c.field.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Create,
    Edit,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Create => "create",
            FormKind::Edit => "edit",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "create" => Some(FormKind::Create),
            "edit" => Some(FormKind::Edit),
            _ => None,
        }
    }
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FormFieldOptionDto {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldDto {
    pub name: String,
    pub label: String,
    pub widget: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub order_no: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FormFieldOptionDto>>,
}

fn default_data_type() -> String {
    "string".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FormSchemaDto {
    pub model: String,
    pub kind: FormKind,
    pub fields: Vec<FormFieldDto>,
}

/// 选项 / Choice option
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

/// 表单控件：封闭枚举，渲染端穷举匹配
/// Form widget as a closed variant, matched exhaustively by renderers
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Input,
    TextArea,
    Password,
    Email,
    Number,
    Select { options: Vec<ChoiceOption> },
    Switch,
    Date,
    DateTime,
}

impl Widget {
    pub fn name(&self) -> &'static str {
        match self {
            Widget::Input => "input",
            Widget::TextArea => "textarea",
            Widget::Password => "password",
            Widget::Email => "email",
            Widget::Number => "number",
            Widget::Select { .. } => "select",
            Widget::Switch => "switch",
            Widget::Date => "date",
            Widget::DateTime => "datetime",
        }
    }

    /// 是否为文本类控件（长度/正则规则适用）
    /// Whether length and pattern rules apply
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            Widget::Input | Widget::TextArea | Widget::Password | Widget::Email
        )
    }
}

/// 管理端允许的控件名 / Widget names accepted by admin writes
pub const WIDGET_NAMES: &[&str] = &[
    "input", "number", "select", "switch", "date", "datetime", "textarea", "password", "email",
];

/// 编译后的字段描述 / Compiled field descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub widget: Widget,
    pub required: bool,
    pub max_len: Option<u32>,
    pub min_len: Option<u32>,
    pub pattern: Option<String>,
    pub placeholder: Option<String>,
    pub order_no: i32,
}

impl FieldSpec {
    pub fn input(name: &str, label: &str, order_no: i32) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            widget: Widget::Input,
            required: false,
            max_len: None,
            min_len: None,
            pattern: None,
            placeholder: None,
            order_no,
        }
    }
}

impl TryFrom<FormFieldDto> for FieldSpec {
    type Error = SchemaError;

    fn try_from(dto: FormFieldDto) -> Result<Self, Self::Error> {
        let widget = match dto.widget.as_str() {
            "textarea" => Widget::TextArea,
            "password" => Widget::Password,
            "email" => Widget::Email,
            "number" => Widget::Number,
            "switch" => Widget::Switch,
            "date" => Widget::Date,
            "datetime" => Widget::DateTime,
            "select" => {
                let mut options = dto.options.unwrap_or_default();
                if options.is_empty() {
                    return Err(SchemaError::MissingOptions(dto.name));
                }
                options.sort_by_key(|o| o.order);
                Widget::Select {
                    options: options
                        .into_iter()
                        .map(|o| ChoiceOption {
                            label: o.label,
                            value: o.value,
                        })
                        .collect(),
                }
            }
            "input" => Widget::Input,
            other => {
                tracing::debug!(field = %dto.name, widget = other, "unknown widget, rendering as input");
                Widget::Input
            }
        };
        Ok(FieldSpec {
            name: dto.name,
            label: dto.label,
            widget,
            required: dto.required,
            max_len: dto.max_len,
            min_len: dto.min_len,
            pattern: dto.pattern.filter(|p| !p.is_empty()),
            placeholder: dto.placeholder,
            order_no: dto.order_no,
        })
    }
}

/// 编译后的表单 schema，字段按 orderNo 排序
/// Compiled form schema with fields sorted by orderNo
#[derive(Debug, Clone, PartialEq)]
pub struct FormSchema {
    pub model: String,
    pub kind: FormKind,
    pub fields: Vec<FieldSpec>,
}

impl TryFrom<FormSchemaDto> for FormSchema {
    type Error = SchemaError;

    fn try_from(dto: FormSchemaDto) -> Result<Self, Self::Error> {
        let mut fields = dto
            .fields
            .into_iter()
            .map(FieldSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let mut seen = HashSet::new();
        for f in &fields {
            if !seen.insert(f.name.clone()) {
                return Err(SchemaError::DuplicateField(f.name.clone()));
            }
        }
        // 稳定排序：同 orderNo 保持原顺序 / stable: ties keep wire order
        fields.sort_by_key(|f| f.order_no);
        Ok(FormSchema {
            model: dto.model,
            kind: dto.kind,
            fields,
        })
    }
}

// ---- 管理端实体 / Managed schema entities ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UiListSchema {
    pub id: u64,
    pub model: String,
    pub is_active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UiListSchemaField {
    pub id: u64,
    pub schema_id: u64,
    pub field_name: String,
    pub field_label: String,
    pub field_type: ColumnType,
    pub width: Option<u32>,
    pub align: Align,
    pub sortable: bool,
    pub searchable: bool,
    pub order_no: i32,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UiFormSchema {
    pub id: u64,
    pub model: String,
    pub kind: FormKind,
    pub is_active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UiFormSchemaField {
    pub id: u64,
    pub schema_id: u64,
    pub field_name: String,
    pub field_label: String,
    pub widget: String,
    pub data_type: ColumnType,
    pub required: bool,
    pub max_len: Option<u32>,
    pub min_len: Option<u32>,
    pub pattern: Option<String>,
    pub placeholder: Option<String>,
    pub order_no: i32,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UiFormFieldOption {
    pub id: u64,
    pub field_id: u64,
    pub opt_label: String,
    pub opt_value: String,
    pub order_no: i32,
}

/// 管理端 schema 分页响应 / Admin schema listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchemaPage<T> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// 仅含 items 的列表响应 / Items-only listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

/// 管理端动作回执 `{status}` / Admin action receipt `{status}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

// ---- 管理端请求体（snake_case）/ Admin request bodies (snake_case) ----

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct NewListSchema {
    pub model: String,
    #[serde(default, alias = "isActive")]
    pub is_active: bool,
    #[serde(default)]
    pub version: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct NewListField {
    pub field_name: String,
    pub field_label: String,
    pub field_type: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub align: Option<String>,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub order_no: i32,
    #[serde(default)]
    pub visible: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewFormSchema {
    pub model: String,
    pub kind: String,
    #[serde(default, alias = "isActive")]
    pub is_active: bool,
    #[serde(default)]
    pub version: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct NewFormField {
    pub field_name: String,
    pub field_label: String,
    pub widget: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub max_len: Option<u32>,
    #[serde(default)]
    pub min_len: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub order_no: i32,
    #[serde(default)]
    pub visible: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewFieldOption {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub order_no: i32,
}
