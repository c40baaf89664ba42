//! 表单 schema 存储 / Form schema store
//!
//! 每个 (model, kind) 至多一个激活 schema。
//! At most one active schema per (model, kind).

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use coe::{HealthCheck, HealthStatus, StoreError, StoreResult};
use coe_ui::schema::{
    ColumnType, FormFieldDto, FormFieldOptionDto, FormKind, FormSchemaDto, NewFieldOption,
    NewFormField, NewFormSchema, UiFormFieldOption, UiFormSchema, UiFormSchemaField, WIDGET_NAMES,
};
use parking_lot::RwLock;

use super::DEFAULT_ORDER_NO;

#[derive(Default)]
struct FormTables {
    next_schema_id: u64,
    next_field_id: u64,
    next_option_id: u64,
    schemas: BTreeMap<u64, UiFormSchema>,
    fields: BTreeMap<u64, UiFormSchemaField>,
    options: BTreeMap<u64, UiFormFieldOption>,
}

impl FormTables {
    fn deactivate(&mut self, model: &str, kind: FormKind, except: Option<u64>) {
        let now = Utc::now();
        for s in self.schemas.values_mut() {
            if s.model == model && s.kind == kind && s.is_active && Some(s.id) != except {
                s.is_active = false;
                s.updated_at = now;
            }
        }
    }

    fn options_of(&self, field_id: u64) -> Vec<&UiFormFieldOption> {
        let mut out: Vec<&UiFormFieldOption> = self
            .options
            .values()
            .filter(|o| o.field_id == field_id)
            .collect();
        out.sort_by_key(|o| (o.order_no, o.id));
        out
    }
}

#[derive(Default)]
pub struct FormSchemaStore {
    inner: RwLock<FormTables>,
}

impl FormSchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 激活表单的可见字段；仅 select 控件携带选项
    /// Visible fields of the active form; only select widgets carry options
    pub fn get_active(&self, model: &str, kind: FormKind) -> Option<FormSchemaDto> {
        let tables = self.inner.read();
        let schema = tables
            .schemas
            .values()
            .find(|s| s.model == model && s.kind == kind && s.is_active)?;
        let mut fields: Vec<&UiFormSchemaField> = tables
            .fields
            .values()
            .filter(|f| f.schema_id == schema.id && f.visible)
            .collect();
        fields.sort_by_key(|f| (f.order_no, f.id));

        let fields = fields
            .into_iter()
            .map(|f| {
                let options = (f.widget == "select").then(|| {
                    tables
                        .options_of(f.id)
                        .into_iter()
                        .map(|o| FormFieldOptionDto {
                            label: o.opt_label.clone(),
                            value: o.opt_value.clone(),
                            order: o.order_no,
                        })
                        .collect::<Vec<_>>()
                });
                FormFieldDto {
                    name: f.field_name.clone(),
                    label: f.field_label.clone(),
                    widget: f.widget.clone(),
                    data_type: f.data_type.as_str().to_string(),
                    required: f.required,
                    max_len: f.max_len,
                    min_len: f.min_len,
                    pattern: f.pattern.clone(),
                    placeholder: f.placeholder.clone(),
                    order_no: f.order_no,
                    options: options.filter(|o| !o.is_empty()),
                }
            })
            .collect();
        Some(FormSchemaDto {
            model: schema.model.clone(),
            kind: schema.kind,
            fields,
        })
    }

    pub fn create_schema(&self, req: NewFormSchema) -> StoreResult<UiFormSchema> {
        let model = req.model.trim().to_string();
        let kind = FormKind::parse(&req.kind);
        let kind = match (model.is_empty(), kind) {
            (false, Some(k)) => k,
            _ => {
                return Err(StoreError::Invalid(
                    "model and valid kind are required".to_string(),
                ))
            }
        };
        let mut tables = self.inner.write();
        if req.is_active {
            tables.deactivate(&model, kind, None);
        }
        tables.next_schema_id += 1;
        let now = Utc::now();
        let row = UiFormSchema {
            id: tables.next_schema_id,
            model,
            kind,
            is_active: req.is_active,
            version: if req.version <= 0 { 1 } else { req.version },
            created_at: now,
            updated_at: now,
        };
        tables.schemas.insert(row.id, row.clone());
        tracing::info!(id = row.id, model = %row.model, kind = %row.kind, "form schema created");
        Ok(row)
    }

    pub fn activate(&self, id: u64) -> StoreResult<UiFormSchema> {
        let mut tables = self.inner.write();
        let (model, kind) = tables
            .schemas
            .get(&id)
            .map(|s| (s.model.clone(), s.kind))
            .ok_or_else(|| StoreError::NotFound(format!("form schema {}", id)))?;
        tables.deactivate(&model, kind, Some(id));
        let row = tables
            .schemas
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("form schema {}", id)))?;
        if !row.is_active {
            row.is_active = true;
            row.updated_at = Utc::now();
        }
        tracing::info!(id, model = %model, kind = %kind, "form schema activated");
        Ok(row.clone())
    }

    pub fn create_field(&self, schema_id: u64, req: NewFormField) -> StoreResult<UiFormSchemaField> {
        let widget = req.widget.trim().to_string();
        if !WIDGET_NAMES.contains(&widget.as_str()) {
            return Err(StoreError::Invalid("invalid widget".to_string()));
        }
        let data_type = ColumnType::parse_strict(&req.data_type)
            .map_err(|_| StoreError::Invalid("invalid data_type".to_string()))?;
        let field_name = req.field_name.trim().to_string();
        let field_label = req.field_label.trim().to_string();
        if field_name.is_empty() || field_label.is_empty() {
            return Err(StoreError::Invalid(
                "field_name and field_label are required".to_string(),
            ));
        }
        if let Some(p) = req.pattern.as_deref().filter(|p| !p.is_empty()) {
            if let Err(e) = regex::Regex::new(p) {
                return Err(StoreError::Invalid(format!("invalid pattern: {}", e)));
            }
        }

        let mut tables = self.inner.write();
        if !tables.schemas.contains_key(&schema_id) {
            return Err(StoreError::NotFound(format!("form schema {}", schema_id)));
        }
        if tables
            .fields
            .values()
            .any(|f| f.schema_id == schema_id && f.field_name == field_name)
        {
            return Err(StoreError::Duplicate("duplicate field_name".to_string()));
        }
        tables.next_field_id += 1;
        let row = UiFormSchemaField {
            id: tables.next_field_id,
            schema_id,
            field_name,
            field_label,
            widget,
            data_type,
            required: req.required,
            max_len: req.max_len,
            min_len: req.min_len,
            pattern: req.pattern.filter(|p| !p.is_empty()),
            placeholder: req.placeholder,
            order_no: if req.order_no == 0 { DEFAULT_ORDER_NO } else { req.order_no },
            visible: req.visible.unwrap_or(true),
        };
        tables.fields.insert(row.id, row.clone());
        if let Some(s) = tables.schemas.get_mut(&schema_id) {
            s.updated_at = Utc::now();
        }
        Ok(row)
    }

    pub fn add_option(&self, field_id: u64, req: NewFieldOption) -> StoreResult<UiFormFieldOption> {
        if req.label.trim().is_empty() || req.value.trim().is_empty() {
            return Err(StoreError::Invalid("label and value are required".to_string()));
        }
        let mut tables = self.inner.write();
        if !tables.fields.contains_key(&field_id) {
            return Err(StoreError::NotFound(format!("form field {}", field_id)));
        }
        if tables
            .options
            .values()
            .any(|o| o.field_id == field_id && o.opt_value == req.value)
        {
            return Err(StoreError::Duplicate("duplicate option".to_string()));
        }
        tables.next_option_id += 1;
        let row = UiFormFieldOption {
            id: tables.next_option_id,
            field_id,
            opt_label: req.label,
            opt_value: req.value,
            order_no: if req.order_no == 0 { DEFAULT_ORDER_NO } else { req.order_no },
        };
        tables.options.insert(row.id, row.clone());
        Ok(row)
    }

    pub fn active_count(&self, model: &str, kind: FormKind) -> usize {
        self.inner
            .read()
            .schemas
            .values()
            .filter(|s| s.model == model && s.kind == kind && s.is_active)
            .count()
    }
}

#[async_trait]
impl HealthCheck for FormSchemaStore {
    async fn check_health(&self) -> HealthStatus {
        match self.inner.try_read() {
            Some(t) => HealthStatus {
                message: Some(format!("{} schemas", t.schemas.len())),
                ..HealthStatus::up("form_schema_store")
            },
            None => HealthStatus::down("form_schema_store", "store is locked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coe_ui::schema::FormSchema;

    fn new_schema(store: &FormSchemaStore, kind: &str, active: bool) -> UiFormSchema {
        store
            .create_schema(NewFormSchema {
                model: "customer".into(),
                kind: kind.into(),
                is_active: active,
                version: 1,
            })
            .unwrap()
    }

    fn new_field(name: &str, widget: &str, order_no: i32) -> NewFormField {
        NewFormField {
            field_name: name.into(),
            field_label: name.into(),
            widget: widget.into(),
            data_type: "string".into(),
            order_no,
            ..Default::default()
        }
    }

    fn option(label: &str, value: &str, order_no: i32) -> NewFieldOption {
        NewFieldOption {
            label: label.into(),
            value: value.into(),
            order_no,
        }
    }

    #[test]
    fn test_select_options_round_trip_into_compiled_schema() {
        let store = FormSchemaStore::new();
        let s = new_schema(&store, "create", true);
        store.create_field(s.id, new_field("name", "input", 1)).unwrap();
        let tier = store.create_field(s.id, new_field("tier", "select", 2)).unwrap();
        store.add_option(tier.id, option("B", "b", 20)).unwrap();
        store.add_option(tier.id, option("A", "a", 10)).unwrap();

        let dto = store.get_active("customer", FormKind::Create).unwrap();
        assert!(dto.fields[0].options.is_none());
        let opts = dto.fields[1].options.as_ref().unwrap();
        assert_eq!(opts[0].value, "a");
        assert_eq!(opts[1].value, "b");
        assert!(FormSchema::try_from(dto).is_ok());
        assert!(store.get_active("customer", FormKind::Edit).is_none());
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let store = FormSchemaStore::new();
        assert!(store
            .create_schema(NewFormSchema {
                model: "customer".into(),
                kind: "delete".into(),
                is_active: false,
                version: 0,
            })
            .is_err());

        let s = new_schema(&store, "edit", false);
        let err = store.create_field(s.id, new_field("x", "slider", 1)).unwrap_err();
        assert_eq!(err.to_string(), "invalid widget");
        let err = store
            .create_field(
                s.id,
                NewFormField {
                    data_type: "money".into(),
                    ..new_field("x", "input", 1)
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid data_type");
        let err = store
            .create_field(
                s.id,
                NewFormField {
                    pattern: Some("([a-z".into()),
                    ..new_field("x", "input", 1)
                },
            )
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid pattern"));

        let f = store.create_field(s.id, new_field("x", "select", 0)).unwrap();
        assert_eq!(f.order_no, DEFAULT_ORDER_NO);
        assert_eq!(
            store.create_field(s.id, new_field("x", "input", 3)).unwrap_err().to_string(),
            "duplicate field_name"
        );
        assert!(store.add_option(f.id, option(" ", "v", 1)).is_err());
        store.add_option(f.id, option("V", "v", 0)).unwrap();
        assert_eq!(
            store.add_option(f.id, option("V2", "v", 1)).unwrap_err().to_string(),
            "duplicate option"
        );
        assert!(matches!(
            store.add_option(777, option("A", "a", 1)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_activation_is_scoped_to_model_and_kind() {
        let store = FormSchemaStore::new();
        let create_a = new_schema(&store, "create", true);
        let create_b = new_schema(&store, "create", false);
        new_schema(&store, "edit", true);

        store.activate(create_b.id).unwrap();
        assert_eq!(store.active_count("customer", FormKind::Create), 1);
        assert_eq!(store.active_count("customer", FormKind::Edit), 1);
        store.activate(create_a.id).unwrap();
        assert_eq!(store.active_count("customer", FormKind::Create), 1);
        assert!(matches!(store.activate(99), Err(StoreError::NotFound(_))));
    }
}
