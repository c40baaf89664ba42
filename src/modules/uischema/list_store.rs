//! 列表 schema 存储 / List schema store
//!
//! 每个 model 至多一个激活 schema：停用兄弟与激活目标在同一把写锁内完成。
//! At most one active schema per model: deactivating siblings and activating
//! the target happen under one write lock.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use coe::{HealthCheck, HealthStatus, StoreError, StoreResult};
use coe_ui::schema::{
    Align, ColumnSpec, ColumnType, ListSchema, NewListField, NewListSchema, UiListSchema,
    UiListSchemaField,
};
use parking_lot::RwLock;

use super::DEFAULT_ORDER_NO;

#[derive(Default)]
struct ListTables {
    next_schema_id: u64,
    next_field_id: u64,
    schemas: BTreeMap<u64, UiListSchema>,
    fields: BTreeMap<u64, UiListSchemaField>,
}

impl ListTables {
    fn deactivate_model(&mut self, model: &str, except: Option<u64>) {
        let now = Utc::now();
        for s in self.schemas.values_mut() {
            if s.model == model && s.is_active && Some(s.id) != except {
                s.is_active = false;
                s.updated_at = now;
            }
        }
    }

    fn fields_of(&self, schema_id: u64) -> Vec<&UiListSchemaField> {
        let mut out: Vec<&UiListSchemaField> = self
            .fields
            .values()
            .filter(|f| f.schema_id == schema_id)
            .collect();
        out.sort_by_key(|f| (f.order_no, f.id));
        out
    }
}

#[derive(Default)]
pub struct ListSchemaStore {
    inner: RwLock<ListTables>,
}

impl ListSchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 激活 schema 的可见列，按 (orderNo, id) 排序
    /// Visible columns of the active schema, ordered by (orderNo, id)
    pub fn get_active(&self, model: &str) -> Option<ListSchema> {
        let tables = self.inner.read();
        let schema = tables
            .schemas
            .values()
            .find(|s| s.model == model && s.is_active)?;
        let columns = tables
            .fields_of(schema.id)
            .into_iter()
            .filter(|f| f.visible)
            .map(|f| ColumnSpec {
                field: f.field_name.clone(),
                label: f.field_label.clone(),
                column_type: f.field_type,
                width: f.width,
                align: Some(f.align),
                sortable: f.sortable,
                searchable: f.searchable,
            })
            .collect();
        Some(ListSchema {
            model: schema.model.clone(),
            columns,
        })
    }

    pub fn create_schema(&self, req: NewListSchema) -> StoreResult<UiListSchema> {
        let model = req.model.trim().to_string();
        if model.is_empty() {
            return Err(StoreError::Invalid("model is required".to_string()));
        }
        let mut tables = self.inner.write();
        if req.is_active {
            tables.deactivate_model(&model, None);
        }
        tables.next_schema_id += 1;
        let now = Utc::now();
        let row = UiListSchema {
            id: tables.next_schema_id,
            model,
            is_active: req.is_active,
            version: if req.version <= 0 { 1 } else { req.version },
            created_at: now,
            updated_at: now,
        };
        tables.schemas.insert(row.id, row.clone());
        tracing::info!(id = row.id, model = %row.model, active = row.is_active, "list schema created");
        Ok(row)
    }

    pub fn activate(&self, id: u64) -> StoreResult<UiListSchema> {
        let mut tables = self.inner.write();
        let model = tables
            .schemas
            .get(&id)
            .map(|s| s.model.clone())
            .ok_or_else(|| StoreError::NotFound(format!("list schema {}", id)))?;
        tables.deactivate_model(&model, Some(id));
        let row = tables
            .schemas
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("list schema {}", id)))?;
        if !row.is_active {
            row.is_active = true;
            row.updated_at = Utc::now();
        }
        tracing::info!(id, model = %model, "list schema activated");
        Ok(row.clone())
    }

    pub fn create_field(&self, schema_id: u64, req: NewListField) -> StoreResult<UiListSchemaField> {
        let field_type = ColumnType::parse_strict(&req.field_type)
            .map_err(|_| StoreError::Invalid("invalid field_type".to_string()))?;
        let align = Align::parse_or_left(req.align.as_deref())
            .map_err(|_| StoreError::Invalid("invalid align".to_string()))?;
        let field_name = req.field_name.trim().to_string();
        let field_label = req.field_label.trim().to_string();
        if field_name.is_empty() || field_label.is_empty() {
            return Err(StoreError::Invalid(
                "field_name and field_label are required".to_string(),
            ));
        }

        let mut tables = self.inner.write();
        if !tables.schemas.contains_key(&schema_id) {
            return Err(StoreError::NotFound(format!("list schema {}", schema_id)));
        }
        if tables
            .fields
            .values()
            .any(|f| f.schema_id == schema_id && f.field_name == field_name)
        {
            return Err(StoreError::Duplicate("duplicate field_name".to_string()));
        }
        tables.next_field_id += 1;
        let row = UiListSchemaField {
            id: tables.next_field_id,
            schema_id,
            field_name,
            field_label,
            field_type,
            width: req.width,
            align,
            sortable: req.sortable,
            searchable: req.searchable,
            order_no: if req.order_no == 0 { DEFAULT_ORDER_NO } else { req.order_no },
            visible: req.visible.unwrap_or(true),
        };
        tables.fields.insert(row.id, row.clone());
        if let Some(s) = tables.schemas.get_mut(&schema_id) {
            s.updated_at = Utc::now();
        }
        Ok(row)
    }

    /// 最近更新优先 / Most recently updated first
    pub fn list_schemas(
        &self,
        model: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> (Vec<UiListSchema>, u64) {
        let tables = self.inner.read();
        let mut rows: Vec<&UiListSchema> = tables
            .schemas
            .values()
            .filter(|s| model.map_or(true, |m| s.model == m))
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        (items, total)
    }

    /// 全部字段（含隐藏）/ All fields, hidden ones included
    pub fn list_fields(&self, schema_id: u64) -> StoreResult<Vec<UiListSchemaField>> {
        let tables = self.inner.read();
        if !tables.schemas.contains_key(&schema_id) {
            return Err(StoreError::NotFound(format!("list schema {}", schema_id)));
        }
        Ok(tables.fields_of(schema_id).into_iter().cloned().collect())
    }

    pub fn active_count(&self, model: &str) -> usize {
        self.inner
            .read()
            .schemas
            .values()
            .filter(|s| s.model == model && s.is_active)
            .count()
    }
}

#[async_trait]
impl HealthCheck for ListSchemaStore {
    async fn check_health(&self) -> HealthStatus {
        match self.inner.try_read() {
            Some(t) => HealthStatus {
                message: Some(format!("{} schemas", t.schemas.len())),
                ..HealthStatus::up("list_schema_store")
            },
            None => HealthStatus::down("list_schema_store", "store is locked"),
        }
    }
}
