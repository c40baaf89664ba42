//! 默认 customer schema / Default customer schemas

use coe::StoreResult;
use coe_ui::schema::{FormKind, NewFormField, NewFormSchema, NewListField, NewListSchema};

use super::{FormSchemaStore, ListSchemaStore};

pub const CUSTOMER_MODEL: &str = "customer";

/// 模型尚无激活 schema 时写入缺省 schema；已存在则跳过
/// Seed the customer schemas unless an active one already exists
pub fn seed_defaults(lists: &ListSchemaStore, forms: &FormSchemaStore) -> StoreResult<()> {
    if lists.get_active(CUSTOMER_MODEL).is_none() {
        let schema = lists.create_schema(NewListSchema {
            model: CUSTOMER_MODEL.to_string(),
            is_active: true,
            version: 1,
        })?;
        let columns = [
            NewListField {
                field_name: "id".into(),
                field_label: "ID".into(),
                field_type: "number".into(),
                width: Some(90),
                align: Some("right".into()),
                order_no: 10,
                ..Default::default()
            },
            NewListField {
                field_name: "name".into(),
                field_label: "Name".into(),
                field_type: "string".into(),
                sortable: true,
                searchable: true,
                order_no: 20,
                ..Default::default()
            },
            NewListField {
                field_name: "createdAt".into(),
                field_label: "Created".into(),
                field_type: "datetime".into(),
                width: Some(200),
                order_no: 30,
                ..Default::default()
            },
        ];
        for c in columns {
            lists.create_field(schema.id, c)?;
        }
        tracing::info!(model = CUSTOMER_MODEL, "seeded list schema");
    }

    if forms.get_active(CUSTOMER_MODEL, FormKind::Create).is_none() {
        let schema = forms.create_schema(NewFormSchema {
            model: CUSTOMER_MODEL.to_string(),
            kind: FormKind::Create.as_str().to_string(),
            is_active: true,
            version: 1,
        })?;
        forms.create_field(
            schema.id,
            NewFormField {
                field_name: "name".into(),
                field_label: "Name".into(),
                widget: "input".into(),
                data_type: "string".into(),
                required: true,
                max_len: Some(128),
                placeholder: Some("Enter customer name".into()),
                order_no: 10,
                ..Default::default()
            },
        )?;
        tracing::info!(model = CUSTOMER_MODEL, "seeded create form schema");
    }
    Ok(())
}
