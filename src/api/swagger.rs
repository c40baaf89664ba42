use utoipa::OpenApi;

/// OpenAPI 文档聚合
#[derive(OpenApi)]
#[openapi(
    info(title = "alert-portal", description = "Customers and UI schema API"),
    paths(
        crate::api::v1::customers::list_customers,
        crate::api::v1::customers::create_customer,
        crate::api::v1::schema::get_list_schema,
        crate::api::v1::schema::get_form_schema,
        crate::api::v1::schema_admin::list_schemas,
        crate::api::v1::schema_admin::create_list_schema,
        crate::api::v1::schema_admin::activate_list_schema,
        crate::api::v1::schema_admin::list_fields,
        crate::api::v1::schema_admin::create_list_field,
        crate::api::v1::form_admin::create_form_schema,
        crate::api::v1::form_admin::create_form_field,
        crate::api::v1::form_admin::activate_form_schema,
        crate::api::v1::form_admin::add_field_option,
        crate::api::v1::version::get_version,
        crate::api::system::healthz,
        crate::api::system::readyz,
    ),
    components(
        schemas(
            crate::modules::customer::Customer,
            crate::modules::customer::CustomerInput,
            crate::modules::customer::CustomerPage,
            coe_ui::schema::ListSchema,
            coe_ui::schema::ColumnSpec,
            coe_ui::schema::ColumnType,
            coe_ui::schema::Align,
            coe_ui::schema::FormKind,
            coe_ui::schema::FormSchemaDto,
            coe_ui::schema::FormFieldDto,
            coe_ui::schema::FormFieldOptionDto,
            coe_ui::schema::UiListSchema,
            coe_ui::schema::UiListSchemaField,
            coe_ui::schema::UiFormSchema,
            coe_ui::schema::UiFormSchemaField,
            coe_ui::schema::UiFormFieldOption,
            coe_ui::schema::StatusResponse,
            coe_ui::schema::NewListSchema,
            coe_ui::schema::NewListField,
            coe_ui::schema::NewFormSchema,
            coe_ui::schema::NewFormField,
            coe_ui::schema::NewFieldOption,
            coe_ui::client::VersionInfo,
        )
    ),
    tags(
        (name = "Customers", description = "客户资源 / customer resource"),
        (name = "Schema", description = "活动 schema 读取 / active schema reads"),
        (name = "Schema admin", description = "schema 管理 / schema administration"),
        (name = "System", description = "探针与构建信息 / probes and build metadata")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/v1/customers"));
        assert!(paths.contains_key("/api/v1/schema/forms/fields/{id}/options"));
        assert!(paths.contains_key("/readyz"));
    }
}
