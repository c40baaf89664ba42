use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const NAME_MAX_CHARS: u64 = 128;
pub const NAME_LENGTH_MESSAGE: &str = "name must be 1..128 chars";
pub const DUPLICATE_NAME: &str = "customer with this name already exists";

/// 客户 / Customer entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// 尚未入库的新客户，id 由存储分配 / Unsaved customer; the store assigns the id
    pub fn draft(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// 新建/编辑请求体 / Create or edit payload
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct CustomerInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "name must be 1..128 chars"))]
    pub name: String,
}

impl CustomerInput {
    /// 去除首尾空白 / Trim surrounding whitespace
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

/// 客户分页响应 `{items, limit, offset, q, total}` / Customer page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerPage {
    pub items: Vec<Customer>,
    pub limit: i64,
    pub offset: i64,
    pub q: String,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_is_trimmed_then_validated() {
        let input = CustomerInput { name: "   ".into() }.normalized();
        assert!(input.validate().is_err());

        let input = CustomerInput { name: "  Acme  ".into() }.normalized();
        assert_eq!(input.name, "Acme");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_length_counts_characters() {
        let ok = CustomerInput { name: "é".repeat(NAME_MAX_CHARS as usize) };
        assert!(ok.validate().is_ok());
        let long = CustomerInput { name: "x".repeat(NAME_MAX_CHARS as usize + 1) };
        let errs = long.validate().unwrap_err();
        let msg = errs.field_errors()["name"][0].message.clone().unwrap();
        assert_eq!(msg, NAME_LENGTH_MESSAGE);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let c = Customer::draft("Acme");
        let v = serde_json::to_value(&c).unwrap();
        assert!(v.get("createdAt").is_some());
        assert_eq!(v["name"], "Acme");
    }
}
