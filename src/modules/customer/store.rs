//! 内存客户存储 / In-memory customer store
//!
//! 名称唯一（精确匹配）；分页按最新优先，`q` 为名称子串（不区分大小写）。
//! Names are unique (exact match); pages are newest first and `q` is a
//! case-insensitive substring of the name.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use coe::{HealthCheck, HealthStatus, Repository, StoreError, StoreResult};
use parking_lot::RwLock;

use super::model::{Customer, DUPLICATE_NAME};

#[derive(Default)]
struct CustomerTable {
    next_id: u64,
    rows: BTreeMap<u64, Customer>,
}

impl CustomerTable {
    fn name_taken(&self, name: &str, except: Option<u64>) -> bool {
        self.rows
            .values()
            .any(|c| c.name == name && Some(c.id) != except)
    }
}

#[derive(Default)]
pub struct CustomerStore {
    inner: RwLock<CustomerTable>,
}

impl CustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 是否已有同名客户（可排除自身）/ Whether another customer has this name
    pub fn name_taken(&self, name: &str, except: Option<u64>) -> bool {
        self.inner.read().name_taken(name, except)
    }
}

#[async_trait]
impl Repository<Customer, u64> for CustomerStore {
    async fn create(&self, model: Customer) -> StoreResult<Customer> {
        let mut table = self.inner.write();
        if table.name_taken(&model.name, None) {
            return Err(StoreError::Duplicate(DUPLICATE_NAME.to_string()));
        }
        table.next_id += 1;
        let row = Customer {
            id: table.next_id,
            name: model.name,
            created_at: Utc::now(),
        };
        table.rows.insert(row.id, row.clone());
        tracing::debug!(id = row.id, "customer created");
        Ok(row)
    }

    async fn read_one(&self, pk: u64) -> StoreResult<Option<Customer>> {
        Ok(self.inner.read().rows.get(&pk).cloned())
    }

    async fn update(&self, model: Customer) -> StoreResult<Customer> {
        let mut table = self.inner.write();
        if !table.rows.contains_key(&model.id) {
            return Err(StoreError::NotFound(format!("customer {}", model.id)));
        }
        if table.name_taken(&model.name, Some(model.id)) {
            return Err(StoreError::Duplicate(DUPLICATE_NAME.to_string()));
        }
        let row = table
            .rows
            .get_mut(&model.id)
            .ok_or_else(|| StoreError::NotFound(format!("customer {}", model.id)))?;
        row.name = model.name;
        Ok(row.clone())
    }

    async fn delete(&self, pk: u64) -> StoreResult<Customer> {
        self.inner
            .write()
            .rows
            .remove(&pk)
            .ok_or_else(|| StoreError::NotFound(format!("customer {}", pk)))
    }

    async fn page(
        &self,
        limit: i64,
        offset: i64,
        filter: Option<&str>,
    ) -> StoreResult<(Vec<Customer>, u64)> {
        let needle = filter.map(|f| f.to_lowercase());
        let table = self.inner.read();
        // id 单调递增，倒序即最新优先 / ids increase, so reverse order is newest first
        let matched: Vec<&Customer> = table
            .rows
            .values()
            .rev()
            .filter(|c| match &needle {
                Some(n) => c.name.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .collect();
        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }
}

#[async_trait]
impl HealthCheck for CustomerStore {
    async fn check_health(&self) -> HealthStatus {
        match self.inner.try_read() {
            Some(table) => HealthStatus {
                message: Some(format!("{} rows", table.rows.len())),
                ..HealthStatus::up("customer_store")
            },
            None => HealthStatus::down("customer_store", "store is locked"),
        }
    }
}
