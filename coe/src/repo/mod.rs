use async_trait::async_trait;

/// 存储层错误 / Storage-layer errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Invalid(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// 通用仓库 Trait，约定标准 CRUD 操作。
/// Generic repository trait with the standard CRUD operations; backends decide storage.
#[async_trait]
pub trait Repository<T, PK>: Send + Sync {
    /// 创建记录，返回带主键的新记录 / Insert, returning the stored record with its key
    async fn create(&self, model: T) -> StoreResult<T>;

    async fn read_one(&self, pk: PK) -> StoreResult<Option<T>>;

    async fn update(&self, model: T) -> StoreResult<T>;

    /// 删除记录并返回被删除的值 / Delete and return the removed record
    async fn delete(&self, pk: PK) -> StoreResult<T>;

    /// 分页读取，返回当前页与过滤后的总数
    /// Paged read returning the page and the filtered total
    async fn page(&self, limit: i64, offset: i64, filter: Option<&str>) -> StoreResult<(Vec<T>, u64)>;
}
