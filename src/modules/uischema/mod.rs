//! UI schema 存储与默认数据 / UI schema stores and default seeding

pub mod form_store;
pub mod list_store;
pub mod seed;

pub use form_store::FormSchemaStore;
pub use list_store::ListSchemaStore;

/// 未指定 orderNo 时的缺省值 / orderNo used when none is given
pub const DEFAULT_ORDER_NO: i32 = 10;
