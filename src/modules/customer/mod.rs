//! 客户资源：模型、内存存储、页面与 flash
//! Customer resource: model, in-memory store, pages and flash

pub mod flash;
pub mod model;
pub mod pages;
pub mod store;

pub use model::{Customer, CustomerInput, CustomerPage};
pub use store::CustomerStore;
