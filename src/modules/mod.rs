/// 业务模块 / Business modules
pub mod customer;
pub mod layout;
pub mod uischema;
