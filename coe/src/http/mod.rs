pub mod error;
pub mod pagination;
#[cfg(feature = "web_actix")]
pub mod actix_ext;

pub use error::*;
pub use pagination::*;
