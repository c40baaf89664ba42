pub mod swagger;
pub mod system;
pub mod v1;
