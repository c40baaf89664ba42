pub mod api;
#[path = "bootstrap/app_bootstrap.rs"]
pub mod app_bootstrap;
pub mod cmd;
pub mod conf;
pub mod error;
pub mod middleware;
pub mod modules;
#[path = "bootstrap/route_registry.rs"]
pub mod route_registry;
pub mod state;

pub use app_bootstrap::AppBootstrap;
pub use error::{AppError, AppResult};
pub use route_registry::{configure_portal_routes, portal_routes, RouteInfo, RouteRegistry};
pub use state::AppState;
