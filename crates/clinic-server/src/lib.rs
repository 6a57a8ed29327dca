pub mod auth;
pub mod config;
pub mod dashboard;
pub mod extract;
pub mod middleware;
pub mod observability;
pub mod resources;
pub mod seed;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use observability::init_tracing;
pub use server::{ClinicServer, ServerBuilder, build_app, build_router, create_store};
pub use state::AppState;
