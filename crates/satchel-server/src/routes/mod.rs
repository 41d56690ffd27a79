//! HTTP route handlers.

mod health;
mod session;
mod stats;

pub use health::{HealthResponse, health, health_routes};
pub use session::{
    SessionInfo, ValueResponse, delete_value_handler, get_session_handler, get_value_handler,
    logout_handler, put_value_handler,
};
pub use stats::{StatsResponse, stats_handler};
