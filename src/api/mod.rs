//! HTTP API module: routes, handlers, and error mapping.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ErrorBody};
pub use handlers::AppState;
pub use routes::create_router;
