//! HTTP transport over the session manager.

mod error;
mod handlers;
mod server;
mod types;


pub use handlers::AppState;
pub use server::{build_router, start_server};
