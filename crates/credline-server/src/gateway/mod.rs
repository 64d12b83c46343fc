//! HTTP gateway: router, handlers, response envelope.

mod handlers;
mod response;
mod server;

pub use response::{ApiError, ApiResponse};
pub use server::Gateway;
