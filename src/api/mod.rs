//! Wager HTTP API
//!
//! JSON endpoints over the wager engine. Caller identity arrives in the
//! `x-user-id` header from the authenticating gateway.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::{build_app, init_tracing, ApiServer};
