pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

pub use routes::app;
pub use state::AppState;
