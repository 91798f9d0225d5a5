pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod geo;
pub mod handlers;
pub mod import;
pub mod middleware;
pub mod reports;
pub mod resources;
pub mod routes;
pub mod uploads;

pub use routes::app;
