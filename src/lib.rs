// Library exports for giastylez-web
// This allows integration tests and external code to use the crate's modules

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guard;
pub mod models;
pub mod retention;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;
