pub mod admin;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod render;
pub mod routes;
pub mod session;

pub use admin::{Admin, AdminBuilder};
pub use error::AdminError;
