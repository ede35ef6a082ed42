pub mod auth;
pub mod catchers;
pub mod config;
pub mod cors;
pub mod error;
pub mod identity;
pub mod processor;
pub mod queries;
pub mod routes;
pub mod store;
pub mod utils;
pub mod views;
pub use poll_shared::{models::*, error::*, validation::*};
