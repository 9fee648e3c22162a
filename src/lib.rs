//! Typed CRUD demo backend: users and posts behind a single contract
//! registry that drives both server-side validation and the typed client.

pub mod client;
pub mod config;
pub mod contract;
pub mod dtos;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod schema;

use std::sync::Arc;

use repositories::{PostStore, UserStore};

/// State shared across all actix workers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
}
