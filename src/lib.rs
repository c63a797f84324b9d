use crate::config::PagesConfig;
use crate::features::pages::service::PagesService;
use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;

#[cfg(test)]
mod tests;

pub use error::{PageError, PageResult, ValidationErrors};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PagesService>,
    pub config: Arc<PagesConfig>,
}
