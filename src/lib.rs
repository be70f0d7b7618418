pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    export_service::ExportOptions,
    submission_store::{SubmissionStore, SupabaseStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubmissionStore>,
    pub export_options: ExportOptions,
}

impl AppState {
    pub fn new(store: Arc<dyn SubmissionStore>, export_options: ExportOptions) -> Self {
        Self {
            store,
            export_options,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let store = SupabaseStore::from_config(config)?;
        Ok(Self::new(
            Arc::new(store),
            ExportOptions::with_offset_hours(config.export_utc_offset_hours),
        ))
    }
}
