pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;
pub mod jobs;

use std::sync::Arc;

use crate::app::variants::VariantMatrix;
use crate::config::JobSettings;
use crate::infra::{decoder::FrameDecoder, storage::ObjectStore};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ObjectStore>,
    pub decoder: Arc<dyn FrameDecoder>,
    pub variants: Arc<VariantMatrix>,
    pub settings: JobSettings,
}
