use scan_ingest_core::{HttpSubmitter, IngestionPipeline, PipelineOptions, ScanSubmitter};
use std::sync::Arc;

use crate::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: IngestionPipeline,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        // 初始化扫描提交客户端
        let submitter = HttpSubmitter::new(&settings.scanner_api_url, settings.scanner_timeout)
            .map_err(|e| anyhow::anyhow!("Failed to build scanner client: {}", e))?;

        tracing::info!("Scanner endpoint: {}", submitter.endpoint());

        Ok(Self::with_submitter(settings, Arc::new(submitter)))
    }

    pub fn with_submitter(settings: Settings, submitter: Arc<dyn ScanSubmitter>) -> Self {
        let options = PipelineOptions {
            max_in_flight: settings.max_in_flight,
            naming: settings.default_surface.naming(),
        };
        let pipeline = IngestionPipeline::new(options, submitter);

        Self {
            pipeline,
            settings: Arc::new(settings),
        }
    }
}
