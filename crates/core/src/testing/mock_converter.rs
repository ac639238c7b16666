//! Mock converter for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{Converter, ConverterError, RenderJob, RenderOutput};

/// A recorded render call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRender {
    /// The job that was submitted.
    pub job: RenderJob,
    /// Whether the render succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track render jobs for assertions
/// - Configure the number of pages produced
/// - Inject failures and artificial delays
///
/// Page files are actually written under `work_dir/pages`, so staging
/// uploads run for real against an in-memory store.
#[derive(Clone)]
pub struct MockConverter {
    renders: Arc<RwLock<Vec<RecordedRender>>>,
    page_count: Arc<RwLock<u32>>,
    next_error: Arc<RwLock<Option<ConverterError>>>,
    render_delay_ms: Arc<RwLock<u64>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter producing 3 pages per render.
    pub fn new() -> Self {
        Self {
            renders: Arc::new(RwLock::new(Vec::new())),
            page_count: Arc::new(RwLock::new(3)),
            next_error: Arc::new(RwLock::new(None)),
            render_delay_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all recorded renders.
    pub async fn recorded_renders(&self) -> Vec<RecordedRender> {
        self.renders.read().await.clone()
    }

    /// Get the number of renders performed.
    pub async fn render_count(&self) -> usize {
        self.renders.read().await.len()
    }

    /// Set the number of pages produced per render.
    pub async fn set_page_count(&self, pages: u32) {
        *self.page_count.write().await = pages;
    }

    /// Configure the next render to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set an artificial render duration.
    pub async fn set_render_delay(&self, delay: Duration) {
        *self.render_delay_ms.write().await = delay.as_millis() as u64;
    }

    async fn take_error(&self) -> Option<ConverterError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render(&self, job: RenderJob) -> Result<RenderOutput, ConverterError> {
        let delay_ms = *self.render_delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if let Some(err) = self.take_error().await {
            self.renders.write().await.push(RecordedRender {
                job,
                success: false,
            });
            return Err(err);
        }

        let page_count = *self.page_count.read().await;
        if page_count == 0 {
            self.renders.write().await.push(RecordedRender {
                job,
                success: false,
            });
            return Err(ConverterError::EmptyDocument);
        }

        let pages_dir = job.work_dir.join("pages");
        tokio::fs::create_dir_all(&pages_dir).await?;

        let mut pages: Vec<PathBuf> = Vec::with_capacity(page_count as usize);
        for page_no in 1..=page_count {
            let path = pages_dir.join(format!("{page_no:04}.pdf"));
            tokio::fs::write(&path, format!("%PDF-1.4 mock page {page_no}")).await?;
            pages.push(path);
        }

        self.renders.write().await.push(RecordedRender {
            job,
            success: true,
        });

        Ok(RenderOutput {
            pages,
            duration_ms: delay_ms,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
