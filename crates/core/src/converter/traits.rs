//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{RenderJob, RenderOutput};

/// A converter that renders a document into ordered per-page PDF files.
///
/// One render call per job; implementations own the engine process
/// lifecycle, including enforcing the deadline and killing the process on
/// expiry. Partial output from a killed render must never be returned.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Renders the input document, returning per-page files in slide order.
    async fn render(&self, job: RenderJob) -> Result<RenderOutput, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
