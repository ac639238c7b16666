//! LibreOffice-based converter implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::splitter::PdfSplitter;
use super::traits::Converter;
use super::types::{RenderJob, RenderOutput};

/// LibreOffice headless converter.
///
/// Renders the input document to a single PDF, then splits it into
/// per-page files. Each render gets its own user profile directory;
/// concurrent instances sharing a profile trip over LibreOffice lock
/// files.
pub struct SofficeConverter {
    config: ConverterConfig,
    splitter: PdfSplitter,
}

impl SofficeConverter {
    /// Creates a new converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            splitter: PdfSplitter,
        }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Builds the soffice command line for one render.
    fn build_args(&self, input_path: &Path, pdf_dir: &Path, profile_dir: &Path) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--nologo".to_string(),
            "--nolockcheck".to_string(),
            "--norestore".to_string(),
            format!("-env:UserInstallation=file://{}", profile_dir.display()),
            "--convert-to".to_string(),
            "pdf".to_string(),
            "--outdir".to_string(),
            pdf_dir.to_string_lossy().to_string(),
            input_path.to_string_lossy().to_string(),
        ]
    }

    /// Runs soffice and returns the path of the produced deck PDF.
    async fn run_engine(&self, job: &RenderJob) -> Result<PathBuf, ConverterError> {
        let pdf_dir = job.work_dir.join("pdf");
        let profile_dir = job.work_dir.join("lo-profile");
        tokio::fs::create_dir_all(&pdf_dir).await?;
        tokio::fs::create_dir_all(&profile_dir).await?;

        let args = self.build_args(&job.input_path, &pdf_dir, &profile_dir);
        debug!(job_key = %job.job_key, args = ?args, "executing soffice");

        let mut child = Command::new(&self.config.soffice_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::SofficeNotFound {
                        path: self.config.soffice_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        let mut stderr = child.stderr.take().expect("stderr should be captured");

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut stderr_buf = Vec::new();
            stderr.read_to_end(&mut stderr_buf).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stderr_buf))
        })
        .await;

        match result {
            Ok(Ok((status, stderr_buf))) => {
                if !status.success() {
                    let stderr_text = String::from_utf8_lossy(&stderr_buf).to_string();
                    error!(
                        job_key = %job.job_key,
                        code = ?status.code(),
                        "soffice conversion failed"
                    );
                    return Err(ConverterError::render_failed(
                        format!("soffice exited with code {:?}", status.code()),
                        if stderr_text.is_empty() {
                            None
                        } else {
                            Some(stderr_text)
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(ConverterError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                error!(
                    job_key = %job.job_key,
                    timeout_secs = self.config.timeout_secs,
                    "soffice conversion timed out"
                );
                let _ = child.kill().await;
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        // soffice names the output <input stem>.pdf
        let stem = job
            .input_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let deck_pdf = pdf_dir.join(format!("{stem}.pdf"));

        if tokio::fs::metadata(&deck_pdf).await.is_err() {
            return Err(ConverterError::OutputMissing { path: deck_pdf });
        }

        Ok(deck_pdf)
    }
}

#[async_trait]
impl Converter for SofficeConverter {
    fn name(&self) -> &str {
        "soffice"
    }

    async fn render(&self, job: RenderJob) -> Result<RenderOutput, ConverterError> {
        let start = Instant::now();

        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        let deck_pdf = self.run_engine(&job).await?;

        let pages_dir = job.work_dir.join("pages");
        let splitter = self.splitter;
        let pages = tokio::task::spawn_blocking(move || splitter.split(&deck_pdf, &pages_dir))
            .await
            .map_err(|e| ConverterError::split_failed(format!("split task failed: {e}")))??;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            job_key = %job.job_key,
            page_count = pages.len(),
            duration_ms,
            "render complete"
        );

        Ok(RenderOutput { pages, duration_ms })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let result = Command::new(&self.config.soffice_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await;

        if let Err(e) = result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::SofficeNotFound {
                    path: self.config.soffice_path.clone(),
                });
            }
            return Err(ConverterError::Io(e));
        }

        Ok(())
    }
}
