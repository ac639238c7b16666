//! Pipeline runner: executes one job end-to-end.

use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::converter::{Converter, RenderJob};
use crate::metrics::{JOBS_COMPLETED, JOBS_RUNNING, JOB_DURATION, PAGES_RENDERED, RENDER_DURATION};
use crate::registry::{Job, JobError, JobKey, JobRegistry, Transition};
use crate::store::{with_retry, StoreClient, StoreRef};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::manifest::{manifest_key, page_key, FailureManifest, PageEntry, SuccessManifest};

/// Everything `execute` needs to report back on success.
struct ExecutionReport {
    page_count: u32,
    manifest: StoreRef,
}

/// Executes jobs: fetch input, render, stage pages, publish the manifest,
/// and record the terminal state.
///
/// The manifest is always the last object written on the success path, and
/// the registry is only updated after the manifest upload attempt, so store
/// state and registry state stay consistent in that order.
pub struct JobPipeline {
    config: PipelineConfig,
    registry: Arc<JobRegistry>,
    store: Arc<StoreClient>,
    converter: Arc<dyn Converter>,
}

impl JobPipeline {
    /// Creates a new pipeline.
    pub fn new(
        config: PipelineConfig,
        registry: Arc<JobRegistry>,
        store: Arc<StoreClient>,
        converter: Arc<dyn Converter>,
    ) -> Self {
        Self {
            config,
            registry,
            store,
            converter,
        }
    }

    /// Runs a job to its terminal state. Never returns an error; every
    /// failure is resolved into a failed job plus a best-effort failure
    /// manifest.
    pub async fn run(&self, key: JobKey) {
        let job = match self.registry.transition(&key, Transition::Running).await {
            Ok(job) => job,
            Err(e) => {
                warn!(job = %key, error = %e, "cannot start job");
                return;
            }
        };

        info!(
            job = %key,
            input = %job.input,
            output = %job.output,
            "starting conversion pipeline"
        );

        JOBS_RUNNING.inc();
        let start = Instant::now();
        let work_dir = self
            .config
            .scratch_dir
            .join(format!("job-{}", Uuid::new_v4()));

        let result = self.execute(&job, &work_dir).await;
        let result_label = if result.is_ok() { "succeeded" } else { "failed" };

        match result {
            Ok(report) => {
                info!(job = %key, page_count = report.page_count, "conversion pipeline completed");
                if let Err(e) = self
                    .registry
                    .transition(
                        &key,
                        Transition::Succeeded {
                            page_count: report.page_count,
                            manifest: report.manifest,
                        },
                    )
                    .await
                {
                    error!(job = %key, error = %e, "failed to record job success");
                }
            }
            Err(err) => {
                let job_error = err.to_job_error();
                warn!(
                    job = %key,
                    code = job_error.code.as_str(),
                    error = %err,
                    "conversion pipeline failed"
                );

                let manifest = job.output.with_key(manifest_key(&job.output.key));
                self.publish_failure_manifest(&job, &job_error, &manifest)
                    .await;

                if let Err(e) = self
                    .registry
                    .transition(
                        &key,
                        Transition::Failed {
                            error: job_error,
                            manifest,
                        },
                    )
                    .await
                {
                    error!(job = %key, error = %e, "failed to record job failure");
                }
            }
        }

        JOBS_RUNNING.dec();
        JOBS_COMPLETED.with_label_values(&[result_label]).inc();
        JOB_DURATION
            .with_label_values(&[result_label])
            .observe(start.elapsed().as_secs_f64());

        // The directory may not exist when validation failed early.
        let _ = tokio::fs::remove_dir_all(&work_dir).await;
    }

    async fn execute(
        &self,
        job: &Job,
        work_dir: &Path,
    ) -> Result<ExecutionReport, PipelineError> {
        Self::validate(job)?;

        let retry = self.store.retry_config();

        // Size probe before download.
        let stat = with_retry("head", retry, || self.store.stat(&job.input))
            .await
            .map_err(|e| PipelineError::from_store("head", e))?;
        let max_bytes = self.config.max_input_size_bytes();
        if stat.size_bytes > max_bytes {
            return Err(PipelineError::InputTooLarge {
                size_bytes: stat.size_bytes,
                max_bytes,
            });
        }

        // Fetch input to scratch.
        let input_path = work_dir
            .join("input")
            .join(input_file_name(&job.input.key));
        with_retry("get", retry, || self.store.download(&job.input, &input_path))
            .await
            .map_err(|e| PipelineError::from_store("get", e))?;

        // Render under the engine deadline.
        let render_job = RenderJob {
            job_key: job.key.to_string(),
            input_path,
            work_dir: work_dir.to_path_buf(),
        };
        let output = self.converter.render(render_job).await?;
        RENDER_DURATION.observe(output.duration_ms as f64 / 1000.0);

        // Stage every page before the manifest.
        let mut pages = Vec::with_capacity(output.pages.len());
        for (idx, page_path) in output.pages.iter().enumerate() {
            let page_no = (idx + 1) as u32;
            let key = page_key(&job.output.key, page_no);
            let location = job.output.with_key(key.clone());
            with_retry("put", retry, || self.store.upload_file(page_path, &location))
                .await
                .map_err(|e| PipelineError::from_store("put", e))?;
            pages.push(PageEntry { page: page_no, key });
        }

        // Publish the manifest last; its presence is the completion signal.
        let manifest = SuccessManifest::new(job, pages);
        let body = serde_json::to_vec_pretty(&manifest).map(Bytes::from).map_err(|e| {
            PipelineError::Internal {
                reason: format!("failed to encode manifest: {e}"),
            }
        })?;
        let location = job.output.with_key(manifest_key(&job.output.key));
        with_retry("put", retry, || {
            self.store.put_bytes(&location, body.clone())
        })
        .await
        .map_err(|e| PipelineError::from_store("put", e))?;

        PAGES_RENDERED.observe(manifest.page_count as f64);
        Ok(ExecutionReport {
            page_count: manifest.page_count,
            manifest: location,
        })
    }

    fn validate(job: &Job) -> Result<(), PipelineError> {
        if job.key.tenant_id.is_empty() {
            return Err(PipelineError::Validation {
                reason: "missing tenant id".to_string(),
            });
        }
        if job.input.bucket.is_empty() || job.input.key.is_empty() {
            return Err(PipelineError::Validation {
                reason: "input location is incomplete".to_string(),
            });
        }
        if job.output.bucket.is_empty() {
            return Err(PipelineError::Validation {
                reason: "output bucket is missing".to_string(),
            });
        }
        Ok(())
    }

    /// Best-effort: the job is failed either way, callers only poll the
    /// registry for the terminal status.
    async fn publish_failure_manifest(
        &self,
        job: &Job,
        error: &JobError,
        location: &StoreRef,
    ) {
        let manifest = FailureManifest::new(job, error);
        let body = match serde_json::to_vec_pretty(&manifest) {
            Ok(body) => Bytes::from(body),
            Err(e) => {
                error!(job = %job.key, error = %e, "failed to encode failure manifest");
                return;
            }
        };

        match with_retry("put", self.store.retry_config(), || {
            self.store.put_bytes(location, body.clone())
        })
        .await
        {
            Ok(()) => info!(job = %job.key, key = %location.key, "failure manifest written"),
            Err(e) => {
                error!(job = %job.key, error = %e, "failed to write failure manifest");
            }
        }
    }
}

/// Local file name for the downloaded input, keeping the real extension so
/// the engine can sniff the format.
fn input_file_name(key: &str) -> String {
    let name = key.rsplit('/').next().unwrap_or("");
    if name.is_empty() || name == "." || name == ".." {
        "input.pptx".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_file_name_from_key() {
        assert_eq!(
            input_file_name("tenants/acme/jobs/1/input/deck.pptx"),
            "deck.pptx"
        );
        assert_eq!(input_file_name("deck.pptx"), "deck.pptx");
    }

    #[test]
    fn test_input_file_name_fallback() {
        assert_eq!(input_file_name("prefix/"), "input.pptx");
        assert_eq!(input_file_name(""), "input.pptx");
    }
}
