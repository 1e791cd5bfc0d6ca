use crate::catalog::{Catalog, CatalogError, CatalogItem, ProductUpdate};
use crate::models::{OptimizeResponse, StageReport};
use crate::orchestrator::{FailoverOrchestrator, GenerationRequest, OrchestrationResult};
use serde_json::{Value, json};
use std::{future::Future, sync::Arc, time::Instant};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

/// Generate copy for one product, then write it back to the catalog.
#[derive(Clone)]
pub struct Pipeline {
    orchestrator: FailoverOrchestrator,
    catalog: Arc<dyn Catalog>,
    products_page_size: usize,
}

impl Pipeline {
    pub fn new(
        orchestrator: FailoverOrchestrator,
        catalog: Arc<dyn Catalog>,
        products_page_size: usize,
    ) -> Self {
        Self {
            orchestrator,
            catalog,
            products_page_size,
        }
    }

    pub fn orchestrator(&self) -> &FailoverOrchestrator {
        &self.orchestrator
    }

    pub async fn list_products(&self) -> Result<Vec<CatalogItem>, PipelineError> {
        self.catalog
            .list_products(self.products_page_size)
            .await
            .map_err(|err| PipelineError::from_catalog("list_products", err))
    }

    /// Content generation cannot fail; the only error after input validation
    /// is the catalog write, which is attempted exactly once.
    pub async fn optimize(
        &self,
        subject_id: &str,
        subject_title: &str,
    ) -> Result<OptimizeResponse, PipelineError> {
        let subject_id = subject_id.trim();
        if subject_id.is_empty() {
            return Err(PipelineError::invalid_input("optimize", "missing_product_id"));
        }

        let request_id = Uuid::new_v4();
        let request = GenerationRequest::new(subject_id, subject_title);
        info!(
            target = "optimizer.api",
            %request_id,
            subject_id = %request.subject_id,
            title = %request.subject_title,
            "optimize_requested"
        );

        let mut stages = Vec::new();
        let generated = self
            .capture_stage("generate_content", &mut stages, {
                let orchestrator = self.orchestrator.clone();
                let request = request.clone();
                async move {
                    let result = orchestrator.optimize(&request).await;
                    let output = json!({
                        "engine": result.engine_used,
                        "tag_count": result.content.tags.len(),
                    });
                    Ok(StageOutcome::new(result, output))
                }
            })
            .await?;
        let OrchestrationResult {
            content,
            engine_used,
        } = generated;

        let update = ProductUpdate::from_content(&request.subject_id, &content);
        let sync = self
            .capture_stage("sync_catalog", &mut stages, {
                let catalog = self.catalog.clone();
                async move {
                    catalog
                        .update_product(&update)
                        .await
                        .map_err(|err| PipelineError::from_catalog("sync_catalog", err))?;
                    let output = json!({
                        "product_id": update.id,
                        "tags_written": !update.tags.is_empty(),
                    });
                    Ok(StageOutcome::new((), output))
                }
            })
            .await;

        if let Err(err) = sync {
            error!(
                target = "optimizer.api",
                %request_id,
                subject_id = %request.subject_id,
                engine = %engine_used,
                error = %err,
                "catalog_sync_failed"
            );
            return Err(err);
        }

        info!(
            target = "optimizer.api",
            %request_id,
            subject_id = %request.subject_id,
            engine = %engine_used,
            "optimize_completed"
        );
        Ok(OptimizeResponse {
            success: true,
            engine: engine_used,
            data: content,
            stages,
        })
    }

    async fn capture_stage<T, Fut>(
        &self,
        name: &'static str,
        stages: &mut Vec<StageReport>,
        fut: Fut,
    ) -> Result<T, PipelineError>
    where
        Fut: Future<Output = Result<StageOutcome<T>, PipelineError>>,
    {
        let started = Instant::now();
        let outcome = fut.await?;
        let elapsed_ms = started.elapsed().as_millis();
        crate::metrics::stage_elapsed(name, elapsed_ms);
        stages.push(StageReport::new(name, elapsed_ms, outcome.output));
        Ok(outcome.value)
    }
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct PipelineError {
    stage: &'static str,
    message: String,
    kind: PipelineErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    InvalidInput,
    Upstream,
    /// The service itself is misconfigured; retrying the request cannot help.
    Internal,
}

impl PipelineError {
    pub fn invalid_input(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::InvalidInput,
        }
    }

    pub fn upstream(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::Upstream,
        }
    }

    pub fn internal(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::Internal,
        }
    }

    fn from_catalog(stage: &'static str, err: CatalogError) -> Self {
        match err {
            CatalogError::Unconfigured => Self::internal(stage, err.to_string()),
            other => Self::upstream(stage, other.to_string()),
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}

#[derive(Debug)]
pub struct StageOutcome<T> {
    pub value: T,
    pub output: Value,
}

impl<T> StageOutcome<T> {
    fn new(value: T, output: Value) -> Self {
        Self { value, output }
    }
}
