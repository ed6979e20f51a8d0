use crate::config::{AdmissionPolicy, DeliveryConfig};
use crate::error::{AppError, Result};
use crate::services::delivery_service::{DeliveryReport, DeliveryService};
use crate::services::parser::BatchParser;
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

#[derive(Clone, Debug)]
struct Admission {
    slots: Arc<Semaphore>,
    policy: AdmissionPolicy,
    rejected_total: Counter<u64>,
}

impl Admission {
    async fn enter(&self) -> Result<OwnedSemaphorePermit> {
        match self.policy {
            AdmissionPolicy::Wait => Arc::clone(&self.slots).acquire_owned().await.map_err(|_| AppError::Busy),
            AdmissionPolicy::Reject => Arc::clone(&self.slots).try_acquire_owned().map_err(|e| {
                if matches!(e, TryAcquireError::NoPermits) {
                    self.rejected_total.add(1, &[]);
                    tracing::warn!("Rejecting batch, delivery slots exhausted");
                }
                AppError::Busy
            }),
        }
    }
}

/// Single entry point shared by the HTTP endpoint and the folder watcher.
#[derive(Clone, Debug)]
pub struct IngestService {
    parser: BatchParser,
    delivery: DeliveryService,
    admission: Option<Admission>,
}

impl IngestService {
    #[must_use]
    pub fn new(parser: BatchParser, delivery: DeliveryService, config: &DeliveryConfig) -> Self {
        let admission = config.max_concurrent_batches.map(|limit| Admission {
            slots: Arc::new(Semaphore::new(limit)),
            policy: config.admission_policy,
            rejected_total: global::meter("zapdrop")
                .u64_counter("zapdrop_batches_rejected_total")
                .with_description("Batches refused because every delivery slot was taken")
                .build(),
        });
        Self { parser, delivery, admission }
    }

    /// Parses a raw batch and delivers it.
    ///
    /// The whole batch is parsed and validated before anything is resolved or sent.
    ///
    /// # Errors
    /// Returns a parse-class `AppError` if the batch is rejected, `AppError::Busy`
    /// if admission is refused, and the delivery error otherwise.
    #[tracing::instrument(err(level = "warn"), skip(self, body), fields(hint = %hint, size = body.len()))]
    pub async fn ingest(&self, hint: &str, body: &[u8]) -> Result<DeliveryReport> {
        let messages = self.parser.parse(hint, body)?;

        let _permit = match &self.admission {
            Some(admission) => Some(admission.enter().await?),
            None => None,
        };

        let report = self.delivery.deliver(&messages).await?;
        tracing::info!(
            total = report.total,
            sent = report.sent,
            unresolved = report.unresolved,
            "Batch delivered"
        );
        Ok(report)
    }
}
