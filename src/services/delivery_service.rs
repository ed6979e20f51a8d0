use crate::adapters::transport::Transport;
use crate::domain::message::Message;
use crate::domain::roster::{ResolvedRecipient, RosterSnapshot};
use crate::error::{AppError, Result};
use crate::services::payload_builder::PayloadBuilder;
use crate::services::resolver;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) sent_total: Counter<u64>,
    pub(crate) unresolved_total: Counter<u64>,
    pub(crate) batch_size: Histogram<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("zapdrop");
        Self {
            sent_total: meter
                .u64_counter("zapdrop_messages_sent_total")
                .with_description("Messages handed to the transport")
                .build(),
            unresolved_total: meter
                .u64_counter("zapdrop_recipients_unresolved_total")
                .with_description("Messages skipped because no contact or group matched")
                .build(),
            batch_size: meter
                .u64_histogram("zapdrop_batch_size")
                .with_description("Number of messages in a delivered batch")
                .build(),
        }
    }
}

/// Outcome of one delivered batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub total: usize,
    pub sent: usize,
    pub unresolved: usize,
}

#[derive(Clone, Debug)]
pub struct DeliveryService {
    transport: Arc<dyn Transport>,
    builder: PayloadBuilder,
    metrics: Metrics,
}

impl DeliveryService {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let builder = PayloadBuilder::new(Arc::clone(&transport));
        Self { transport, builder, metrics: Metrics::new() }
    }

    /// Fetches the contact and group rosters once for a batch.
    ///
    /// # Errors
    /// Returns `AppError::Roster` if either roster cannot be fetched.
    pub async fn fetch_roster(&self) -> Result<RosterSnapshot> {
        let contacts = self.transport.list_contacts().await.map_err(|e| {
            tracing::error!(error = %e, "Failed getting contacts");
            AppError::Roster(e)
        })?;
        let groups = self.transport.list_groups().await.map_err(|e| {
            tracing::error!(error = %e, "Failed getting joined groups");
            AppError::Roster(e)
        })?;
        Ok(RosterSnapshot { contacts, groups })
    }

    /// Delivers a batch in order.
    ///
    /// Unresolved recipients are logged and skipped. Any other failure stops the
    /// batch; messages already sent stay sent.
    ///
    /// # Errors
    /// Returns `AppError::Roster` if the roster cannot be fetched, the payload
    /// builder's error for a bad attachment, and `AppError::Send` if the
    /// transport refuses a message.
    #[tracing::instrument(err(level = "warn"), skip(self, batch), fields(count = batch.len()))]
    pub async fn deliver(&self, batch: &[Message]) -> Result<DeliveryReport> {
        self.metrics.batch_size.record(batch.len() as u64, &[]);
        let roster = self.fetch_roster().await?;

        let mut report = DeliveryReport { total: batch.len(), sent: 0, unresolved: 0 };

        for (index, message) in batch.iter().enumerate() {
            let resolved = resolver::resolve(&message.recipient, &roster.contacts, &roster.groups);
            let ResolvedRecipient::Found(handle) = resolved else {
                tracing::info!(index, recipient = %message.recipient, "Recipient was not found");
                self.metrics.unresolved_total.add(1, &[]);
                report.unresolved += 1;
                continue;
            };

            let payload = self.builder.build(message).await?;
            let kind = payload.kind();

            if let Err(e) = self.transport.send(&handle, payload).await {
                tracing::error!(
                    error = %e,
                    index,
                    recipient = %message.recipient,
                    "Error sending message to recipient"
                );
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "failure")]);
                return Err(AppError::Send(e));
            }

            self.metrics.sent_total.add(1, &[KeyValue::new("status", "success"), KeyValue::new("kind", kind)]);
            report.sent += 1;
            tracing::info!(index, recipient = %message.recipient, to = %handle, kind, "Sent message successfully");
        }

        Ok(report)
    }
}
