pub mod scheduler;

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

pub use scheduler::{delay_until_next_poll, PollScheduler, SchedulerPhase};

use crate::domain::{DatasetDescriptor, DisplayTimestamp};
use crate::error::FetchError;
use crate::fetch::DatasetSource;
use crate::publisher::Publisher;

/// One firing of the scheduler
#[async_trait]
pub trait PollCycle: Send + Sync {
    async fn poll_cycle(&self);
}

/// Everything a poll cycle needs, passed to the scheduler explicitly
pub struct PollContext {
    source: Arc<dyn DatasetSource>,
    publisher: Arc<Publisher>,
    datasets: Vec<DatasetDescriptor>,
    display: DisplayTimestamp,
}

impl PollContext {
    pub fn new(
        source: Arc<dyn DatasetSource>,
        publisher: Arc<Publisher>,
        datasets: Vec<DatasetDescriptor>,
    ) -> Self {
        Self {
            source,
            publisher,
            datasets,
            display: DisplayTimestamp::default(),
        }
    }

    pub fn publisher(&self) -> &Arc<Publisher> {
        &self.publisher
    }

    pub fn display_timestamp(&self) -> Option<String> {
        self.display.current()
    }

    /// fetch -> parse -> reconcile -> publish for one dataset.
    ///
    /// Failures end this dataset's pipeline only; cached values and the
    /// display timestamp stay as they were.
    pub async fn fetch_and_reconcile(&self, descriptor: &DatasetDescriptor) {
        if let Err(e) = self.run_pipeline(descriptor).await {
            warn!(dataset = %descriptor.kind, kind = e.kind(), error = %e, "fetch failed");
            let notified = self.publisher.broadcast_error(&e.to_string()).await;
            info!(dataset = %descriptor.kind, notified, "api error reported to saved entities");
        }
    }

    async fn run_pipeline(&self, descriptor: &DatasetDescriptor) -> Result<(), FetchError> {
        let fetched = self.source.fetch(descriptor).await?;
        let display = self.display.lower(&fetched.display_key());
        let summary = self
            .publisher
            .publish(&fetched.records, descriptor, Some(display.as_str()))
            .await;
        info!(
            dataset = %descriptor.kind,
            locations = fetched.records.len(),
            created = summary.created,
            updated_at = %fetched.updated_at,
            "readings published"
        );
        Ok(())
    }
}

#[async_trait]
impl PollCycle for PollContext {
    async fn poll_cycle(&self) {
        self.display.reset();
        join_all(self.datasets.iter().map(|d| self.fetch_and_reconcile(d))).await;
    }
}
