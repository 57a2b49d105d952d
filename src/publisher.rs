use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::config::AdapterConfig;
use crate::domain::{
    sensor_schema, DatasetDescriptor, Entity, FieldValue, Notification, ReadingRecord,
    WriteOutcome, API_ERROR_EVENT, LAST_UPDATE_FIELD,
};
use crate::error::PublishError;
use crate::registry::EntityRegistry;

const NOTIFICATION_CAPACITY: usize = 1024;

#[derive(Default)]
struct LiveEntities {
    entities: HashMap<String, Entity>,
    /// Saved by the registry before the entity was first sighted
    pending_saved: HashSet<String>,
}

/// Counts from one `publish` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub created: usize,
    pub written: usize,
    pub not_present: usize,
}

/// Owns the live sensor entities and writes reconciled readings into them.
pub struct Publisher {
    prefix: String,
    hide_sub_index: bool,
    registry: Arc<dyn EntityRegistry>,
    live: Mutex<LiveEntities>,
    notifier: broadcast::Sender<Notification>,
}

impl Publisher {
    pub fn new(cfg: &AdapterConfig, registry: Arc<dyn EntityRegistry>) -> Self {
        let (notifier, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            prefix: cfg.id.clone(),
            hide_sub_index: cfg.hide_sub_index,
            registry,
            live: Mutex::new(LiveEntities::default()),
            notifier,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    pub fn entity_id(&self, location: &str) -> String {
        format!("{}-{}", self.prefix, location)
    }

    /// Write one dataset's readings into the entities for their regions,
    /// creating entities on first sighting.
    pub async fn publish(
        &self,
        records: &[ReadingRecord],
        descriptor: &DatasetDescriptor,
        display_timestamp: Option<&str>,
    ) -> PublishSummary {
        let mut summary = PublishSummary::default();
        let mut created = Vec::new();
        let schema = sensor_schema(self.hide_sub_index);

        {
            let mut live = self.live.lock().await;
            for record in records {
                let id = self.entity_id(&record.location);

                if !live.entities.contains_key(&id) {
                    let mut entity =
                        Entity::new(&id, &record.location, &schema, self.notifier.clone());
                    if live.pending_saved.remove(&id) {
                        entity.set_saved(true);
                    }
                    created.push(entity.describe());
                    live.entities.insert(id.clone(), entity);
                }

                let Some(entity) = live.entities.get_mut(&id) else {
                    continue;
                };

                for (field, value) in &record.values {
                    summary.record(entity.write_field(field, *value));
                    if field == descriptor.headline_field {
                        let label = descriptor.rate(*value);
                        summary.record(entity.write_field(descriptor.rating_field, label));
                    }
                }
                if let Some(ts) = display_timestamp {
                    summary.record(entity.write_field(LAST_UPDATE_FIELD, ts));
                }
            }
        }

        // the registry may call back into handle_saved, so the lock is released first
        summary.created = created.len();
        for description in created {
            let id = description.id.clone();
            if let Err(e) = self.registry.add_entity(description).await {
                warn!(%id, error = %e, "registry rejected new entity");
            }
        }

        debug!(
            dataset = %descriptor.kind,
            created = summary.created,
            written = summary.written,
            not_present = summary.not_present,
            "published readings"
        );
        summary
    }

    /// Tell every saved entity that a fetch failed. Returns how many were told.
    pub async fn broadcast_error(&self, message: &str) -> usize {
        let mut live = self.live.lock().await;
        let mut notified = 0;
        for entity in live.entities.values_mut().filter(|e| e.is_saved()) {
            entity.emit_event(API_ERROR_EVENT, message);
            notified += 1;
        }
        notified
    }

    /// Registry hook: the user saved `id`. May arrive before the entity exists.
    pub async fn handle_saved(&self, id: &str) {
        let mut live = self.live.lock().await;
        match live.entities.get_mut(id) {
            Some(entity) => entity.set_saved(true),
            None => {
                live.pending_saved.insert(id.to_string());
            }
        }
    }

    /// Registry hook: forget `id`. It is recreated if upstream reports the region again.
    pub async fn remove_device(&self, id: &str) -> Result<(), PublishError> {
        let Some(entity) = self.live.lock().await.entities.remove(id) else {
            return Err(PublishError::NotFound(id.to_string()));
        };
        if let Err(e) = self.registry.remove_entity(id).await {
            warn!(%id, error = %e, "registry refused removal, entity kept");
            self.live
                .lock()
                .await
                .entities
                .entry(id.to_string())
                .or_insert(entity);
            return Err(e.into());
        }
        info!(%id, "entity removed");
        Ok(())
    }

    /// Registry hook: manual pairing. Entities only come from upstream readings.
    pub async fn add_device(&self, id: &str) -> Result<(), PublishError> {
        if self.live.lock().await.entities.contains_key(id) {
            return Err(PublishError::AlreadyExists(id.to_string()));
        }
        warn!(%id, "addDevice - do not know how to handle");
        Err(PublishError::Unsupported(id.to_string()))
    }

    pub async fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.live.lock().await.entities.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn field_value(&self, id: &str, field: &str) -> Option<FieldValue> {
        self.live.lock().await.entities.get(id)?.value(field).cloned()
    }

    pub async fn is_saved(&self, id: &str) -> bool {
        self.live
            .lock()
            .await
            .entities
            .get(id)
            .is_some_and(|e| e.is_saved())
    }

    pub async fn last_event(&self, id: &str) -> Option<String> {
        self.live
            .lock()
            .await
            .entities
            .get(id)?
            .last_event()
            .map(str::to_string)
    }

    pub async fn is_pending_save(&self, id: &str) -> bool {
        self.live.lock().await.pending_saved.contains(id)
    }
}

impl PublishSummary {
    fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => self.written += 1,
            WriteOutcome::FieldNotPresent => self.not_present += 1,
        }
    }
}
