use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Weak;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::EntityDescription;
use crate::publisher::Publisher;

/// Host-side store of entities the user can see and save
#[async_trait]
pub trait EntityRegistry: Send + Sync {
    async fn add_entity(&self, entity: EntityDescription) -> Result<()>;
    async fn remove_entity(&self, id: &str) -> Result<()>;
    async fn find_entity(&self, id: &str) -> Option<EntityDescription>;
    async fn mark_saved(&self, id: &str) -> Result<()>;
}

/// Registry kept in process memory, used when no external host is attached.
///
/// Saving an entity is forwarded to the attached publisher's `handle_saved`.
#[derive(Default)]
pub struct InMemoryRegistry {
    entities: RwLock<HashMap<String, EntityDescription>>,
    saved: RwLock<HashSet<String>>,
    publisher: parking_lot::RwLock<Option<Weak<Publisher>>>,
}

impl InMemoryRegistry {
    /// Route save notifications to `publisher`. Held weakly since the
    /// publisher owns this registry.
    pub fn attach(&self, publisher: Weak<Publisher>) {
        *self.publisher.write() = Some(publisher);
    }

    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }

    pub async fn is_saved(&self, id: &str) -> bool {
        self.saved.read().await.contains(id)
    }
}

#[async_trait]
impl EntityRegistry for InMemoryRegistry {
    async fn add_entity(&self, entity: EntityDescription) -> Result<()> {
        info!(id = %entity.id, title = %entity.title, "entity added");
        self.entities.write().await.insert(entity.id.clone(), entity);
        Ok(())
    }

    async fn remove_entity(&self, id: &str) -> Result<()> {
        if self.entities.write().await.remove(id).is_none() {
            anyhow::bail!("entity {id} not registered");
        }
        self.saved.write().await.remove(id);
        info!(%id, "entity removed");
        Ok(())
    }

    async fn find_entity(&self, id: &str) -> Option<EntityDescription> {
        self.entities.read().await.get(id).cloned()
    }

    async fn mark_saved(&self, id: &str) -> Result<()> {
        self.saved.write().await.insert(id.to_string());
        let publisher = self.publisher.read().as_ref().and_then(Weak::upgrade);
        match publisher {
            Some(publisher) => publisher.handle_saved(id).await,
            None => debug!(%id, "saved with no publisher attached"),
        }
        Ok(())
    }
}
