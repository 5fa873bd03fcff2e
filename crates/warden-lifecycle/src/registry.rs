//! Project registry: the only cross-project shared state. The trait is the
//! seam for external persistence; the in-memory implementation serializes
//! access behind a single lock.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use warden_types::{Result, WardenError};

use crate::project::ProjectState;

#[async_trait]
pub trait ProjectRegistry: Send + Sync {
    async fn create(&self, project: ProjectState) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<ProjectState>;
    async fn update(&self, project: ProjectState) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn list(&self) -> Result<Vec<ProjectState>>;
}

/// In-memory registry. One `RwLock` over the whole map: writes are
/// serialized, lookups are by identity, listing iterates under the read lock.
#[derive(Default)]
pub struct InMemoryProjectRegistry {
    projects: RwLock<HashMap<Uuid, ProjectState>>,
}

impl InMemoryProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectRegistry for InMemoryProjectRegistry {
    async fn create(&self, project: ProjectState) -> Result<()> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.id) {
            return Err(WardenError::Other(format!(
                "project '{}' already exists",
                project.id
            )));
        }
        projects.insert(project.id, project);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<ProjectState> {
        self.projects
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| WardenError::ProjectNotFound { id: id.to_string() })
    }

    async fn update(&self, project: ProjectState) -> Result<()> {
        let mut projects = self.projects.write().await;
        if !projects.contains_key(&project.id) {
            return Err(WardenError::ProjectNotFound {
                id: project.id.to_string(),
            });
        }
        projects.insert(project.id, project);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.projects
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| WardenError::ProjectNotFound { id: id.to_string() })
    }

    async fn list(&self) -> Result<Vec<ProjectState>> {
        Ok(self.projects.read().await.values().cloned().collect())
    }
}
