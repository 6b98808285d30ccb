use crate::error::Result;
use crate::models::Incident;
use crate::state::IncidentStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory incident store (for development and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    incidents: Arc<DashMap<Uuid, Incident>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            incidents: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IncidentStore for InMemoryStore {
    async fn save_incident(&self, incident: &Incident) -> Result<()> {
        self.incidents.insert(incident.id, incident.clone());
        tracing::debug!(
            incident_id = %incident.id,
            ai_status = %incident.ai_status,
            "Incident saved"
        );
        Ok(())
    }

    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>> {
        Ok(self.incidents.get(id).map(|entry| entry.clone()))
    }

    async fn count_incidents(&self) -> Result<u64> {
        Ok(self.incidents.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AiStatus;

    #[tokio::test]
    async fn test_save_and_get_incident() {
        let store = InMemoryStore::new();

        let incident = Incident::new("API returning 500s".to_string(), "tester".to_string());
        let id = incident.id;
        store.save_incident(&incident).await.unwrap();

        let retrieved = store.get_incident(&id).await.unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let store = InMemoryStore::new();

        let mut incident = Incident::new("SSL cert expiring".to_string(), "tester".to_string());
        store.save_incident(&incident).await.unwrap();

        incident.mark_failed("AI unavailable".to_string());
        store.save_incident(&incident).await.unwrap();

        assert_eq!(store.count_incidents().await.unwrap(), 1);
        let retrieved = store.get_incident(&incident.id).await.unwrap().unwrap();
        assert_eq!(retrieved.ai_status, AiStatus::Failed);
    }

    #[tokio::test]
    async fn test_get_missing_incident() {
        let store = InMemoryStore::new();
        assert!(store.get_incident(&Uuid::new_v4()).await.unwrap().is_none());
    }
}
