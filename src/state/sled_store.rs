use crate::error::{AppError, Result};
use crate::models::Incident;
use crate::state::IncidentStore;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Persistent incident store using Sled embedded database
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    incidents_tree: sled::Tree,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            AppError::Storage(format!("Failed to open Sled database: {}", e))
        })?;

        let incidents_tree = db.open_tree("incidents").map_err(|e| {
            AppError::Storage(format!("Failed to open incidents tree: {}", e))
        })?;

        tracing::info!("Initialized Sled store at {:?}", path.as_ref());

        Ok(Self {
            db: Arc::new(db),
            incidents_tree,
        })
    }

    fn serialize_incident(incident: &Incident) -> Result<Vec<u8>> {
        Ok(bincode::serialize(incident)?)
    }

    fn deserialize_incident(bytes: &[u8]) -> Result<Incident> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn incident_key(id: &Uuid) -> Vec<u8> {
        id.as_bytes().to_vec()
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::Storage(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl IncidentStore for SledStore {
    async fn save_incident(&self, incident: &Incident) -> Result<()> {
        let key = Self::incident_key(&incident.id);
        let value = Self::serialize_incident(incident)?;

        self.incidents_tree.insert(&key, value).map_err(|e| {
            AppError::Storage(format!("Failed to save incident: {}", e))
        })?;

        self.incidents_tree.flush().map_err(|e| {
            AppError::Storage(format!("Failed to flush incidents tree: {}", e))
        })?;

        tracing::debug!(
            incident_id = %incident.id,
            ai_status = %incident.ai_status,
            "Incident saved to Sled"
        );
        Ok(())
    }

    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>> {
        let key = Self::incident_key(id);

        match self.incidents_tree.get(&key) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize_incident(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Storage(format!("Failed to get incident: {}", e))),
        }
    }

    async fn count_incidents(&self) -> Result<u64> {
        Ok(self.incidents_tree.len() as u64)
    }
}
