pub mod store;
pub mod sled_store;
pub mod factory;

pub use store::*;
pub use sled_store::SledStore;
pub use factory::{create_in_memory_store, create_store};

use crate::error::Result;
use crate::models::Incident;
use async_trait::async_trait;
use uuid::Uuid;

/// Durable keyed storage for incidents
///
/// `save_incident` is an idempotent upsert keyed by the incident id; backends
/// serialize writes per key.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Insert or replace an incident
    async fn save_incident(&self, incident: &Incident) -> Result<()>;

    /// Get an incident by ID
    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>>;

    /// Number of stored incidents
    async fn count_incidents(&self) -> Result<u64>;
}
