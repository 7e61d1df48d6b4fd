//! The catalog query boundary, per spec.md §6 ("Inbound"). Implementors
//! are read-only and may block; the search tolerates arbitrary latency
//! and propagates cancellation (§5). Modeled as an `async_trait` the way
//! the teacher's provider clients are
//! (`model/src/clients/resource_provider_client.rs`,
//! `agent/resource-agent`'s provider traits).

use crate::error::Result;
use async_trait::async_trait;
use olm_entity::{Entity, Predicate};

#[async_trait]
pub trait EntitySource: Send + Sync {
    async fn filter(&self, predicate: &dyn Predicate) -> Result<Vec<Entity>>;
}
