//! Contract of the entity-management capabilities.
//!
//! The gateway only forwards to them; their implementation lives elsewhere.
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::services::auth::VerifiedIdentity;
use crate::services::capability::DownstreamError;

/// Merged request parameters (query, JSON body and path segments).
pub type Params = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCapability {
    Create,
    GetAll,
    GetByUuid,
    Update,
    Delete,
}

impl EntityCapability {
    /// Capability name on the wire.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "entities.create",
            Self::GetAll => "entities.getAll",
            Self::GetByUuid => "entities.getByUuid",
            Self::Update => "entities.update",
            Self::Delete => "entities.delete",
        }
    }
}

#[async_trait]
pub trait EntityService: Send + Sync {
    async fn invoke(
        &self,
        capability: EntityCapability,
        params: Params,
        identity: Option<VerifiedIdentity>,
    ) -> Result<Value, DownstreamError>;
}
