use async_trait::async_trait;
use serde_json::Value;

use crate::services::auth::VerifiedIdentity;
use crate::services::capability::{CallMeta, CapabilityClient, DownstreamError};
use crate::services::entities::service::{EntityCapability, EntityService, Params};

/// `EntityService` backed by the capability transport.
#[derive(Clone, Debug)]
pub struct RemoteEntityService {
    client: CapabilityClient,
}

impl RemoteEntityService {
    pub fn new(client: CapabilityClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EntityService for RemoteEntityService {
    async fn invoke(
        &self,
        capability: EntityCapability,
        params: Params,
        identity: Option<VerifiedIdentity>,
    ) -> Result<Value, DownstreamError> {
        let params = Value::Object(params);
        let meta = CallMeta::with_user(identity);

        self.client.call(capability.name(), &params, &meta).await
    }
}
