/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: TokenVerifier, entities: EntityService, health: HealthProbe
 * - Clone 前提で持つ (内部は Arc/Copy で cheap)
 * - リクエスト間で共有する値はすべて不変
 */
use std::sync::Arc;

use crate::services::{auth::TokenVerifier, entities::EntityService, health::HealthProbe};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn TokenVerifier>,
    pub entities: Arc<dyn EntityService>,
    pub health: HealthProbe,
}

impl AppState {
    pub fn new(
        auth: Arc<dyn TokenVerifier>,
        entities: Arc<dyn EntityService>,
        health: HealthProbe,
    ) -> Self {
        Self {
            auth,
            entities,
            health,
        }
    }
}
