/*
 * Responsibility
 * - HTTP 面の公開ポイント (routes() / route_table() の re-export など)
 */
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::{route_table, routes};
