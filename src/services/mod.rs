/*
 * Responsibility
 * - capability 呼び出しと、その上に載るサービス群の公開
 */
pub mod auth;
pub mod capability;
pub mod entities;
pub mod health;
