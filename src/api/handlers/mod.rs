pub mod entities;
pub mod health;
