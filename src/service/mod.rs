pub mod creative;
pub mod health;
pub mod upsert;
