//! Persistence contract, row entities, and the change feed.

pub mod changes;
pub mod game_store;
pub mod models;
pub mod storage;
