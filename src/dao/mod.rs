//! Persistence layer: entity models, the store abstraction, and its backends.

/// Game and action journal storage operations.
pub mod game_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
