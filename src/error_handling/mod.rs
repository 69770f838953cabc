//! Error types for the engine, storage layer, and process setup.

mod types;

pub use types::{DatabaseError, EngineError, InitializationError};
