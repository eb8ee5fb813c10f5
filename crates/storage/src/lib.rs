// Storage layer for Vidora
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// - Database: PostgreSQL repository (sqlx)
// - InMemoryDatabase: HashMap-backed twin with identical semantics
// - StorageBackend: enum dispatch with a per-call timeout

pub mod backend;
pub mod error;
pub mod memory;
pub mod models;
pub mod password;
pub mod repositories;

pub use backend::StorageBackend;
pub use error::{Result, StorageError};
pub use memory::InMemoryDatabase;
pub use models::*;
pub use repositories::Database;
