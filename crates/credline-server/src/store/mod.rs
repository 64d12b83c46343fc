//! Record store abstraction.
//!
//! The engine only ever needs four operations with read-your-writes
//! consistency inside a single request. Backends must round-trip every
//! field verbatim, including 2-decimal currency values.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use credline_core::{Result, Submission};

/// Row-oriented persistence keyed by record id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every record.
    async fn list_all(&self) -> Result<Vec<Submission>>;

    /// Fetch one record, `None` on miss.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>>;

    /// Insert a new record.
    async fn insert(&self, sub: &Submission) -> Result<()>;

    /// Overwrite the record with this id.
    async fn update(&self, sub: &Submission) -> Result<()>;
}
