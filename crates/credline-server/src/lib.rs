pub mod export;
pub mod gateway;
pub mod notify;
pub mod service;
pub mod store;
pub mod sweeper;

pub use gateway::Gateway;
pub use notify::{EventKind, Notifier, NotifyEvent, WebhookNotifier};
pub use service::{CreateOutcome, SubmissionService, SweepSummary};
pub use store::{MemoryStore, PgStore, RecordStore};
pub use sweeper::Sweeper;
