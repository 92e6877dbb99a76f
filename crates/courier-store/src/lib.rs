//! `courier-store` — durable persistence for scheduled messages.
//!
//! Two stores, one concern each:
//!
//! - [`MessageStore`]: the SQLite `schedules` table. One row per pending
//!   send; partial updates merge only the supplied fields; deletes are
//!   idempotent so the edit-vs-dispatch race degrades to a silent no-op.
//! - [`AttachmentStore`]: one standalone file per schedule under a configured
//!   directory, filename prefixed with the creation unix timestamp.

pub mod attach;
pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use attach::AttachmentStore;
pub use error::{Result, StoreError};
pub use store::{MessageStore, LIST_LIMIT};
pub use types::{MessageUpdate, NewMessage, ScheduledMessage};
