//! `courier-scheduler` — validated schedule mutations and the delivery loop.
//!
//! # Dispatch policy
//!
//! A due record gets exactly one delivery attempt per process lifetime:
//!
//! | Outcome of the attempt       | Record  | Attachment |
//! |------------------------------|---------|------------|
//! | Delivered                    | deleted | deleted    |
//! | Transport failure            | deleted | deleted    |
//! | Channel no longer resolvable | deleted | deleted    |
//!
//! No-duplicate-delivery is favored over guaranteed delivery: a failed send
//! is logged and dropped, never retried.

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod sink;

pub use dispatch::DispatchLoop;
pub use engine::{AttachmentEdit, CreateRequest, EditRequest, ScheduleEngine};
pub use error::{Result, SchedulerError};
pub use sink::{DeliveryError, DeliverySink, OutgoingFile};
