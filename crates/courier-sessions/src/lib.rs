//! `courier-sessions` — interactive input collection as pure state machines.
//!
//! One machine per conversational flow (create / edit / remove). The driver
//! owns all I/O and timers: it renders prompts from the semantic replies,
//! turns platform messages into [`SessionInput`] events, and fires
//! [`SessionInput::Timeout`] when the current step's window (each flow's
//! `timeout()` accessor) elapses. Nothing here touches a store — a flow only
//! ever yields a value for the engine at its explicit save/confirm step, so
//! cancelling a session has no external side effect.

pub mod create;
pub mod edit;
pub mod remove;
pub mod select;
pub mod types;

pub use create::{CreateCancel, CreateFlow, CreateReply, CreateState};
pub use edit::{EditCancel, EditField, EditFlow, EditReply, EditState, ValueRejection};
pub use remove::{RemoveCancel, RemoveFlow, RemoveReply, RemoveState};
pub use select::{parse_selection, Selection};
pub use types::{preview, SessionInput};
