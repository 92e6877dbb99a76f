//! `courier-core` — configuration, shared identifiers, and timestamp handling
//! for the scheduled-message subsystem.
//!
//! Everything user-facing funnels through [`time`]: user-entered timestamps
//! are interpreted in a single fixed UTC offset and normalized to UTC before
//! they reach any store or engine.

pub mod config;
pub mod error;
pub mod time;
pub mod types;

pub use config::CourierConfig;
pub use error::{CoreError, Result};
pub use types::{ChannelId, GuildId, ScheduleId, UserId};
