use chrono::{DateTime, Utc};
use thiserror::Error;

use courier_core::types::{GuildId, ScheduleId};
use courier_store::StoreError;

/// Errors surfaced by the scheduling engine.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The guild is at its configured cap; nothing was persisted.
    #[error("guild {guild} already has {current}/{limit} messages scheduled")]
    CapacityExceeded {
        guild: GuildId,
        current: u64,
        limit: u64,
    },

    /// The requested delivery time is not strictly in the future.
    #[error("scheduled time {at} is in the past")]
    PastTime { at: DateTime<Utc> },

    /// Message bodies must not be empty.
    #[error("message content must not be empty")]
    EmptyContent,

    /// The record no longer exists (already delivered or removed).
    #[error("schedule not found: {id}")]
    NotFound { id: ScheduleId },

    /// The record belongs to a different member.
    #[error("schedule {id} does not belong to the requesting member")]
    NotOwner { id: ScheduleId },

    /// Persistence-layer failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
