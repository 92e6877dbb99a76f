use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courier_core::types::{ChannelId, GuildId, ScheduleId, UserId};

/// A persisted scheduled message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledMessage {
    /// UUIDv4 string — primary key, assigned on creation.
    pub id: ScheduleId,
    /// The member who queued the message. Only they may edit or remove it.
    pub user_id: UserId,
    /// Community the capacity limit is scoped to.
    pub guild_id: GuildId,
    /// Delivery target.
    pub channel_id: ChannelId,
    /// UTC instant the message becomes due.
    pub send_at: DateTime<Utc>,
    /// Message body. Never empty.
    pub content: String,
    /// Stored attachment file, if any.
    pub attachment: Option<PathBuf>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp of the last field update.
    pub updated_at: String,
}

/// Fields for a new record. The store assigns the id and audit stamps.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub user_id: UserId,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub send_at: DateTime<Utc>,
    pub content: String,
    pub attachment: Option<PathBuf>,
}

/// Partial update applied in a single store call.
///
/// `None` leaves a field untouched. For the attachment the inner `Option`
/// distinguishes "point at this file" from "clear the reference".
#[derive(Debug, Clone, Default)]
pub struct MessageUpdate {
    pub send_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub attachment: Option<Option<PathBuf>>,
}

impl MessageUpdate {
    /// True when no field is set; callers skip the store round-trip entirely.
    pub fn is_empty(&self) -> bool {
        self.send_at.is_none() && self.content.is_none() && self.attachment.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_has_no_fields() {
        assert!(MessageUpdate::default().is_empty());
    }

    #[test]
    fn clearing_the_attachment_is_not_empty() {
        let update = MessageUpdate {
            attachment: Some(None),
            ..MessageUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
