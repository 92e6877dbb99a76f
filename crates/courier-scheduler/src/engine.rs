use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use courier_core::time::ensure_future;
use courier_core::types::{ChannelId, GuildId, ScheduleId, UserId};
use courier_store::{AttachmentStore, MessageStore, MessageUpdate, NewMessage, ScheduledMessage};

use crate::error::{Result, SchedulerError};

/// Input for a completed create flow.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub user_id: UserId,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    /// Already normalized to UTC by the collector; revalidated here anyway.
    pub send_at: DateTime<Utc>,
    pub content: String,
    /// Raw upload bytes and the client-supplied filename.
    pub attachment: Option<(Vec<u8>, String)>,
}

/// The edits accumulated by one interactive session, committed together.
#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    pub send_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub attachment: AttachmentEdit,
}

impl EditRequest {
    /// True when the session ended without collecting any change.
    pub fn is_empty(&self) -> bool {
        self.send_at.is_none()
            && self.content.is_none()
            && matches!(self.attachment, AttachmentEdit::Keep)
    }
}

/// What to do with the stored attachment on save.
#[derive(Debug, Clone, Default)]
pub enum AttachmentEdit {
    /// Leave the stored file untouched.
    #[default]
    Keep,
    /// Delete the old file (if any) and store these bytes instead.
    Replace { bytes: Vec<u8>, name: String },
    /// Delete the old file (if any) and clear the reference.
    Clear,
}

/// Validates and applies schedule mutations on top of the two stores.
///
/// Every operation revalidates its own preconditions — capacity, the
/// strictly-in-the-future rule, non-empty content, ownership — rather than
/// trusting whatever collected the input.
pub struct ScheduleEngine {
    store: Arc<MessageStore>,
    attachments: Arc<AttachmentStore>,
    max_per_guild: u64,
}

impl ScheduleEngine {
    pub fn new(
        store: Arc<MessageStore>,
        attachments: Arc<AttachmentStore>,
        max_per_guild: u64,
    ) -> Self {
        Self {
            store,
            attachments,
            max_per_guild,
        }
    }

    /// Queue a new message.
    ///
    /// Check order is the surface order: guild capacity first (so the
    /// requester is turned away before collecting anything else), then the
    /// time rule, then the body rule. The attachment is written before the
    /// record so a stored record never points at a missing file.
    pub fn create(&self, req: CreateRequest) -> Result<ScheduledMessage> {
        let current = self.store.count_in_guild(req.guild_id)?;
        if current >= self.max_per_guild {
            return Err(SchedulerError::CapacityExceeded {
                guild: req.guild_id,
                current,
                limit: self.max_per_guild,
            });
        }
        ensure_future(req.send_at, Utc::now())
            .map_err(|_| SchedulerError::PastTime { at: req.send_at })?;
        if req.content.trim().is_empty() {
            return Err(SchedulerError::EmptyContent);
        }

        let attachment = match req.attachment {
            Some((ref bytes, ref name)) => Some(self.attachments.save(bytes, name)?),
            None => None,
        };

        let record = self.store.create(NewMessage {
            user_id: req.user_id,
            guild_id: req.guild_id,
            channel_id: req.channel_id,
            send_at: req.send_at,
            content: req.content,
            attachment,
        })?;
        info!(
            schedule_id = %record.id,
            guild = %record.guild_id,
            send_at = %record.send_at,
            "message scheduled"
        );
        Ok(record)
    }

    /// Apply the edits accumulated by one session as a single partial update.
    ///
    /// Ownership is enforced here, not upstream: an id lifted from another
    /// member's listing is rejected even if the driver forgot to filter.
    /// Returns the merged record as committed.
    pub fn edit(&self, id: &ScheduleId, user: UserId, req: EditRequest) -> Result<ScheduledMessage> {
        let mut record = self
            .store
            .get(id)?
            .ok_or_else(|| SchedulerError::NotFound { id: id.clone() })?;
        if record.user_id != user {
            return Err(SchedulerError::NotOwner { id: id.clone() });
        }
        if req.is_empty() {
            return Ok(record);
        }

        if let Some(send_at) = req.send_at {
            ensure_future(send_at, Utc::now())
                .map_err(|_| SchedulerError::PastTime { at: send_at })?;
        }
        if let Some(ref content) = req.content {
            if content.trim().is_empty() {
                return Err(SchedulerError::EmptyContent);
            }
        }

        let attachment = match req.attachment {
            AttachmentEdit::Keep => None,
            AttachmentEdit::Replace { bytes, name } => Some(
                self.attachments
                    .replace(record.attachment.as_deref(), Some((&bytes, &name)))?,
            ),
            AttachmentEdit::Clear => {
                self.attachments.replace(record.attachment.as_deref(), None)?;
                Some(None)
            }
        };

        let update = MessageUpdate {
            send_at: req.send_at,
            content: req.content,
            attachment,
        };
        self.store.update_fields(id, &update)?;
        info!(schedule_id = %id, "schedule updated");

        if let Some(send_at) = update.send_at {
            record.send_at = send_at;
        }
        if let Some(content) = update.content {
            record.content = content;
        }
        if let Some(attachment) = update.attachment {
            record.attachment = attachment;
        }
        Ok(record)
    }

    /// Remove a schedule together with its attachment.
    ///
    /// The record delete is the operation of record; attachment cleanup after
    /// it is best-effort and never blocks the removal.
    pub fn remove(&self, id: &ScheduleId, user: UserId) -> Result<()> {
        let record = self
            .store
            .get(id)?
            .ok_or_else(|| SchedulerError::NotFound { id: id.clone() })?;
        if record.user_id != user {
            return Err(SchedulerError::NotOwner { id: id.clone() });
        }

        self.store.delete_by_id(id)?;
        if let Some(ref path) = record.attachment {
            if let Err(e) = self.attachments.delete(path) {
                warn!(
                    schedule_id = %id,
                    path = %path.display(),
                    error = %e,
                    "attachment cleanup failed"
                );
            }
        }
        info!(schedule_id = %id, "schedule removed");
        Ok(())
    }

    /// A member's pending schedules, for seeding an interactive session.
    pub fn list(&self, user: UserId) -> Result<Vec<ScheduledMessage>> {
        Ok(self.store.list_by_user(user)?)
    }
}
