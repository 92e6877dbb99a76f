//! The edit flow: pick a record, loop over a field menu, save once.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};

use courier_core::time::{ensure_future, parse_send_at};
use courier_core::types::{ScheduleId, UserId};
use courier_scheduler::engine::{AttachmentEdit, EditRequest};
use courier_store::ScheduledMessage;

use crate::select::{parse_selection, Selection};
use crate::types::SessionInput;

/// Which field the session is currently collecting a value for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Time,
    Content,
    Attachment,
}

/// Where an edit session currently waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// Picking a record from the snapshotted listing.
    AwaitingSelection,
    /// At the field menu (`1`/`2`/`3`/`save`).
    AwaitingField,
    /// Waiting for the new value of one field.
    AwaitingValue(EditField),
    Saved,
    Cancelled,
}

/// Why a value was bounced back to the menu. Accumulated edits are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRejection {
    InvalidTime,
    PastTime,
}

/// Why an edit session ended with nothing committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCancel {
    Exit,
    InvalidSelection,
    TimedOut,
}

/// Result of feeding one input event into an edit session.
#[derive(Debug)]
pub enum EditReply {
    /// Show the field menu.
    Menu,
    /// Prompt for the selected field's new value.
    AskValue(EditField),
    /// The new value was accepted; back at the menu.
    Accepted(EditField),
    /// The value was rejected; back at the menu, accumulated edits intact.
    Rejected(ValueRejection),
    /// Unknown menu option; show the menu again.
    InvalidOption,
    /// `save` with accumulated edits — commit through the engine.
    Save {
        id: ScheduleId,
        user: UserId,
        edits: EditRequest,
    },
    /// `save` with nothing accumulated — no store call to make.
    NoChanges,
    /// Session over with nothing committed.
    Cancelled(EditCancel),
    /// The session already reached a terminal state; nothing happens.
    Closed,
}

/// Accumulates field edits for one record and releases them on `save`.
pub struct EditFlow {
    user: UserId,
    offset: FixedOffset,
    /// Snapshot taken at session start; selection indexes stay stable even
    /// if the store changes underneath.
    listing: Vec<ScheduledMessage>,
    state: EditState,
    selected: Option<usize>,
    edits: EditRequest,
}

impl EditFlow {
    /// Start a session over a member's listing (already owner-filtered for
    /// display; the engine re-checks ownership at commit anyway).
    pub fn new(user: UserId, listing: Vec<ScheduledMessage>, offset: FixedOffset) -> Self {
        Self {
            user,
            offset,
            listing,
            state: EditState::AwaitingSelection,
            selected: None,
            edits: EditRequest::default(),
        }
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    /// The snapshotted listing, for rendering the selection prompt.
    pub fn listing(&self) -> &[ScheduledMessage] {
        &self.listing
    }

    /// The record being edited, once one is selected.
    pub fn selected(&self) -> Option<&ScheduledMessage> {
        self.selected.and_then(|i| self.listing.get(i))
    }

    /// Reply window for the current step.
    pub fn timeout(&self) -> Duration {
        match self.state {
            EditState::AwaitingSelection => Duration::from_secs(120),
            EditState::AwaitingField => Duration::from_secs(180),
            EditState::AwaitingValue(EditField::Time) => Duration::from_secs(120),
            EditState::AwaitingValue(EditField::Content) => Duration::from_secs(300),
            EditState::AwaitingValue(EditField::Attachment) => Duration::from_secs(120),
            EditState::Saved | EditState::Cancelled => Duration::ZERO,
        }
    }

    /// Feed one input event; `now` anchors the strictly-future check.
    pub fn on_input(&mut self, input: SessionInput, now: DateTime<Utc>) -> EditReply {
        if matches!(self.state, EditState::Saved | EditState::Cancelled) {
            return EditReply::Closed;
        }
        if matches!(input, SessionInput::Timeout) {
            self.state = EditState::Cancelled;
            return EditReply::Cancelled(EditCancel::TimedOut);
        }

        match self.state {
            EditState::AwaitingSelection => self.on_selection(input),
            EditState::AwaitingField => self.on_field_choice(input),
            EditState::AwaitingValue(field) => self.on_value(field, input, now),
            EditState::Saved | EditState::Cancelled => EditReply::Closed,
        }
    }

    fn on_selection(&mut self, input: SessionInput) -> EditReply {
        let text = match input {
            SessionInput::Text(t) => t,
            _ => return self.cancel(EditCancel::InvalidSelection),
        };
        match parse_selection(&text, self.listing.len()) {
            Selection::Exit => self.cancel(EditCancel::Exit),
            Selection::Invalid => self.cancel(EditCancel::InvalidSelection),
            Selection::Index(i) => {
                self.selected = Some(i);
                self.state = EditState::AwaitingField;
                EditReply::Menu
            }
        }
    }

    fn on_field_choice(&mut self, input: SessionInput) -> EditReply {
        let text = match input {
            SessionInput::Text(t) => t,
            _ => return EditReply::InvalidOption,
        };
        match text.trim().to_ascii_lowercase().as_str() {
            "save" => self.save(),
            "1" => self.ask(EditField::Time),
            "2" => self.ask(EditField::Content),
            "3" => self.ask(EditField::Attachment),
            _ => EditReply::InvalidOption,
        }
    }

    fn ask(&mut self, field: EditField) -> EditReply {
        self.state = EditState::AwaitingValue(field);
        EditReply::AskValue(field)
    }

    fn on_value(&mut self, field: EditField, input: SessionInput, now: DateTime<Utc>) -> EditReply {
        // Whatever happens, the next stop is the menu.
        self.state = EditState::AwaitingField;

        match field {
            EditField::Time => {
                let text = match input {
                    SessionInput::Text(t) => t,
                    _ => return EditReply::Rejected(ValueRejection::InvalidTime),
                };
                let send_at = match parse_send_at(&text, self.offset) {
                    Ok(at) => at,
                    Err(_) => return EditReply::Rejected(ValueRejection::InvalidTime),
                };
                if ensure_future(send_at, now).is_err() {
                    return EditReply::Rejected(ValueRejection::PastTime);
                }
                self.edits.send_at = Some(send_at);
                EditReply::Accepted(EditField::Time)
            }
            EditField::Content => match input {
                SessionInput::Text(t) if !t.trim().is_empty() => {
                    self.edits.content = Some(t);
                    EditReply::Accepted(EditField::Content)
                }
                _ => {
                    self.state = EditState::AwaitingValue(EditField::Content);
                    EditReply::AskValue(EditField::Content)
                }
            },
            EditField::Attachment => match input {
                SessionInput::File { name, bytes } => {
                    self.edits.attachment = AttachmentEdit::Replace { bytes, name };
                    EditReply::Accepted(EditField::Attachment)
                }
                // Any text reply clears the stored attachment.
                _ => {
                    self.edits.attachment = AttachmentEdit::Clear;
                    EditReply::Accepted(EditField::Attachment)
                }
            },
        }
    }

    fn save(&mut self) -> EditReply {
        self.state = EditState::Saved;
        let edits = std::mem::take(&mut self.edits);
        if edits.is_empty() {
            return EditReply::NoChanges;
        }
        let Some(record) = self.selected() else {
            // Unreachable: the menu cannot be reached without a selection.
            return EditReply::NoChanges;
        };
        EditReply::Save {
            id: record.id.clone(),
            user: self.user,
            edits,
        }
    }

    fn cancel(&mut self, reason: EditCancel) -> EditReply {
        self.state = EditState::Cancelled;
        EditReply::Cancelled(reason)
    }
}
