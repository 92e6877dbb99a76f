//! The remove flow: pick a record, confirm, done.

use std::time::Duration;

use courier_core::types::{ScheduleId, UserId};
use courier_store::ScheduledMessage;

use crate::select::{parse_selection, Selection};
use crate::types::SessionInput;

/// Where a remove session currently waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveState {
    AwaitingSelection,
    AwaitingConfirm,
    Confirmed,
    Cancelled,
}

/// Why a remove session ended without removing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveCancel {
    Exit,
    InvalidSelection,
    /// The member answered the confirmation with anything but `yes`.
    Declined,
    TimedOut,
}

/// Result of feeding one input event into a remove session.
#[derive(Debug)]
pub enum RemoveReply {
    /// Ask "really delete this one?" for the 1-based listing position.
    Confirm(usize),
    /// Confirmed — the driver calls the engine's remove.
    Confirmed { id: ScheduleId, user: UserId },
    /// Session over with nothing removed.
    Cancelled(RemoveCancel),
    /// The session already reached a terminal state; nothing happens.
    Closed,
}

/// Two-step removal with an explicit confirmation gate.
pub struct RemoveFlow {
    user: UserId,
    /// Snapshot taken at session start; indexes stay stable.
    listing: Vec<ScheduledMessage>,
    state: RemoveState,
    selected: Option<usize>,
}

impl RemoveFlow {
    pub fn new(user: UserId, listing: Vec<ScheduledMessage>) -> Self {
        Self {
            user,
            listing,
            state: RemoveState::AwaitingSelection,
            selected: None,
        }
    }

    pub fn state(&self) -> RemoveState {
        self.state
    }

    /// The snapshotted listing, for rendering the selection prompt.
    pub fn listing(&self) -> &[ScheduledMessage] {
        &self.listing
    }

    /// Reply window for the current step.
    pub fn timeout(&self) -> Duration {
        match self.state {
            RemoveState::AwaitingSelection => Duration::from_secs(120),
            RemoveState::AwaitingConfirm => Duration::from_secs(60),
            RemoveState::Confirmed | RemoveState::Cancelled => Duration::ZERO,
        }
    }

    /// Feed one input event.
    pub fn on_input(&mut self, input: SessionInput) -> RemoveReply {
        if matches!(self.state, RemoveState::Confirmed | RemoveState::Cancelled) {
            return RemoveReply::Closed;
        }
        if matches!(input, SessionInput::Timeout) {
            return self.cancel(RemoveCancel::TimedOut);
        }

        match self.state {
            RemoveState::AwaitingSelection => self.on_selection(input),
            RemoveState::AwaitingConfirm => self.on_confirm(input),
            RemoveState::Confirmed | RemoveState::Cancelled => RemoveReply::Closed,
        }
    }

    fn on_selection(&mut self, input: SessionInput) -> RemoveReply {
        let text = match input {
            SessionInput::Text(t) => t,
            _ => return self.cancel(RemoveCancel::InvalidSelection),
        };
        match parse_selection(&text, self.listing.len()) {
            Selection::Exit => self.cancel(RemoveCancel::Exit),
            Selection::Invalid => self.cancel(RemoveCancel::InvalidSelection),
            Selection::Index(i) => {
                self.selected = Some(i);
                self.state = RemoveState::AwaitingConfirm;
                RemoveReply::Confirm(i + 1)
            }
        }
    }

    fn on_confirm(&mut self, input: SessionInput) -> RemoveReply {
        let confirmed = matches!(
            input,
            SessionInput::Text(ref t) if t.trim().eq_ignore_ascii_case("yes")
        );
        if !confirmed {
            return self.cancel(RemoveCancel::Declined);
        }
        let Some(record) = self.selected.and_then(|i| self.listing.get(i)) else {
            // Unreachable: confirmation cannot be reached without a selection.
            return self.cancel(RemoveCancel::InvalidSelection);
        };
        let reply = RemoveReply::Confirmed {
            id: record.id.clone(),
            user: self.user,
        };
        self.state = RemoveState::Confirmed;
        reply
    }

    fn cancel(&mut self, reason: RemoveCancel) -> RemoveReply {
        self.state = RemoveState::Cancelled;
        RemoveReply::Cancelled(reason)
    }
}
