//! The three-step create flow: time, content, attachment.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};

use courier_core::time::{ensure_future, parse_send_at};
use courier_core::types::{ChannelId, GuildId, UserId};
use courier_scheduler::engine::CreateRequest;

use crate::types::SessionInput;

/// Where a create session currently waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateState {
    AwaitingTime,
    AwaitingContent,
    AwaitingAttachment,
    Completed,
    Cancelled,
}

/// Why a create session ended without yielding a request.
///
/// Time problems abort the whole flow — the requester starts over — unlike
/// the edit flow, which bounces back to its menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateCancel {
    TimedOut,
    InvalidTime,
    PastTime,
}

/// Result of feeding one input event into a create session.
#[derive(Debug)]
pub enum CreateReply {
    /// Prompt for (or re-prompt) the contained step.
    Prompt(CreateState),
    /// All steps collected — hand this to the engine.
    Done(Box<CreateRequest>),
    /// The session ended with nothing committed.
    Cancelled(CreateCancel),
    /// The session already reached a terminal state; nothing happens.
    Closed,
}

/// Collects the fields of one new schedule across three prompts.
pub struct CreateFlow {
    user: UserId,
    guild: GuildId,
    channel: ChannelId,
    offset: FixedOffset,
    state: CreateState,
    send_at: Option<DateTime<Utc>>,
    content: Option<String>,
}

impl CreateFlow {
    /// Start a session for a member in a guild channel. The first prompt is
    /// for the timestamp, interpreted in the configured source offset.
    pub fn new(user: UserId, guild: GuildId, channel: ChannelId, offset: FixedOffset) -> Self {
        Self {
            user,
            guild,
            channel,
            offset,
            state: CreateState::AwaitingTime,
            send_at: None,
            content: None,
        }
    }

    pub fn state(&self) -> CreateState {
        self.state
    }

    /// Reply window for the current step.
    pub fn timeout(&self) -> Duration {
        match self.state {
            CreateState::AwaitingTime | CreateState::AwaitingAttachment => {
                Duration::from_secs(300)
            }
            CreateState::AwaitingContent => Duration::from_secs(600),
            CreateState::Completed | CreateState::Cancelled => Duration::ZERO,
        }
    }

    /// Feed one input event; `now` anchors the strictly-future check.
    pub fn on_input(&mut self, input: SessionInput, now: DateTime<Utc>) -> CreateReply {
        if matches!(
            self.state,
            CreateState::Completed | CreateState::Cancelled
        ) {
            return CreateReply::Closed;
        }
        if matches!(input, SessionInput::Timeout) {
            return self.cancel(CreateCancel::TimedOut);
        }

        match self.state {
            CreateState::AwaitingTime => self.on_time(input, now),
            CreateState::AwaitingContent => self.on_content(input),
            CreateState::AwaitingAttachment => self.on_attachment(input),
            CreateState::Completed | CreateState::Cancelled => CreateReply::Closed,
        }
    }

    fn on_time(&mut self, input: SessionInput, now: DateTime<Utc>) -> CreateReply {
        let text = match input {
            SessionInput::Text(t) => t,
            _ => return self.cancel(CreateCancel::InvalidTime),
        };
        let send_at = match parse_send_at(&text, self.offset) {
            Ok(at) => at,
            Err(_) => return self.cancel(CreateCancel::InvalidTime),
        };
        if ensure_future(send_at, now).is_err() {
            return self.cancel(CreateCancel::PastTime);
        }

        self.send_at = Some(send_at);
        self.state = CreateState::AwaitingContent;
        CreateReply::Prompt(CreateState::AwaitingContent)
    }

    fn on_content(&mut self, input: SessionInput) -> CreateReply {
        match input {
            SessionInput::Text(t) if !t.trim().is_empty() => {
                self.content = Some(t);
                self.state = CreateState::AwaitingAttachment;
                CreateReply::Prompt(CreateState::AwaitingAttachment)
            }
            // Empty or non-text input: the body is mandatory, ask again.
            _ => CreateReply::Prompt(CreateState::AwaitingContent),
        }
    }

    fn on_attachment(&mut self, input: SessionInput) -> CreateReply {
        match input {
            SessionInput::File { name, bytes } => self.finish(Some((bytes, name))),
            // Any text reply means "no attachment".
            SessionInput::Text(_) => self.finish(None),
            SessionInput::Timeout => self.cancel(CreateCancel::TimedOut),
        }
    }

    fn finish(&mut self, attachment: Option<(Vec<u8>, String)>) -> CreateReply {
        let (Some(send_at), Some(content)) = (self.send_at, self.content.take()) else {
            // Unreachable through the state transitions above.
            return self.cancel(CreateCancel::TimedOut);
        };
        self.state = CreateState::Completed;
        CreateReply::Done(Box::new(CreateRequest {
            user_id: self.user,
            guild_id: self.guild,
            channel_id: self.channel,
            send_at,
            content,
            attachment,
        }))
    }

    fn cancel(&mut self, reason: CreateCancel) -> CreateReply {
        self.state = CreateState::Cancelled;
        CreateReply::Cancelled(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cet() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn flow() -> CreateFlow {
        CreateFlow::new(UserId(1), GuildId(2), ChannelId(3), cet())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn text(s: &str) -> SessionInput {
        SessionInput::Text(s.to_string())
    }

    #[test]
    fn full_walkthrough_with_file() {
        let mut flow = flow();

        assert!(matches!(
            flow.on_input(text("01.06.2030 12:00"), now()),
            CreateReply::Prompt(CreateState::AwaitingContent)
        ));
        assert!(matches!(
            flow.on_input(text("party time"), now()),
            CreateReply::Prompt(CreateState::AwaitingAttachment)
        ));

        let reply = flow.on_input(
            SessionInput::File {
                name: "pic.png".to_string(),
                bytes: b"data".to_vec(),
            },
            now(),
        );
        let CreateReply::Done(req) = reply else {
            panic!("expected Done");
        };
        assert_eq!(req.user_id, UserId(1));
        assert_eq!(req.guild_id, GuildId(2));
        assert_eq!(req.channel_id, ChannelId(3));
        assert_eq!(
            req.send_at,
            Utc.with_ymd_and_hms(2030, 6, 1, 11, 0, 0).unwrap()
        );
        assert_eq!(req.content, "party time");
        let (bytes, name) = req.attachment.clone().expect("attachment");
        assert_eq!(bytes, b"data");
        assert_eq!(name, "pic.png");
        assert_eq!(flow.state(), CreateState::Completed);
    }

    #[test]
    fn any_text_at_the_attachment_step_means_none() {
        let mut flow = flow();
        flow.on_input(text("01.06.2030 12:00"), now());
        flow.on_input(text("hi"), now());

        let CreateReply::Done(req) = flow.on_input(text("none"), now()) else {
            panic!("expected Done");
        };
        assert!(req.attachment.is_none());
    }

    #[test]
    fn invalid_time_aborts_the_flow() {
        let mut flow = flow();
        assert!(matches!(
            flow.on_input(text("soonish"), now()),
            CreateReply::Cancelled(CreateCancel::InvalidTime)
        ));
        assert_eq!(flow.state(), CreateState::Cancelled);
    }

    #[test]
    fn past_time_aborts_the_flow() {
        let mut flow = flow();
        assert!(matches!(
            flow.on_input(text("01.01.2020 12:00"), now()),
            CreateReply::Cancelled(CreateCancel::PastTime)
        ));
    }

    #[test]
    fn empty_content_is_reprompted() {
        let mut flow = flow();
        flow.on_input(text("01.06.2030 12:00"), now());

        assert!(matches!(
            flow.on_input(text("   "), now()),
            CreateReply::Prompt(CreateState::AwaitingContent)
        ));
        assert_eq!(flow.state(), CreateState::AwaitingContent);
    }

    #[test]
    fn timeout_cancels_at_every_step() {
        for step in 0..3 {
            let mut flow = flow();
            if step >= 1 {
                flow.on_input(text("01.06.2030 12:00"), now());
            }
            if step >= 2 {
                flow.on_input(text("hi"), now());
            }
            assert!(matches!(
                flow.on_input(SessionInput::Timeout, now()),
                CreateReply::Cancelled(CreateCancel::TimedOut)
            ));
        }
    }

    #[test]
    fn content_window_is_the_long_one() {
        let mut flow = flow();
        assert_eq!(flow.timeout(), Duration::from_secs(300));
        flow.on_input(text("01.06.2030 12:00"), now());
        assert_eq!(flow.timeout(), Duration::from_secs(600));
    }

    #[test]
    fn finished_flow_ignores_further_input() {
        let mut flow = flow();
        flow.on_input(text("01.06.2030 12:00"), now());
        flow.on_input(text("hi"), now());
        flow.on_input(text("none"), now());

        assert!(matches!(
            flow.on_input(text("more"), now()),
            CreateReply::Closed
        ));
    }
}
