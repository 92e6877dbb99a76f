//! The chat-platform boundary consumed by the dispatch loop.

use async_trait::async_trait;
use thiserror::Error;

use courier_core::types::ChannelId;

/// A file handed to the platform for delivery alongside the text.
#[derive(Debug, Clone)]
pub struct OutgoingFile {
    /// Filename presented to recipients.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The platform failed to deliver a message.
#[derive(Debug, Error)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Chat-platform send primitive.
///
/// Implemented by the platform shim; the dispatch loop never sees transport
/// types. Implementations must be `Send + Sync` so the loop can hold them
/// across ticks.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Resolve a channel id to its display name.
    ///
    /// `None` means the channel no longer exists — terminal for the record,
    /// not a transient failure.
    async fn resolve_channel(&self, channel: ChannelId) -> Option<String>;

    /// Deliver `text` (and an optional file) to `channel`.
    async fn send(
        &self,
        channel: ChannelId,
        text: &str,
        file: Option<OutgoingFile>,
    ) -> std::result::Result<(), DeliveryError>;
}
