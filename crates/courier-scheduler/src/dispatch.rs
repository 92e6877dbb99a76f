use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use courier_store::{AttachmentStore, MessageStore, ScheduledMessage};

use crate::sink::{DeliverySink, OutgoingFile};

/// Periodic poll that delivers due messages.
///
/// Owned by the host process: started on readiness, stopped via the shared
/// shutdown watch channel. See the crate docs for the discard policy.
pub struct DispatchLoop {
    store: Arc<MessageStore>,
    attachments: Arc<AttachmentStore>,
    sink: Arc<dyn DeliverySink>,
    interval: Duration,
}

impl DispatchLoop {
    pub fn new(
        store: Arc<MessageStore>,
        attachments: Arc<AttachmentStore>,
        sink: Arc<dyn DeliverySink>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            attachments,
            sink,
            interval,
        }
    }

    /// Poll until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "dispatch loop started");

        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("dispatch loop shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Run a single dispatch pass over everything currently due.
    ///
    /// Each due record gets one delivery attempt and is then discarded,
    /// whatever the outcome. A failure on one record never blocks the rest
    /// of the pass.
    pub async fn tick(&self) {
        let due = match self.store.fetch_due(Utc::now()) {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "due-message query failed, skipping tick");
                return;
            }
        };

        for msg in due {
            self.deliver(&msg).await;
            self.discard(&msg);
        }
    }

    /// One delivery attempt for one record.
    async fn deliver(&self, msg: &ScheduledMessage) {
        let channel_name = match self.sink.resolve_channel(msg.channel_id).await {
            Some(name) => name,
            None => {
                warn!(
                    schedule_id = %msg.id,
                    channel = %msg.channel_id,
                    "channel no longer resolvable, dropping schedule"
                );
                return;
            }
        };

        let text = format!(
            "This message was scheduled by {}.\n\n{}",
            msg.user_id.mention(),
            msg.content
        );
        let file = msg.attachment.as_deref().and_then(|p| self.load_file(msg, p));

        match self.sink.send(msg.channel_id, &text, file).await {
            Ok(()) => {
                info!(schedule_id = %msg.id, channel = %channel_name, "scheduled message delivered");
            }
            Err(e) => {
                error!(
                    schedule_id = %msg.id,
                    channel = %channel_name,
                    error = %e,
                    "delivery failed, message dropped"
                );
            }
        }
    }

    /// Read the stored attachment. A vanished or unreadable file downgrades
    /// the delivery to text-only.
    fn load_file(&self, msg: &ScheduledMessage, path: &Path) -> Option<OutgoingFile> {
        match std::fs::read(path) {
            Ok(bytes) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "attachment".to_string());
                Some(OutgoingFile { name, bytes })
            }
            Err(e) => {
                warn!(
                    schedule_id = %msg.id,
                    path = %path.display(),
                    error = %e,
                    "attachment unreadable, sending text only"
                );
                None
            }
        }
    }

    /// Drop a record and its attachment once its single attempt has happened.
    fn discard(&self, msg: &ScheduledMessage) {
        if let Err(e) = self.store.delete_by_id(&msg.id) {
            error!(schedule_id = %msg.id, error = %e, "failed to delete dispatched schedule");
        }
        if let Some(ref path) = msg.attachment {
            if let Err(e) = self.attachments.delete(path) {
                warn!(
                    schedule_id = %msg.id,
                    path = %path.display(),
                    error = %e,
                    "attachment cleanup failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::DeliveryError;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use courier_core::types::{ChannelId, GuildId, UserId};
    use courier_store::NewMessage;
    use rusqlite::Connection;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Debug, Clone)]
    struct SentMessage {
        channel: u64,
        text: String,
        file_name: Option<String>,
    }

    struct RecordingSink {
        known_channels: Vec<u64>,
        fail_sends: bool,
        sent: Mutex<Vec<SentMessage>>,
    }

    impl RecordingSink {
        fn new(known_channels: Vec<u64>) -> Self {
            Self {
                known_channels,
                fail_sends: false,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing(known_channels: Vec<u64>) -> Self {
            Self {
                fail_sends: true,
                ..Self::new(known_channels)
            }
        }

        fn sent(&self) -> Vec<SentMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn resolve_channel(&self, channel: ChannelId) -> Option<String> {
            self.known_channels
                .contains(&channel.0)
                .then(|| format!("chan-{}", channel.0))
        }

        async fn send(
            &self,
            channel: ChannelId,
            text: &str,
            file: Option<OutgoingFile>,
        ) -> std::result::Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(SentMessage {
                channel: channel.0,
                text: text.to_string(),
                file_name: file.map(|f| f.name),
            });
            if self.fail_sends {
                Err(DeliveryError("transport down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        store: Arc<MessageStore>,
        attachments: Arc<AttachmentStore>,
        _tmp: TempDir,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        Fixture {
            store: Arc::new(MessageStore::new(Connection::open_in_memory().unwrap()).unwrap()),
            attachments: Arc::new(AttachmentStore::new(tmp.path().join("attachments"))),
            _tmp: tmp,
        }
    }

    fn loop_with(fx: &Fixture, sink: Arc<dyn DeliverySink>) -> DispatchLoop {
        DispatchLoop::new(
            Arc::clone(&fx.store),
            Arc::clone(&fx.attachments),
            sink,
            Duration::from_secs(30),
        )
    }

    fn due_message(channel: u64, minutes_ago: i64) -> NewMessage {
        NewMessage {
            user_id: UserId(1),
            guild_id: GuildId(1),
            channel_id: ChannelId(channel),
            send_at: Utc::now() - ChronoDuration::minutes(minutes_ago),
            content: "hi".to_string(),
            attachment: None,
        }
    }

    #[tokio::test]
    async fn tick_delivers_due_and_discards() {
        let fx = fixture();
        let created = fx.store.create(due_message(10, 5)).unwrap();
        let sink = Arc::new(RecordingSink::new(vec![10]));

        loop_with(&fx, Arc::clone(&sink) as Arc<dyn DeliverySink>)
            .tick()
            .await;

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, 10);
        assert!(sent[0]
            .text
            .starts_with("This message was scheduled by <@1>.\n\n"));
        assert!(sent[0].text.ends_with("hi"));
        assert!(fx.store.get(&created.id).unwrap().is_none());
        assert!(fx.store.fetch_due(Utc::now()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn tick_leaves_future_records_alone() {
        let fx = fixture();
        let mut new = due_message(10, 0);
        new.send_at = Utc::now() + ChronoDuration::hours(1);
        let created = fx.store.create(new).unwrap();
        let sink = Arc::new(RecordingSink::new(vec![10]));

        loop_with(&fx, Arc::clone(&sink) as Arc<dyn DeliverySink>)
            .tick()
            .await;

        assert!(sink.sent().is_empty());
        assert!(fx.store.get(&created.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn unresolvable_channel_discards_without_sending() {
        let fx = fixture();
        let path = fx.attachments.save(b"data", "pic.png").unwrap();
        let mut new = due_message(10, 5);
        new.attachment = Some(path.clone());
        let created = fx.store.create(new).unwrap();
        let sink = Arc::new(RecordingSink::new(vec![]));

        loop_with(&fx, Arc::clone(&sink) as Arc<dyn DeliverySink>)
            .tick()
            .await;

        assert!(sink.sent().is_empty());
        assert!(fx.store.get(&created.id).unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_send_still_discards() {
        let fx = fixture();
        let created = fx.store.create(due_message(10, 5)).unwrap();
        let sink = Arc::new(RecordingSink::failing(vec![10]));

        loop_with(&fx, Arc::clone(&sink) as Arc<dyn DeliverySink>)
            .tick()
            .await;

        assert_eq!(sink.sent().len(), 1);
        assert!(fx.store.get(&created.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn attachment_bytes_ride_along_and_file_is_cleaned_up() {
        let fx = fixture();
        let path = fx.attachments.save(b"payload", "pic.png").unwrap();
        let mut new = due_message(10, 5);
        new.attachment = Some(path.clone());
        fx.store.create(new).unwrap();
        let sink = Arc::new(RecordingSink::new(vec![10]));

        loop_with(&fx, Arc::clone(&sink) as Arc<dyn DeliverySink>)
            .tick()
            .await;

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        let file_name = sent[0].file_name.clone().expect("file delivered");
        assert!(file_name.ends_with("_pic.png"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn one_bad_record_does_not_block_the_rest() {
        let fx = fixture();
        fx.store.create(due_message(99, 10)).unwrap();
        let ok = fx.store.create(due_message(10, 5)).unwrap();
        let sink = Arc::new(RecordingSink::new(vec![10]));

        loop_with(&fx, Arc::clone(&sink) as Arc<dyn DeliverySink>)
            .tick()
            .await;

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, 10);
        assert!(fx.store.get(&ok.id).unwrap().is_none());
        assert!(fx.store.fetch_due(Utc::now()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let fx = fixture();
        let sink = Arc::new(RecordingSink::new(vec![]));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(
            DispatchLoop::new(
                Arc::clone(&fx.store),
                Arc::clone(&fx.attachments),
                sink as Arc<dyn DeliverySink>,
                Duration::from_millis(10),
            )
            .run(shutdown_rx),
        );

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop exits on shutdown")
            .unwrap();
    }
}
