//! Message feed: ordered history plus a live insert subscription
//!
//! A feed moves `Unloaded -> Loading -> Loaded` per open view, with a
//! live subscription alongside once loaded. History is fetched and
//! sorted ascending exactly once; afterwards the local list is
//! append-only. Live inserts are merged by message id, so a message is
//! rendered at most once no matter how the history response and the
//! live channel race.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Action, Connection, Notification, RecordId, Surreal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

use super::participants::ensure_participant;
use crate::db::DbMessage;
use crate::db::models::from_surreal_datetime;
use crate::error::{CoreError, Result};
use crate::id::{ConversationId, MessageId, UserId};

/// Author shown when a message's sender profile is not available, e.g.
/// for rows arriving over the live channel
pub const FALLBACK_AUTHOR: &str = "Commons member";

/// A rendered message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Sender display identity as resolved at fetch time; absent on
    /// live-delivered rows
    pub author: Option<String>,
}

impl ChatMessage {
    /// Name to render next to the message for the given viewer
    pub fn author_label(&self, viewer: UserId) -> String {
        if self.sender_id == viewer {
            "You".to_string()
        } else {
            self.author
                .clone()
                .unwrap_or_else(|| FALLBACK_AUTHOR.to_string())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MessageRow {
    id: RecordId,
    conversation_id: RecordId,
    sender_id: RecordId,
    body: String,
    created_at: surrealdb::Datetime,
    author_name: Option<String>,
    author_email: Option<String>,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage {
            id: MessageId::from_record(row.id),
            conversation_id: ConversationId::from_record(row.conversation_id),
            sender_id: UserId::from_record(row.sender_id),
            body: row.body,
            created_at: from_surreal_datetime(&row.created_at),
            author: row
                .author_name
                .filter(|name| !name.is_empty())
                .or(row.author_email),
        }
    }
}

/// Load the full message history of a conversation, ascending by
/// creation time.
///
/// Runs the participation self-heal first, so a viewer whose join row
/// was created out-of-band (or dropped) still sees history immediately.
pub async fn load_history<C: Connection>(
    db: &Surreal<C>,
    conversation_id: ConversationId,
    viewer: UserId,
) -> Result<Vec<ChatMessage>> {
    ensure_participant(db, conversation_id, viewer).await?;

    let mut response = db
        .query(
            "SELECT *, sender_id.display_name AS author_name, sender_id.email AS author_email \
             FROM messages WHERE conversation_id = $conversation",
        )
        .bind(("conversation", RecordId::from(conversation_id)))
        .await
        .map_err(|e| CoreError::query_failed("messages", e))?;

    let rows: Vec<MessageRow> = response
        .take(0)
        .map_err(|e| CoreError::query_failed("messages", e))?;

    let mut history: Vec<ChatMessage> = rows.into_iter().map(ChatMessage::from).collect();
    sort_history(&mut history);
    tracing::debug!(%conversation_id, count = history.len(), "loaded history");
    Ok(history)
}

/// Sort messages ascending by creation time, ties broken by id, without
/// assuming anything about the store's physical return order.
pub fn sort_history(messages: &mut [ChatMessage]) {
    messages.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.uuid().cmp(&b.id.uuid()))
    });
}

/// Handle for one live insert subscription.
///
/// Holds the pump task that drives the underlying live query; releasing
/// the handle (explicitly or by drop) aborts the pump, which drops the
/// stream and kills the query. No message is delivered after release.
pub struct LiveMessages {
    conversation_id: ConversationId,
    rx: mpsc::UnboundedReceiver<ChatMessage>,
    pump: JoinHandle<()>,
}

impl LiveMessages {
    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Next live-delivered message; None once the channel closes
    pub async fn recv(&mut self) -> Option<ChatMessage> {
        self.rx.recv().await
    }

    /// Drain without waiting
    pub fn try_recv(&mut self) -> Option<ChatMessage> {
        self.rx.try_recv().ok()
    }

    /// Stop the live feed explicitly at view teardown
    pub fn release(self) {}
}

impl Drop for LiveMessages {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Open a live subscription for newly inserted messages in one
/// conversation, scoped server-side to that conversation id.
pub async fn subscribe<C: Connection>(
    db: &Surreal<C>,
    conversation_id: ConversationId,
) -> Result<LiveMessages> {
    let live_failed = |cause: surrealdb::Error| CoreError::LiveQueryFailed {
        conversation: conversation_id.to_string(),
        cause,
    };

    let mut response = db
        .query("LIVE SELECT * FROM messages WHERE conversation_id = $conversation")
        .bind(("conversation", RecordId::from(conversation_id)))
        .await
        .map_err(live_failed)?;

    let mut stream = response
        .stream::<Notification<DbMessage>>(0)
        .map_err(live_failed)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let pump = tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(notification) => {
                    // Messages are append-only; anything but an insert is noise
                    if !matches!(notification.action, Action::Create) {
                        continue;
                    }
                    let row = notification.data;
                    let message = ChatMessage {
                        id: row.message_id(),
                        conversation_id: row.conversation(),
                        sender_id: row.sender(),
                        created_at: from_surreal_datetime(&row.created_at),
                        body: row.body,
                        author: None,
                    };
                    if tx.send(message).is_err() {
                        // Receiver released
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "live message stream error");
                }
            }
        }
        tracing::debug!("live message stream closed");
    });

    tracing::debug!(%conversation_id, "subscribed to live inserts");
    Ok(LiveMessages {
        conversation_id,
        rx,
        pump,
    })
}

/// Loading state of one conversation view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Unloaded,
    Loading,
    Loaded,
}

/// In-memory ordered message list for one open conversation
#[derive(Debug)]
pub struct MessageFeed {
    conversation_id: ConversationId,
    state: FeedState,
    messages: Vec<ChatMessage>,
    scroll_pending: bool,
}

impl MessageFeed {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            state: FeedState::Unloaded,
            messages: Vec::new(),
            scroll_pending: false,
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn begin_loading(&mut self) {
        self.state = FeedState::Loading;
    }

    /// Install the loaded history, keeping any live inserts that raced
    /// ahead of the history response (deduplicated by id).
    pub fn apply_history(&mut self, history: Vec<ChatMessage>) {
        let history_ids: HashSet<MessageId> = history.iter().map(|m| m.id).collect();
        let live_tail: Vec<ChatMessage> = self
            .messages
            .drain(..)
            .filter(|m| !history_ids.contains(&m.id))
            .collect();

        self.messages = history;
        self.messages.extend(live_tail);
        self.state = FeedState::Loaded;
        if !self.messages.is_empty() {
            self.scroll_pending = true;
        }
    }

    /// Merge one live insert. Returns false (and changes nothing) when a
    /// message with this id is already rendered.
    pub fn apply_insert(&mut self, message: ChatMessage) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.messages.push(message);
        self.scroll_pending = true;
        true
    }

    /// Whether the view should scroll to the newest message; reading
    /// clears the request.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }
}

/// One open conversation view: a feed plus its live subscription.
///
/// Opening a different conversation releases the previous subscription
/// before anything else happens, and a stale-response guard discards a
/// history load that finishes after the view has moved on.
pub struct ChatView {
    viewer: UserId,
    feed: Option<MessageFeed>,
    live: Option<LiveMessages>,
}

impl ChatView {
    pub fn new(viewer: UserId) -> Self {
        Self {
            viewer,
            feed: None,
            live: None,
        }
    }

    pub fn viewer(&self) -> UserId {
        self.viewer
    }

    pub fn feed(&self) -> Option<&MessageFeed> {
        self.feed.as_ref()
    }

    pub fn current(&self) -> Option<ConversationId> {
        self.feed.as_ref().map(|feed| feed.conversation_id())
    }

    pub fn has_live(&self) -> bool {
        self.live.is_some()
    }

    /// Open a conversation: release any previous subscription, load
    /// history, then subscribe to live inserts.
    ///
    /// A subscription failure degrades the view to history-only instead
    /// of failing the open.
    pub async fn open<C: Connection>(
        &mut self,
        db: &Surreal<C>,
        conversation_id: ConversationId,
    ) -> Result<()> {
        self.close();

        let mut feed = MessageFeed::new(conversation_id);
        feed.begin_loading();
        self.feed = Some(feed);

        let history = load_history(db, conversation_id, self.viewer).await?;

        // Stale-response guard: navigation may have moved on while the
        // history request was in flight.
        if self.current() != Some(conversation_id) {
            tracing::debug!(%conversation_id, "discarding stale history response");
            return Ok(());
        }

        if let Some(feed) = self.feed.as_mut() {
            feed.apply_history(history);
        }

        match subscribe(db, conversation_id).await {
            Ok(live) => self.live = Some(live),
            Err(e) => {
                tracing::warn!(error = %e, %conversation_id, "live subscription failed, staying on history only");
            }
        }

        Ok(())
    }

    /// Tear the view down, releasing the live subscription
    pub fn close(&mut self) {
        if let Some(live) = self.live.take() {
            live.release();
        }
        self.feed = None;
    }

    /// Await the next live insert. Pends forever when the view has no
    /// live subscription, which makes this safe to use in a select loop.
    pub async fn recv_live(&mut self) -> Option<ChatMessage> {
        let Some(live) = self.live.as_mut() else {
            return std::future::pending().await;
        };
        match live.recv().await {
            Some(message) => Some(message),
            None => {
                self.live = None;
                None
            }
        }
    }

    /// Merge one live (or locally echoed) message into the feed
    pub fn apply_live(&mut self, message: ChatMessage) -> bool {
        match self.feed.as_mut() {
            Some(feed) => feed.apply_insert(message),
            None => false,
        }
    }

    /// Merge everything already sitting in the live channel
    pub fn drain_live(&mut self) -> usize {
        let mut appended = 0;
        while let Some(message) = self.live.as_mut().and_then(LiveMessages::try_recv) {
            if self.apply_live(message) {
                appended += 1;
            }
        }
        appended
    }

    pub fn take_scroll_request(&mut self) -> bool {
        self.feed
            .as_mut()
            .map(MessageFeed::take_scroll_request)
            .unwrap_or(false)
    }
}
