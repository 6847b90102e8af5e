//! Conversation synchronization and messaging
//!
//! The components here coordinate asynchronous reads, a live insert
//! subscription, and local state reconciliation for a single open
//! conversation view:
//!
//! - `participants`: keeps the (conversation, identity) join records
//!   honest and resolves the "other party" of a conversation
//! - `directory`: lists the conversations an identity takes part in,
//!   newest activity first
//! - `starter`: finds or creates the shared conversation for a pair of
//!   identities
//! - `feed`: ordered message history plus a live subscription, merged
//!   with at-most-once rendering per message id
//! - `composer`: drafts and sends messages

pub mod composer;
pub mod directory;
pub mod feed;
pub mod participants;
pub mod starter;

pub use composer::{MessageComposer, SendOutcome, send_message};
pub use directory::{ConversationSummary, list_conversations};
pub use feed::{
    ChatMessage, ChatView, FeedState, LiveMessages, MessageFeed, load_history, sort_history,
    subscribe,
};
pub use participants::{ensure_participant, resolve_other_party};
pub use starter::start_or_find_conversation;
